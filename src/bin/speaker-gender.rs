use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use speaker_gender::{
    AnalysisOptions, AnalysisReport, ChannelOrder, ClassifierOptions, DEFAULT_VIDEO_DIRECTORY,
    DEFAULT_VIDEOS, DetectorBackend, FfmpegLogLevel, GenderAnalyzer, GenderVerdict, LayoutEvent,
    OnnxGenderClassifier, ProgressCallback, ProgressInfo, TensorLayout, VideoFile,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_MODEL: &str = "models/gender.onnx";
const DEFAULT_DETECTOR_MODEL: &str = "models/version-RFB-320.onnx";
const DEFAULT_SECONDS: &str = "10";

const CLI_AFTER_HELP: &str = "Examples:\n  speaker-gender\n  speaker-gender analyze left.avi right.avi --dir clips --seconds 5 --json\n  speaker-gender analyze --detector skip --model models/gender.onnx --progress\n  speaker-gender probe split_videos/left_speaker.avi\n  speaker-gender completions zsh > _speaker-gender";

#[derive(Debug, Parser)]
#[command(
    name = "speaker-gender",
    version,
    about = "Classify the apparent gender of the speaker in each video clip",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    /// Defaults to `analyze` with default arguments.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging (overridden by RUST_LOG).
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar while sampling.
    #[arg(long)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, default_value = "error")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyse speaker clips and print the gender of each.
    #[command(
        about = "Analyse speaker clips",
        after_help = "Examples:\n  speaker-gender analyze\n  speaker-gender analyze a.avi b.avi --dir clips --seconds 00:00:05"
    )]
    Analyze(AnalyzeArgs),

    /// Print stream metadata and a validation report.
    #[command(about = "Inspect a video file", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args, Clone)]
struct AnalyzeArgs {
    /// Video file names, relative to --dir.
    videos: Vec<String>,

    /// Directory holding the clips.
    #[arg(long, default_value = DEFAULT_VIDEO_DIRECTORY)]
    dir: PathBuf,

    /// Seconds to sample from the start of each clip (seconds or [hh:]mm:ss).
    #[arg(long, default_value = DEFAULT_SECONDS)]
    seconds: String,

    /// Gender attribute model (ONNX).
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: PathBuf,

    /// Face detector backend (ultraface, skip).
    #[arg(long, default_value = "ultraface")]
    detector: String,

    /// Face detector model (ONNX).
    #[arg(long, default_value = DEFAULT_DETECTOR_MODEL)]
    detector_model: PathBuf,

    /// Treat frames without a detected face as failed samples.
    #[arg(long)]
    enforce_detection: bool,

    /// Minimum detector confidence.
    #[arg(long, default_value_t = 0.7)]
    threshold: f32,

    /// Classifier input tensor layout (nhwc, nchw).
    #[arg(long, default_value = "nhwc")]
    layout: String,

    /// Feed RGB instead of BGR to the classifier.
    #[arg(long)]
    rgb: bool,

    /// Classifier input edge length in pixels.
    #[arg(long, default_value_t = 224)]
    input_size: u32,

    /// Name of the classifier output tensor (defaults to the first output).
    #[arg(long)]
    output_name: Option<String>,

    /// Downscale decoded frames to at most this width.
    #[arg(long)]
    max_width: Option<u32>,

    /// Print the results as JSON.
    #[arg(long)]
    json: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            videos: Vec::new(),
            dir: PathBuf::from(DEFAULT_VIDEO_DIRECTORY),
            seconds: DEFAULT_SECONDS.to_string(),
            model: PathBuf::from(DEFAULT_MODEL),
            detector: "ultraface".to_string(),
            detector_model: PathBuf::from(DEFAULT_DETECTOR_MODEL),
            enforce_detection: false,
            threshold: 0.7,
            layout: "nhwc".to_string(),
            rgb: false,
            input_size: 224,
            output_name: None,
            max_width: None,
            json: false,
        }
    }
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds_to_duration(seconds, trimmed);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0_u64, minutes.parse::<u64>()?, seconds.parse::<f64>()?),
        [hours, minutes, seconds] => (
            hours.parse::<u64>()?,
            minutes.parse::<u64>()?,
            seconds.parse::<f64>()?,
        ),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    let total = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    seconds_to_duration(total, trimmed)
}

fn seconds_to_duration(seconds: f64, original: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("invalid time value: {original}").into());
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|error| format!("time value out of range: {original} ({error})").into())
}

fn parse_tensor_layout(value: &str) -> Option<TensorLayout> {
    match value.to_ascii_lowercase().as_str() {
        "nhwc" | "keras" | "tf" => Some(TensorLayout::Nhwc),
        "nchw" | "torch" => Some(TensorLayout::Nchw),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    // `try_init` also installs the `log` bridge so library records show up.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn classifier_options(args: &AnalyzeArgs) -> Result<ClassifierOptions, Box<dyn std::error::Error>> {
    let backend: DetectorBackend = args.detector.parse()?;
    let layout = parse_tensor_layout(&args.layout)
        .ok_or(format!("unsupported --layout: {}", args.layout))?;

    let mut options = ClassifierOptions::new(&args.model)
        .with_input_size(args.input_size)
        .with_layout(layout)
        .with_channel_order(if args.rgb { ChannelOrder::Rgb } else { ChannelOrder::Bgr })
        .with_enforce_detection(args.enforce_detection)
        .with_detection_threshold(args.threshold);

    options = match backend {
        DetectorBackend::Skip => options.without_detector(),
        backend => options.with_detector(backend, &args.detector_model),
    };

    if let Some(name) = &args.output_name {
        options = options.with_output_name(name.clone());
    }

    Ok(options)
}

/// Prints each vote and drives the optional progress bar.
struct TerminalProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(bar) = &self.bar {
            if let Some(total) = info.total {
                bar.set_length(total);
            }
            bar.set_position(info.current);
        }

        if self.quiet {
            return;
        }

        let line = match (info.current_frame, info.gender) {
            (Some(frame), Some(gender)) => format!("Frame {frame}: {gender}"),
            (Some(frame), None) => format!("Frame {frame}: {}", "no vote".dimmed()),
            _ => return,
        };
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }
}

fn colored_verdict(verdict: GenderVerdict) -> colored::ColoredString {
    match verdict {
        GenderVerdict::Known(gender) => gender.label().green().bold(),
        GenderVerdict::Unknown => verdict.label().yellow().bold(),
    }
}

fn result_line(name: &str, report: &AnalysisReport) -> String {
    let mut line = format!("Result for {name}: {}", colored_verdict(report.verdict));
    if report.failed_samples > 0 {
        line.push_str(&format!(
            " ({} of {} samples failed)",
            report.failed_samples, report.attempted_samples
        ));
    }
    if let Some(reason) = &report.unknown_reason {
        line.push_str(&format!(" [{}]", reason.to_string().yellow()));
    }
    line
}

fn run_analyze(global: &GlobalOptions, args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let budget = parse_timecode(&args.seconds)?;
    if budget.is_zero() {
        return Err("--seconds must be greater than 0".into());
    }

    let videos: Vec<String> = if args.videos.is_empty() {
        DEFAULT_VIDEOS.iter().map(|name| name.to_string()).collect()
    } else {
        args.videos.clone()
    };

    let classifier = OnnxGenderClassifier::load(classifier_options(&args)?)?;

    let bar = if global.progress {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("##-"),
        );
        Some(bar)
    } else {
        None
    };

    let progress = Arc::new(TerminalProgress {
        bar: bar.clone(),
        quiet: args.json,
    });
    let options = AnalysisOptions::new()
        .with_sample_budget(budget)
        .with_progress(progress)
        .with_max_frame_width(args.max_width);
    let mut analyzer = GenderAnalyzer::new(classifier).with_options(options);

    let layout = analyzer.analyze_layout_with(&args.dir, &videos, |event| match event {
        LayoutEvent::Started { name, path } => {
            if let Some(bar) = &bar {
                bar.reset();
                bar.set_message(name.to_string());
            }
            if !args.json {
                println!("Analyzing {}...", path.display());
            }
        }
        LayoutEvent::Finished { name, report } => {
            if !args.json {
                println!("{}", result_line(name, report));
            }
        }
    })?;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&layout.to_json())?);
    } else {
        println!("\n{}", "Final Results:".bold());
        println!("{layout}");
    }

    Ok(())
}

fn run_probe(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let video = VideoFile::open(input)?;
    let metadata = video.metadata();
    let report = video.validate();

    if json {
        let payload = json!({
            "path": input.display().to_string(),
            "format": metadata.format,
            "codec": metadata.codec,
            "width": metadata.width,
            "height": metadata.height,
            "fps": metadata.frames_per_second,
            "frame_count": metadata.frame_count,
            "duration_seconds": metadata.duration.as_secs_f64(),
            "valid": report.is_valid(),
            "warnings": report.warnings,
            "errors": report.errors,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let level: FfmpegLogLevel = cli.global.log_level.parse()?;
    speaker_gender::set_ffmpeg_log_level(level);

    match cli
        .command
        .unwrap_or_else(|| Commands::Analyze(AnalyzeArgs::default()))
    {
        Commands::Analyze(args) => run_analyze(&cli.global, args)?,
        Commands::Probe { input, json } => run_probe(&input, json)?,
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "speaker-gender", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalyzeArgs, Cli, Commands, classifier_options, parse_tensor_layout, parse_timecode};
    use clap::Parser;
    use speaker_gender::{DetectorBackend, TensorLayout};

    #[test]
    fn parse_timecode_formats() {
        assert_eq!(parse_timecode("10").unwrap().as_secs(), 10);
        assert_eq!(parse_timecode("01:15").unwrap().as_secs(), 75);
        assert_eq!(parse_timecode("00:01:15.5").unwrap().as_millis(), 75_500);
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("-3").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
        assert!(parse_timecode("1e20").is_err());
        assert!(parse_timecode("0:inf").is_err());
        assert!(parse_timecode("0:-5").is_err());
        assert!(parse_timecode("NaN").is_err());
    }

    #[test]
    fn parse_tensor_layout_aliases() {
        assert_eq!(parse_tensor_layout("NHWC"), Some(TensorLayout::Nhwc));
        assert_eq!(parse_tensor_layout("torch"), Some(TensorLayout::Nchw));
        assert_eq!(parse_tensor_layout("chw"), None);
    }

    #[test]
    fn no_subcommand_means_default_analyze() {
        let cli = Cli::parse_from(["speaker-gender"]);
        assert!(cli.command.is_none());
        let defaults = AnalyzeArgs::default();
        assert_eq!(defaults.seconds, "10");
        assert_eq!(defaults.dir.to_str(), Some("split_videos"));
    }

    #[test]
    fn analyze_defaults_match_clap_defaults() {
        let cli = Cli::parse_from(["speaker-gender", "analyze"]);
        let Some(Commands::Analyze(parsed)) = cli.command else {
            panic!("expected analyze command");
        };
        let defaults = AnalyzeArgs::default();
        assert_eq!(parsed.dir, defaults.dir);
        assert_eq!(parsed.seconds, defaults.seconds);
        assert_eq!(parsed.model, defaults.model);
        assert_eq!(parsed.detector, defaults.detector);
        assert_eq!(parsed.detector_model, defaults.detector_model);
        assert_eq!(parsed.layout, defaults.layout);
        assert_eq!(parsed.input_size, defaults.input_size);
        assert!(parsed.videos.is_empty());
    }

    #[test]
    fn skip_detector_drops_detector_model() {
        let args = AnalyzeArgs {
            detector: "skip".to_string(),
            ..AnalyzeArgs::default()
        };
        let options = classifier_options(&args).unwrap();
        assert_eq!(options.detector, DetectorBackend::Skip);
        assert!(options.detector_model_path.is_none());
        assert!(!options.enforce_detection);
    }

    #[test]
    fn default_args_select_ultraface_with_its_model() {
        let options = classifier_options(&AnalyzeArgs::default()).unwrap();
        assert_eq!(options.detector, DetectorBackend::UltraFace);
        assert_eq!(
            options.detector_model_path.as_deref(),
            Some(std::path::Path::new("models/version-RFB-320.onnx"))
        );
    }

    #[test]
    fn unknown_detector_is_rejected() {
        let args = AnalyzeArgs {
            detector: "retinaface".to_string(),
            ..AnalyzeArgs::default()
        };
        assert!(classifier_options(&args).is_err());
    }
}
