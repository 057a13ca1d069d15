//! Frame sampling and classification driver.
//!
//! [`GenderAnalyzer`] ties the pieces together: it opens a video, plans one
//! sample per second, classifies each sampled frame and takes the majority
//! vote. Anything that prevents a verdict (missing file, unreadable frame
//! rate, no usable frames) yields [`GenderVerdict::Unknown`] with an
//! [`UnknownReason`] instead of an error.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    classifier::{Gender, GenderClassifier},
    configuration::AnalysisOptions,
    error::GenderError,
    layout::SpeakerLayout,
    media::VideoFile,
    progress::ProgressTracker,
    sampling::SamplePlan,
    video::FrameSource,
    vote::{GenderTally, GenderVerdict},
};

/// Why a video produced no verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownReason {
    /// The path does not exist.
    FileNotFound,
    /// The file exists but could not be opened as a video.
    OpenFailed(String),
    /// The stream reports a zero frame rate.
    FrameRateUnavailable,
    /// No sampled frame produced a classification.
    NoUsableFrames,
}

impl Display for UnknownReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UnknownReason::FileNotFound => f.write_str("file not found"),
            UnknownReason::OpenFailed(reason) => write!(f, "could not open video: {reason}"),
            UnknownReason::FrameRateUnavailable => f.write_str("could not read frame rate"),
            UnknownReason::NoUsableFrames => f.write_str("no frame yielded a classification"),
        }
    }
}

/// Per-video notification from [`GenderAnalyzer::analyze_layout_with`].
#[derive(Debug, Clone, Copy)]
pub enum LayoutEvent<'a> {
    /// Analysis of `path` is about to start.
    Started { name: &'a str, path: &'a Path },
    /// Analysis finished with `report`.
    Finished { name: &'a str, report: &'a AnalysisReport },
}

/// One successful per-frame classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameVote {
    pub frame_number: u64,
    pub gender: Gender,
    /// Probability the classifier gave the winning label.
    pub confidence: f32,
}

/// Outcome of analysing one video.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Path analysed, when the report came from a file.
    pub path: Option<PathBuf>,
    pub verdict: GenderVerdict,
    /// Successful classifications in sampling order.
    pub votes: Vec<FrameVote>,
    /// Samples in the plan.
    pub planned_samples: usize,
    /// Sampled frames that were read and handed to the classifier.
    pub attempted_samples: usize,
    /// Attempted samples the classifier failed on.
    pub failed_samples: usize,
    /// Set whenever `verdict` is [`GenderVerdict::Unknown`].
    pub unknown_reason: Option<UnknownReason>,
}

impl AnalysisReport {
    fn unknown(path: Option<&Path>, reason: UnknownReason) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            verdict: GenderVerdict::Unknown,
            votes: Vec::new(),
            planned_samples: 0,
            attempted_samples: 0,
            failed_samples: 0,
            unknown_reason: Some(reason),
        }
    }

    /// Votes cast for `gender`.
    pub fn votes_for(&self, gender: Gender) -> usize {
        self.votes.iter().filter(|vote| vote.gender == gender).count()
    }
}

/// Samples videos and classifies the apparent gender of the speaker.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use speaker_gender::{ClassifierOptions, GenderAnalyzer, OnnxGenderClassifier};
///
/// let classifier = OnnxGenderClassifier::load(ClassifierOptions::new("models/gender.onnx"))?;
/// let mut analyzer = GenderAnalyzer::new(classifier);
/// let verdict = analyzer.gender("split_videos/left_speaker.avi", Duration::from_secs(10));
/// println!("{verdict}");
/// # Ok::<(), speaker_gender::GenderError>(())
/// ```
pub struct GenderAnalyzer<C> {
    classifier: C,
    options: AnalysisOptions,
}

impl<C: GenderClassifier> GenderAnalyzer<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            options: AnalysisOptions::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn into_classifier(self) -> C {
        self.classifier
    }

    /// Dominant gender of the speaker in `path`, sampling at most `seconds`
    /// of it. Every failure, cancellation included, reads as
    /// [`GenderVerdict::Unknown`].
    pub fn gender<P: AsRef<Path>>(&mut self, path: P, seconds: Duration) -> GenderVerdict {
        let configured = self.options.sample_budget;
        self.options.sample_budget = seconds;
        let result = self.analyze_file(path);
        self.options.sample_budget = configured;

        match result {
            Ok(report) => report.verdict,
            Err(error) => {
                log::warn!("Analysis aborted: {error}");
                GenderVerdict::Unknown
            }
        }
    }

    /// Analyse the video at `path`.
    ///
    /// A missing or unreadable file yields an `Unknown` report rather than an
    /// error; the file handle is released before this returns.
    ///
    /// # Errors
    ///
    /// Only [`GenderError::Cancelled`] and [`GenderError::InvalidSampleBudget`].
    pub fn analyze_file<P: AsRef<Path>>(&mut self, path: P) -> Result<AnalysisReport, GenderError> {
        let path = path.as_ref();

        if !path.exists() {
            log::warn!("{} not found", path.display());
            return Ok(AnalysisReport::unknown(Some(path), UnknownReason::FileNotFound));
        }

        let mut video = match VideoFile::open(path) {
            Ok(video) => video,
            Err(error) => {
                log::warn!("Could not open {}: {error}", path.display());
                return Ok(AnalysisReport::unknown(
                    Some(path),
                    UnknownReason::OpenFailed(error.to_string()),
                ));
            }
        };

        let (width, height) = self
            .options
            .resolve_dimensions(video.metadata.width, video.metadata.height);
        video.set_output_size(width, height);

        let mut report = self.analyze_source(&mut video)?;
        report.path = Some(path.to_path_buf());
        Ok(report)
    }

    /// Analyse an already-open frame source.
    ///
    /// # Errors
    ///
    /// Only [`GenderError::Cancelled`] and [`GenderError::InvalidSampleBudget`].
    pub fn analyze_source<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<AnalysisReport, GenderError> {
        let plan = match SamplePlan::for_metadata(source.metadata(), self.options.sample_budget) {
            Ok(plan) => plan,
            Err(GenderError::FrameRateUnavailable) => {
                log::warn!("Could not read a frame rate; skipping");
                return Ok(AnalysisReport::unknown(None, UnknownReason::FrameRateUnavailable));
            }
            Err(error) => return Err(error),
        };

        log::debug!(
            "Sampling {} frame(s), every {} frame(s) below frame {}",
            plan.len(),
            plan.step(),
            plan.analyzed_frames(),
        );

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            Some(plan.len() as u64),
            self.options.batch_size,
        );
        let mut tally = GenderTally::new();
        let mut votes = Vec::with_capacity(plan.len());
        let mut attempted_samples = 0;

        for &frame_number in &plan {
            if self.options.is_cancelled() {
                return Err(GenderError::Cancelled);
            }

            let frame = match source.read_frame(frame_number) {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::debug!("Frame {frame_number}: end of stream, stopping");
                    break;
                }
                Err(error) => {
                    log::warn!("Frame {frame_number}: read failed ({error}), stopping");
                    break;
                }
            };

            attempted_samples += 1;
            match self.classifier.classify(&frame) {
                Ok(prediction) => {
                    log::info!("Frame {frame_number}: {}", prediction.gender);
                    tally.record(prediction.gender);
                    votes.push(FrameVote {
                        frame_number,
                        gender: prediction.gender,
                        confidence: prediction.confidence(),
                    });
                    tracker.advance(frame_number, Some(prediction.gender));
                }
                Err(error) => {
                    log::debug!("Frame {frame_number}: no vote ({error})");
                    tally.record_failure();
                    tracker.advance(frame_number, None);
                }
            }
        }
        tracker.finish();

        let verdict = tally.verdict();
        if tally.failures() > 0 {
            log::info!(
                "{} of {attempted_samples} sampled frame(s) failed classification",
                tally.failures(),
            );
        }

        Ok(AnalysisReport {
            path: None,
            verdict,
            votes,
            planned_samples: plan.len(),
            attempted_samples,
            failed_samples: tally.failures() as usize,
            unknown_reason: verdict.is_unknown().then_some(UnknownReason::NoUsableFrames),
        })
    }

    /// Analyse `names` under `directory` in order and collect the results.
    ///
    /// # Errors
    ///
    /// Stops at the first [`GenderError::Cancelled`] or
    /// [`GenderError::InvalidSampleBudget`].
    pub fn analyze_layout<P, I, S>(&mut self, directory: P, names: I) -> Result<SpeakerLayout, GenderError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.analyze_layout_with(directory, names, |_| {})
    }

    /// Like [`analyze_layout`](Self::analyze_layout), calling `on_event`
    /// before and after each video.
    pub fn analyze_layout_with<P, I, S, F>(
        &mut self,
        directory: P,
        names: I,
        mut on_event: F,
    ) -> Result<SpeakerLayout, GenderError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(LayoutEvent<'_>),
    {
        let directory = directory.as_ref();
        let mut layout = SpeakerLayout::new();

        for name in names {
            let name = name.as_ref();
            let path = directory.join(name);
            log::info!("Analyzing {}...", path.display());
            on_event(LayoutEvent::Started { name, path: &path });

            let report = self.analyze_file(&path)?;
            log::info!("Result for {name}: {}", report.verdict);
            on_event(LayoutEvent::Finished { name, report: &report });

            layout.insert(name, report);
        }

        Ok(layout)
    }
}
