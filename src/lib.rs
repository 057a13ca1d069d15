//! # speaker-gender
//!
//! Sample frames from short speaker clips and classify the apparent gender
//! of the person shown by majority vote.
//!
//! The crate owns only the orchestration: opening the video with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), taking one frame
//! per second of the clip, handing each frame to a face-analysis model, and
//! voting over the noisy per-frame labels. The model sits behind the
//! [`GenderClassifier`] trait; [`OnnxGenderClassifier`] runs a face detector
//! and a gender attribute model on ONNX Runtime.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use speaker_gender::{
//!     ClassifierOptions, DetectorBackend, GenderAnalyzer, OnnxGenderClassifier,
//! };
//!
//! let options = ClassifierOptions::new("models/gender.onnx")
//!     .with_detector(DetectorBackend::UltraFace, "models/version-RFB-320.onnx");
//! let classifier = OnnxGenderClassifier::load(options)?;
//! let mut analyzer = GenderAnalyzer::new(classifier);
//!
//! let verdict = analyzer.gender("split_videos/left_speaker.avi", Duration::from_secs(10));
//! println!("left speaker: {verdict}");
//! # Ok::<(), speaker_gender::GenderError>(())
//! ```
//!
//! ### Analysing the speaker pair
//!
//! ```no_run
//! use speaker_gender::{
//!     ClassifierOptions, GenderAnalyzer, OnnxGenderClassifier, DEFAULT_VIDEOS,
//!     DEFAULT_VIDEO_DIRECTORY,
//! };
//!
//! let classifier = OnnxGenderClassifier::load(ClassifierOptions::new("models/gender.onnx"))?;
//! let layout = GenderAnalyzer::new(classifier)
//!     .analyze_layout(DEFAULT_VIDEO_DIRECTORY, DEFAULT_VIDEOS)?;
//! println!("{layout}");
//! # Ok::<(), speaker_gender::GenderError>(())
//! ```
//!
//! ## Failure handling
//!
//! A missing file, an unreadable frame rate, or a clip where no frame could
//! be classified all produce [`GenderVerdict::Unknown`] with an
//! [`UnknownReason`], never an error. Per-frame classifier failures are not
//! votes; they are counted in [`AnalysisReport::failed_samples`] and logged at
//! `debug` level through the [`log`](https://crates.io/crates/log) facade.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed. ONNX Runtime binaries are
//! downloaded at build time by `ort`.

pub mod analyzer;
pub mod classifier;
pub mod configuration;
mod conversion;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod layout;
pub mod media;
pub mod metadata;
mod onnx;
pub mod progress;
pub mod sampling;
pub mod validation;
pub mod video;
pub mod vote;

pub use analyzer::{AnalysisReport, FrameVote, GenderAnalyzer, LayoutEvent, UnknownReason};
pub use classifier::{Gender, GenderClassifier, GenderPrediction, OnnxGenderClassifier};
pub use configuration::{
    AnalysisOptions, ChannelOrder, ClassifierOptions, DEFAULT_SAMPLE_BUDGET, DetectorBackend,
    TensorLayout,
};
pub use detector::{FaceDetector, FaceRegion, UltraFaceDetector};
pub use error::GenderError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use layout::{DEFAULT_VIDEO_DIRECTORY, DEFAULT_VIDEOS, SpeakerLayout};
pub use media::VideoFile;
pub use metadata::VideoMetadata;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use sampling::SamplePlan;
pub use validation::{ValidationReport, validate_metadata};
pub use video::FrameSource;
pub use vote::{GenderTally, GenderVerdict};
