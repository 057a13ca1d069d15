//! Analysis and classifier configuration.
//!
//! [`AnalysisOptions`] threads the sample budget, progress callback,
//! cancellation token and decode resolution through
//! [`GenderAnalyzer`](crate::GenderAnalyzer) without widening every
//! signature. [`ClassifierOptions`] describes the ONNX models behind
//! [`OnnxGenderClassifier`](crate::OnnxGenderClassifier).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use speaker_gender::{AnalysisOptions, CancellationToken, ClassifierOptions, DetectorBackend};
//!
//! let token = CancellationToken::new();
//! let analysis = AnalysisOptions::new()
//!     .with_sample_budget(Duration::from_secs(5))
//!     .with_cancellation(token.clone())
//!     .with_max_frame_width(Some(640));
//!
//! let classifier = ClassifierOptions::new("models/gender.onnx")
//!     .with_detector(DetectorBackend::UltraFace, "models/version-RFB-320.onnx")
//!     .with_enforce_detection(false);
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Default number of seconds sampled from each clip.
pub const DEFAULT_SAMPLE_BUDGET: Duration = Duration::from_secs(10);

/// Options for one analysis run.
#[derive(Clone)]
pub struct AnalysisOptions {
    pub(crate) sample_budget: Duration,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) max_frame_width: Option<u32>,
}

impl Debug for AnalysisOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnalysisOptions")
            .field("sample_budget", &self.sample_budget)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("max_frame_width", &self.max_frame_width)
            .finish()
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisOptions {
    /// Defaults: a 10 second budget, no progress callback, no cancellation,
    /// batch size 1, frames decoded at source resolution.
    pub fn new() -> Self {
        Self {
            sample_budget: DEFAULT_SAMPLE_BUDGET,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            max_frame_width: None,
        }
    }

    /// How much of each clip to sample, from the start. One frame is taken
    /// per second of this budget (or of the clip, if shorter).
    #[must_use]
    pub fn with_sample_budget(mut self, budget: Duration) -> Self {
        self.sample_budget = budget;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before every sample.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fire the progress callback every `size` samples. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Downscale decoded frames to at most this width, keeping the aspect
    /// ratio. `None` keeps the source resolution.
    #[must_use]
    pub fn with_max_frame_width(mut self, width: Option<u32>) -> Self {
        self.max_frame_width = width.filter(|&w| w > 0);
        self
    }

    /// The configured sample budget.
    pub fn sample_budget(&self) -> Duration {
        self.sample_budget
    }

    /// The configured progress batch size.
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Resolve the decode size for a source of `width` × `height`.
    pub(crate) fn resolve_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        match self.max_frame_width {
            Some(max) if width > max && width > 0 => {
                let ratio = max as f64 / width as f64;
                let scaled = (height as f64 * ratio).round() as u32;
                (max, scaled.max(1))
            }
            _ => (width, height),
        }
    }
}

/// Face localisation step run before attribute classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorBackend {
    /// UltraFace RFB-320 ONNX detector. This is the default.
    #[default]
    UltraFace,
    /// No detection; the whole frame is classified.
    Skip,
}

impl FromStr for DetectorBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ultraface" | "ultra-face" | "rfb-320" => Ok(DetectorBackend::UltraFace),
            "skip" | "none" => Ok(DetectorBackend::Skip),
            other => Err(format!("unknown detector backend: {other}")),
        }
    }
}

/// Memory layout of the classifier's input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, H, W, 3]`, as exported from Keras. This is the default.
    #[default]
    Nhwc,
    /// `[1, 3, H, W]`, as exported from PyTorch.
    Nchw,
}

/// Channel order fed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Blue, green, red. Models trained on OpenCV-loaded images expect this.
    #[default]
    Bgr,
    /// Red, green, blue.
    Rgb,
}

/// Configuration for [`OnnxGenderClassifier`](crate::OnnxGenderClassifier).
#[derive(Debug, Clone)]
pub struct ClassifierOptions {
    /// Path to the gender attribute model.
    pub model_path: PathBuf,
    /// Square input edge length of the gender model.
    pub input_size: u32,
    /// Input tensor layout.
    pub layout: TensorLayout,
    /// Input channel order.
    pub channel_order: ChannelOrder,
    /// Name of the output tensor holding the `[woman, man]` scores.
    /// `None` takes the model's first output.
    pub output_name: Option<String>,
    /// Face localisation backend.
    pub detector: DetectorBackend,
    /// Path to the detector model, required unless the backend is
    /// [`DetectorBackend::Skip`].
    pub detector_model_path: Option<PathBuf>,
    /// Fail the frame when no face is found instead of classifying the whole
    /// frame.
    pub enforce_detection: bool,
    /// Minimum face confidence reported by the detector.
    pub detection_threshold: f32,
}

impl ClassifierOptions {
    /// Options for the model at `model_path`, with detection enforcement
    /// disabled.
    ///
    /// No detector is configured because the detector needs its own model
    /// file: `detector` starts as [`DetectorBackend::Skip`], so whole frames
    /// are classified until [`with_detector`](Self::with_detector) is called.
    /// [`DetectorBackend::default()`] (UltraFace) is the backend the CLI
    /// selects when a detector model is supplied.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            input_size: 224,
            layout: TensorLayout::default(),
            channel_order: ChannelOrder::default(),
            output_name: None,
            detector: DetectorBackend::Skip,
            detector_model_path: None,
            enforce_detection: false,
            detection_threshold: 0.7,
        }
    }

    /// Use `backend` with its model at `model_path`.
    #[must_use]
    pub fn with_detector<P: AsRef<Path>>(mut self, backend: DetectorBackend, model_path: P) -> Self {
        self.detector = backend;
        self.detector_model_path = Some(model_path.as_ref().to_path_buf());
        self
    }

    /// Classify whole frames without face localisation.
    #[must_use]
    pub fn without_detector(mut self) -> Self {
        self.detector = DetectorBackend::Skip;
        self.detector_model_path = None;
        self
    }

    #[must_use]
    pub fn with_enforce_detection(mut self, enforce: bool) -> Self {
        self.enforce_detection = enforce;
        self
    }

    /// Set the detector confidence threshold, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_detection_threshold(mut self, threshold: f32) -> Self {
        self.detection_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the model input edge length. Clamped to at least 1.
    #[must_use]
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: TensorLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    #[must_use]
    pub fn with_output_name<S: Into<String>>(mut self, name: S) -> Self {
        self.output_name = Some(name.into());
        self
    }
}
