//! Per-frame gender classification.
//!
//! [`GenderClassifier`] is the seam to the face-analysis model. The analyzer
//! only needs one label per frame; everything about how the label is
//! produced stays behind this trait. [`OnnxGenderClassifier`] is the shipped
//! implementation: an optional face detector followed by a two-class
//! attribute model, both on ONNX Runtime.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use image::{DynamicImage, GenericImageView, RgbImage, imageops::FilterType};
use ort::session::Session;

use crate::{
    configuration::{ChannelOrder, ClassifierOptions, DetectorBackend, TensorLayout},
    detector::{FaceDetector, FaceRegion, UltraFaceDetector},
    error::GenderError,
};

/// Apparent gender label emitted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Man,
    Woman,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Man => "Man",
            Gender::Woman => "Woman",
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "man" | "male" | "m" => Ok(Gender::Man),
            "woman" | "female" | "w" | "f" => Ok(Gender::Woman),
            other => Err(format!("unknown gender label: {other}")),
        }
    }
}

/// Classification of a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GenderPrediction {
    /// The dominant label.
    pub gender: Gender,
    pub woman_probability: f32,
    pub man_probability: f32,
    /// Face the label was computed from; `None` when the whole frame was used.
    pub face: Option<FaceRegion>,
}

impl GenderPrediction {
    /// Build a prediction from class probabilities. Ties go to
    /// [`Gender::Woman`], the first class of the model output.
    pub fn from_probabilities(woman: f32, man: f32, face: Option<FaceRegion>) -> Self {
        let gender = if man > woman { Gender::Man } else { Gender::Woman };
        Self {
            gender,
            woman_probability: woman,
            man_probability: man,
            face,
        }
    }

    /// A prediction carrying only a label, with full confidence in it.
    pub fn certain(gender: Gender) -> Self {
        match gender {
            Gender::Man => Self::from_probabilities(0.0, 1.0, None),
            Gender::Woman => Self::from_probabilities(1.0, 0.0, None),
        }
    }

    /// Probability of the dominant label.
    pub fn confidence(&self) -> f32 {
        match self.gender {
            Gender::Man => self.man_probability,
            Gender::Woman => self.woman_probability,
        }
    }
}

/// Classifies the apparent gender of the face in a frame.
///
/// An error means "no vote" for that frame; the analyzer counts it and
/// moves on.
pub trait GenderClassifier {
    fn classify(&mut self, frame: &DynamicImage) -> Result<GenderPrediction, GenderError>;
}

impl<C: GenderClassifier + ?Sized> GenderClassifier for Box<C> {
    fn classify(&mut self, frame: &DynamicImage) -> Result<GenderPrediction, GenderError> {
        (**self).classify(frame)
    }
}

/// Face detector plus gender attribute model on ONNX Runtime.
///
/// # Example
///
/// ```no_run
/// use speaker_gender::{ClassifierOptions, DetectorBackend, GenderClassifier, OnnxGenderClassifier};
///
/// let options = ClassifierOptions::new("models/gender.onnx")
///     .with_detector(DetectorBackend::UltraFace, "models/version-RFB-320.onnx");
/// let mut classifier = OnnxGenderClassifier::load(options)?;
///
/// let frame = image::open("frame.png").unwrap();
/// let prediction = classifier.classify(&frame)?;
/// println!("{} ({:.0}%)", prediction.gender, prediction.confidence() * 100.0);
/// # Ok::<(), speaker_gender::GenderError>(())
/// ```
pub struct OnnxGenderClassifier {
    session: Session,
    detector: Option<Box<dyn FaceDetector>>,
    options: ClassifierOptions,
}

impl OnnxGenderClassifier {
    /// Load the gender model and the configured detector backend.
    ///
    /// # Errors
    ///
    /// [`GenderError::ModelLoad`] if either model is missing or cannot be
    /// loaded, or if a detector backend is selected without a model path.
    pub fn load(options: ClassifierOptions) -> Result<Self, GenderError> {
        let session = crate::onnx::load_session(&options.model_path)?;

        let detector: Option<Box<dyn FaceDetector>> = match options.detector {
            DetectorBackend::Skip => None,
            DetectorBackend::UltraFace => {
                let path = options.detector_model_path.as_deref().ok_or_else(|| {
                    GenderError::ModelLoad {
                        path: options.model_path.clone(),
                        reason: "UltraFace backend selected but no detector model path set"
                            .to_string(),
                    }
                })?;
                Some(Box::new(UltraFaceDetector::load(path, options.detection_threshold)?))
            }
        };

        log::info!(
            "Gender classifier ready (detector={:?}, enforce_detection={}, input={}px)",
            options.detector,
            options.enforce_detection,
            options.input_size,
        );

        Ok(Self {
            session,
            detector,
            options,
        })
    }

    /// Replace the face detector with a custom backend.
    #[must_use]
    pub fn with_face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    /// Pick the face to classify, or `None` to use the whole frame.
    fn locate_face(&mut self, frame: &DynamicImage) -> Result<Option<FaceRegion>, GenderError> {
        let Some(detector) = self.detector.as_mut() else {
            return Ok(None);
        };

        select_face(detector.detect(frame)?, self.options.enforce_detection)
    }

    fn run_model(&mut self, input: ort::value::Value) -> Result<Vec<f32>, GenderError> {
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| GenderError::Inference(e.to_string()))?;

        let output = match self.options.output_name.as_deref() {
            Some(name) => outputs.get(name).ok_or_else(|| {
                GenderError::UnexpectedOutput(format!("model has no output named `{name}`"))
            })?,
            None if outputs.len() > 0 => &outputs[0],
            None => return Err(GenderError::UnexpectedOutput("model returned no outputs".into())),
        };

        let (_, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| GenderError::UnexpectedOutput(e.to_string()))?;
        Ok(scores.to_vec())
    }
}

impl GenderClassifier for OnnxGenderClassifier {
    fn classify(&mut self, frame: &DynamicImage) -> Result<GenderPrediction, GenderError> {
        let face = self.locate_face(frame)?;
        let region = match &face {
            Some(face) => face.crop(frame),
            None => frame.clone(),
        };

        let size = self.options.input_size;
        let canvas = letterbox(&region, size);
        let bgr = self.options.channel_order == ChannelOrder::Bgr;
        let edge = size as usize;

        let input = match self.options.layout {
            TensorLayout::Nhwc => crate::onnx::tensor_from_vec(
                [1, edge, edge, 3],
                crate::onnx::interleaved_buffer(&canvas, bgr, |v| v as f32 / 255.0),
            )?,
            TensorLayout::Nchw => crate::onnx::tensor_from_vec(
                [1, 3, edge, edge],
                crate::onnx::planar_buffer(&canvas, bgr, |v| v as f32 / 255.0),
            )?,
        };

        let scores = self.run_model(input)?;
        let [woman, man] = class_probabilities(&scores)?;
        Ok(GenderPrediction::from_probabilities(woman, man, face))
    }
}

/// The most confident of `faces`. With none found, `enforce` turns the
/// frame into [`GenderError::NoFaceDetected`]; otherwise the whole frame is
/// used.
pub(crate) fn select_face(
    faces: Vec<FaceRegion>,
    enforce: bool,
) -> Result<Option<FaceRegion>, GenderError> {
    let best = faces
        .into_iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

    match best {
        Some(face) => Ok(Some(face)),
        None if enforce => Err(GenderError::NoFaceDetected),
        None => Ok(None),
    }
}

/// Resize `image` to fit a `size` × `size` square, keeping its aspect ratio,
/// and centre it on a black canvas.
pub(crate) fn letterbox(image: &DynamicImage, size: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut canvas = RgbImage::new(size, size);
    if width == 0 || height == 0 {
        return canvas;
    }

    let factor = (size as f32 / width as f32).min(size as f32 / height as f32);
    let scaled_width = ((width as f32 * factor).round() as u32).clamp(1, size);
    let scaled_height = ((height as f32 * factor).round() as u32).clamp(1, size);

    let resized = image
        .resize_exact(scaled_width, scaled_height, FilterType::Triangle)
        .to_rgb8();
    let offset_x = (size - scaled_width) / 2;
    let offset_y = (size - scaled_height) / 2;
    image::imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);
    canvas
}

/// Interpret a two-value model output as `[woman, man]` probabilities,
/// applying a softmax when the values are not already a distribution.
pub(crate) fn class_probabilities(scores: &[f32]) -> Result<[f32; 2], GenderError> {
    let &[woman, man] = scores else {
        return Err(GenderError::UnexpectedOutput(format!(
            "expected 2 class scores, got {}",
            scores.len()
        )));
    };

    let is_distribution =
        (0.0..=1.0).contains(&woman) && (0.0..=1.0).contains(&man) && ((woman + man) - 1.0).abs() < 1e-3;
    if is_distribution {
        return Ok([woman, man]);
    }

    let peak = woman.max(man);
    let (w, m) = ((woman - peak).exp(), (man - peak).exp());
    let total = w + m;
    Ok([w / total, m / total])
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgb, RgbImage};

    use super::{Gender, GenderPrediction, class_probabilities, letterbox, select_face};
    use crate::{detector::FaceRegion, error::GenderError};

    fn face(x: u32, confidence: f32) -> FaceRegion {
        FaceRegion { x, y: 0, width: 10, height: 10, confidence }
    }

    #[test]
    fn most_confident_face_is_selected() {
        let faces = vec![face(0, 0.75), face(20, 0.95), face(40, 0.8)];
        let chosen = select_face(faces, true).unwrap().unwrap();
        assert_eq!(chosen.x, 20);
    }

    #[test]
    fn no_face_falls_back_to_whole_frame() {
        assert_eq!(select_face(Vec::new(), false).unwrap(), None);
    }

    #[test]
    fn no_face_under_enforcement_is_an_error() {
        assert!(matches!(select_face(Vec::new(), true), Err(GenderError::NoFaceDetected)));
    }

    #[test]
    fn single_face_is_used_regardless_of_enforcement() {
        assert_eq!(select_face(vec![face(5, 0.71)], false).unwrap(), Some(face(5, 0.71)));
    }

    #[test]
    fn probabilities_pass_through_when_already_normalised() {
        let [woman, man] = class_probabilities(&[0.25, 0.75]).unwrap();
        assert!((woman - 0.25).abs() < 1e-6);
        assert!((man - 0.75).abs() < 1e-6);
    }

    #[test]
    fn logits_are_softmaxed() {
        let [woman, man] = class_probabilities(&[2.0, 0.0]).unwrap();
        assert!((woman + man - 1.0).abs() < 1e-6);
        assert!(woman > 0.85 && woman < 0.9);
    }

    #[test]
    fn wrong_class_count_is_rejected() {
        assert!(class_probabilities(&[1.0]).is_err());
        assert!(class_probabilities(&[0.2, 0.3, 0.5]).is_err());
    }

    #[test]
    fn prediction_tie_goes_to_woman() {
        let prediction = GenderPrediction::from_probabilities(0.5, 0.5, None);
        assert_eq!(prediction.gender, Gender::Woman);
        assert!((prediction.confidence() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn letterbox_keeps_aspect_and_centres() {
        let wide = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([255, 255, 255])));
        let canvas = letterbox(&wide, 100);

        assert_eq!(canvas.dimensions(), (100, 100));
        // 100x50 content centred vertically: rows 25..75.
        assert_eq!(canvas.get_pixel(50, 10), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(50, 50), &Rgb([255, 255, 255]));
        assert_eq!(canvas.get_pixel(50, 90), &Rgb([0, 0, 0]));
    }

    #[test]
    fn letterbox_of_empty_image_is_black() {
        let canvas = letterbox(&DynamicImage::new_rgb8(0, 0), 8);
        assert!(canvas.pixels().all(|pixel| *pixel == Rgb([0, 0, 0])));
    }
}
