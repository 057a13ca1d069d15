//! Face localisation.
//!
//! The gender model is trained on face crops, so a detector runs first and
//! the most confident face is classified. [`UltraFaceDetector`] wraps the
//! UltraFace RFB-320 ONNX model; any other backend can be plugged in through
//! [`FaceDetector`].

use std::path::Path;

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use ort::session::Session;

use crate::error::GenderError;

/// UltraFace RFB-320 input size (width, height).
const ULTRAFACE_INPUT: (u32, u32) = (320, 240);

/// Overlap above which a weaker box is suppressed.
const NMS_IOU_THRESHOLD: f32 = 0.3;

/// Bounding box of a detected face, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
}

impl FaceRegion {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Intersection over union with `other`.
    pub fn iou(&self, other: &FaceRegion) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        if right <= left || bottom <= top {
            return 0.0;
        }

        let intersection = (right - left) as f32 * (bottom - top) as f32;
        let union = self.area() as f32 + other.area() as f32 - intersection;
        if union <= 0.0 { 0.0 } else { intersection / union }
    }

    /// Crop this region out of `frame`, clamped to the frame bounds.
    pub fn crop(&self, frame: &DynamicImage) -> DynamicImage {
        let (frame_width, frame_height) = frame.dimensions();
        let x = self.x.min(frame_width.saturating_sub(1));
        let y = self.y.min(frame_height.saturating_sub(1));
        let width = self.width.min(frame_width - x).max(1);
        let height = self.height.min(frame_height - y).max(1);
        frame.crop_imm(x, y, width, height)
    }
}

/// A face localisation backend.
///
/// Implementations may keep state between frames, hence `&mut self`.
pub trait FaceDetector: Send {
    /// Detect faces in `frame`, most confident first.
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<FaceRegion>, GenderError>;
}

/// UltraFace RFB-320 detector running on ONNX Runtime.
///
/// Expects the stock export with a `[1, 3, 240, 320]` input and `scores`
/// (`[1, N, 2]`) and `boxes` (`[1, N, 4]`, normalised corners) outputs.
pub struct UltraFaceDetector {
    session: Session,
    threshold: f32,
}

impl UltraFaceDetector {
    /// Load the model at `model_path`, keeping faces scoring at least
    /// `threshold`.
    pub fn load(model_path: &Path, threshold: f32) -> Result<Self, GenderError> {
        let session = crate::onnx::load_session(model_path)?;
        log::debug!("UltraFace detector ready (threshold={threshold:.2})");
        Ok(Self { session, threshold })
    }
}

impl FaceDetector for UltraFaceDetector {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<FaceRegion>, GenderError> {
        let (frame_width, frame_height) = frame.dimensions();
        let (input_width, input_height) = ULTRAFACE_INPUT;

        let resized = frame
            .resize_exact(input_width, input_height, FilterType::Triangle)
            .to_rgb8();
        let data = crate::onnx::planar_buffer(&resized, false, |v| (v as f32 - 127.0) / 128.0);
        let input = crate::onnx::tensor_from_vec(
            [1, 3, input_height as usize, input_width as usize],
            data,
        )?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| GenderError::Inference(format!("UltraFace: {e}")))?;

        let scores = outputs
            .get("scores")
            .ok_or_else(|| GenderError::UnexpectedOutput("UltraFace: missing `scores`".into()))?
            .try_extract_tensor::<f32>()
            .map_err(|e| GenderError::UnexpectedOutput(format!("UltraFace scores: {e}")))?
            .1;
        let boxes = outputs
            .get("boxes")
            .ok_or_else(|| GenderError::UnexpectedOutput("UltraFace: missing `boxes`".into()))?
            .try_extract_tensor::<f32>()
            .map_err(|e| GenderError::UnexpectedOutput(format!("UltraFace boxes: {e}")))?
            .1;

        let faces = decode_detections(scores, boxes, frame_width, frame_height, self.threshold)?;
        log::debug!("UltraFace found {} face(s)", faces.len());
        Ok(faces)
    }
}

/// Turn raw UltraFace outputs into pixel regions, apply the confidence
/// threshold and non-maximum suppression, and sort by confidence.
pub(crate) fn decode_detections(
    scores: &[f32],
    boxes: &[f32],
    frame_width: u32,
    frame_height: u32,
    threshold: f32,
) -> Result<Vec<FaceRegion>, GenderError> {
    if scores.len() % 2 != 0 || boxes.len() % 4 != 0 || scores.len() / 2 != boxes.len() / 4 {
        return Err(GenderError::UnexpectedOutput(format!(
            "UltraFace: {} scores do not match {} box coordinates",
            scores.len(),
            boxes.len()
        )));
    }

    let to_pixels = |value: f32, extent: u32| (value.clamp(0.0, 1.0) * extent as f32).round() as u32;

    let mut candidates: Vec<FaceRegion> = scores
        .chunks_exact(2)
        .zip(boxes.chunks_exact(4))
        .filter(|(score, _)| score[1] >= threshold)
        .filter_map(|(score, corners)| {
            let x1 = to_pixels(corners[0], frame_width);
            let y1 = to_pixels(corners[1], frame_height);
            let x2 = to_pixels(corners[2], frame_width);
            let y2 = to_pixels(corners[3], frame_height);
            (x2 > x1 && y2 > y1).then_some(FaceRegion {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
                confidence: score[1],
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<FaceRegion> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|face| face.iou(&candidate) <= NMS_IOU_THRESHOLD) {
            kept.push(candidate);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GenericImageView};

    use super::{FaceRegion, decode_detections};

    fn region(x: u32, y: u32, width: u32, height: u32) -> FaceRegion {
        FaceRegion { x, y, width, height, confidence: 1.0 }
    }

    #[test]
    fn iou_of_identical_and_disjoint_regions() {
        let a = region(10, 10, 20, 20);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&region(100, 100, 5, 5)), 0.0);
        // Touching edges do not overlap.
        assert_eq!(a.iou(&region(30, 10, 20, 20)), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = region(0, 0, 10, 10);
        let b = region(5, 0, 10, 10);
        // 50 / (100 + 100 - 50)
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn crop_is_clamped_to_frame() {
        let frame = DynamicImage::new_rgb8(100, 50);
        let crop = region(80, 40, 50, 50).crop(&frame);
        assert_eq!(crop.dimensions(), (20, 10));

        let outside = region(500, 500, 10, 10).crop(&frame);
        assert_eq!(outside.dimensions(), (1, 1));
    }

    #[test]
    fn decode_applies_threshold_and_scales_to_pixels() {
        let scores = [0.9, 0.1, 0.2, 0.8];
        let boxes = [0.0, 0.0, 0.5, 0.5, 0.25, 0.5, 0.75, 1.0];
        let faces = decode_detections(&scores, &boxes, 200, 100, 0.7).unwrap();

        assert_eq!(faces.len(), 1);
        assert_eq!((faces[0].x, faces[0].y, faces[0].width, faces[0].height), (50, 50, 100, 50));
        assert!((faces[0].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn decode_suppresses_overlapping_boxes() {
        let scores = [0.0, 0.95, 0.0, 0.9, 0.0, 0.85];
        let boxes = [
            0.1, 0.1, 0.5, 0.5, // strongest
            0.12, 0.12, 0.5, 0.5, // near-duplicate
            0.6, 0.6, 0.9, 0.9, // separate face
        ];
        let faces = decode_detections(&scores, &boxes, 100, 100, 0.7).unwrap();

        assert_eq!(faces.len(), 2);
        assert!((faces[0].confidence - 0.95).abs() < 1e-6);
        assert!((faces[1].confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn decode_drops_degenerate_boxes() {
        let faces = decode_detections(&[0.0, 0.99], &[0.5, 0.5, 0.5, 0.9], 100, 100, 0.5).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn decode_rejects_mismatched_outputs() {
        assert!(decode_detections(&[0.0, 1.0, 0.0, 1.0], &[0.0, 0.0, 1.0, 1.0], 10, 10, 0.5).is_err());
        assert!(decode_detections(&[0.0, 1.0, 0.5], &[0.0, 0.0, 1.0], 10, 10, 0.5).is_err());
    }
}
