//! Shared ONNX Runtime plumbing for the detector and classifier.

use std::path::Path;

use image::RgbImage;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::{Tensor, Value};

use crate::error::GenderError;

/// Load an ONNX model into a CPU session.
pub(crate) fn load_session(model_path: &Path) -> Result<Session, GenderError> {
    let model_error = |reason: String| GenderError::ModelLoad {
        path: model_path.to_path_buf(),
        reason,
    };

    if !model_path.exists() {
        return Err(model_error("model file not found".to_string()));
    }

    let session = Session::builder()
        .map_err(|e| model_error(format!("session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| model_error(format!("optimization level: {e}")))?
        .commit_from_file(model_path)
        .map_err(|e| model_error(format!("load model: {e}")))?;

    log::info!("Loaded ONNX model {}", model_path.display());
    Ok(session)
}

/// Build an `f32` input tensor from a flat buffer and its shape.
pub(crate) fn tensor_from_vec(shape: [usize; 4], data: Vec<f32>) -> Result<Value, GenderError> {
    Tensor::from_array((shape.to_vec(), data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| GenderError::Inference(format!("failed to create tensor: {e}")))
}

/// Lay out an RGB image as a `[1, 3, H, W]` buffer, mapping each channel
/// value through `normalize`. `bgr` swaps the first and last channel.
pub(crate) fn planar_buffer(image: &RgbImage, bgr: bool, normalize: impl Fn(u8) -> f32) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; plane * 3];

    for (index, pixel) in image.pixels().enumerate() {
        for channel in 0..3 {
            let source = if bgr { 2 - channel } else { channel };
            data[channel * plane + index] = normalize(pixel[source]);
        }
    }
    data
}

/// Lay out an RGB image as a `[1, H, W, 3]` buffer.
pub(crate) fn interleaved_buffer(image: &RgbImage, bgr: bool, normalize: impl Fn(u8) -> f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        if bgr {
            data.extend([normalize(pixel[2]), normalize(pixel[1]), normalize(pixel[0])]);
        } else {
            data.extend([normalize(pixel[0]), normalize(pixel[1]), normalize(pixel[2])]);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::{interleaved_buffer, planar_buffer};

    // 2x1, every channel value distinct.
    fn two_pixels() -> RgbImage {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([1, 2, 3]));
        image.put_pixel(1, 0, Rgb([4, 5, 6]));
        image
    }

    fn raw(value: u8) -> f32 {
        value as f32
    }

    #[test]
    fn interleaved_rgb() {
        assert_eq!(
            interleaved_buffer(&two_pixels(), false, raw),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn interleaved_bgr() {
        assert_eq!(
            interleaved_buffer(&two_pixels(), true, raw),
            vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]
        );
    }

    #[test]
    fn planar_rgb() {
        assert_eq!(
            planar_buffer(&two_pixels(), false, raw),
            vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]
        );
    }

    #[test]
    fn planar_bgr() {
        assert_eq!(
            planar_buffer(&two_pixels(), true, raw),
            vec![3.0, 6.0, 2.0, 5.0, 1.0, 4.0]
        );
    }

    #[test]
    fn normalisation_is_applied_per_value() {
        let data = planar_buffer(&two_pixels(), false, |v| (v as f32 - 127.0) / 128.0);
        assert!((data[0] - (1.0 - 127.0) / 128.0).abs() < 1e-6);
        assert_eq!(data.len(), 6);
    }
}
