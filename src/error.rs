//! Error types for the `speaker-gender` crate.
//!
//! This module defines [`GenderError`], the unified error type returned by
//! fallible operations in the crate. Most of these never escape
//! [`GenderAnalyzer::analyze_file`](crate::GenderAnalyzer::analyze_file),
//! which folds them into an `Unknown` verdict, but they are surfaced as-is by
//! the lower-level building blocks ([`VideoFile`](crate::VideoFile),
//! [`SamplePlan`](crate::SamplePlan), the classifiers and detectors).

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `speaker-gender` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenderError {
    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion or resizing.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The stream reports a frame rate of zero, so no sampling cadence can
    /// be derived.
    #[error("Could not read a frame rate for the video stream")]
    FrameRateUnavailable,

    /// The sampling budget was zero.
    #[error("Sample budget must be greater than zero")]
    InvalidSampleBudget,

    /// An ONNX model could not be loaded.
    #[error("Failed to load model at {path}: {reason}")]
    ModelLoad {
        /// Path of the model file.
        path: PathBuf,
        /// Underlying reason the load failed.
        reason: String,
    },

    /// ONNX Runtime failed while running a model.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// A model produced a tensor with an unexpected name or shape.
    #[error("Unexpected model output: {0}")]
    UnexpectedOutput(String),

    /// Detection was enforced and no face was found in the frame.
    #[error("No face detected in frame")]
    NoFaceDetected,

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for GenderError {
    fn from(error: FfmpegError) -> Self {
        GenderError::FfmpegError(error.to_string())
    }
}
