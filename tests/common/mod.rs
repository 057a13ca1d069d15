//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use image::DynamicImage;
use speaker_gender::{
    FrameSource, Gender, GenderClassifier, GenderError, GenderPrediction, VideoMetadata,
};

pub fn metadata(frames_per_second: f64, frame_count: u64) -> VideoMetadata {
    VideoMetadata {
        width: 64,
        height: 48,
        frames_per_second,
        frame_count,
        duration: std::time::Duration::from_secs_f64(if frames_per_second > 0.0 {
            frame_count as f64 / frames_per_second
        } else {
            0.0
        }),
        codec: "mjpeg".to_string(),
        format: "avi".to_string(),
    }
}

/// In-memory frame source that records which frames were requested.
pub struct MockSource {
    metadata: VideoMetadata,
    /// Frames at or past this index read as end of stream.
    readable_frames: u64,
    /// Frame that fails to decode, if any.
    failing_frame: Option<u64>,
    pub requested: Vec<u64>,
}

impl MockSource {
    pub fn new(frames_per_second: f64, frame_count: u64) -> Self {
        Self {
            metadata: metadata(frames_per_second, frame_count),
            readable_frames: frame_count,
            failing_frame: None,
            requested: Vec::new(),
        }
    }

    /// Report `frame_count` in the header but only decode `readable` frames.
    pub fn truncated(mut self, readable: u64) -> Self {
        self.readable_frames = readable;
        self
    }

    pub fn failing_at(mut self, frame_number: u64) -> Self {
        self.failing_frame = Some(frame_number);
        self
    }
}

impl FrameSource for MockSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self, frame_number: u64) -> Result<Option<DynamicImage>, GenderError> {
        self.requested.push(frame_number);
        if self.failing_frame == Some(frame_number) {
            return Err(GenderError::VideoDecodeError(format!("corrupt frame {frame_number}")));
        }
        if frame_number >= self.readable_frames {
            return Ok(None);
        }
        Ok(Some(DynamicImage::new_rgb8(
            self.metadata.width,
            self.metadata.height,
        )))
    }
}

/// Classifier that replays a fixed script of outcomes; `None` is a failure.
pub struct ScriptedClassifier {
    script: VecDeque<Option<Gender>>,
    pub calls: usize,
}

impl ScriptedClassifier {
    pub fn new<I: IntoIterator<Item = Option<Gender>>>(script: I) -> Self {
        Self {
            script: script.into_iter().collect(),
            calls: 0,
        }
    }

    pub fn always(gender: Gender) -> Self {
        Self::new(std::iter::repeat_n(Some(gender), 64))
    }

    pub fn failing() -> Self {
        Self::new(std::iter::empty())
    }
}

impl GenderClassifier for ScriptedClassifier {
    fn classify(&mut self, _frame: &DynamicImage) -> Result<GenderPrediction, GenderError> {
        self.calls += 1;
        match self.script.pop_front().flatten() {
            Some(gender) => Ok(GenderPrediction::certain(gender)),
            None => Err(GenderError::NoFaceDetected),
        }
    }
}
