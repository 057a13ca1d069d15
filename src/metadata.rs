//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoFile`](crate::VideoFile) is
//! opened and cached for the lifetime of the handle. The sampler only
//! consumes the frame rate and frame count; the remaining fields feed the
//! validation report and the `probe` command.

use std::time::Duration;

/// Metadata for the video stream being sampled.
///
/// # Example
///
/// ```no_run
/// use speaker_gender::VideoFile;
///
/// let video = VideoFile::open("split_videos/left_speaker.avi").unwrap();
/// let metadata = video.metadata();
/// println!("{:.2} fps, {} frames", metadata.frames_per_second, metadata.frame_count);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second. Zero when the container does not report a rate.
    pub frames_per_second: f64,
    /// Total number of frames, from the stream header when available and
    /// otherwise estimated from duration and frame rate.
    pub frame_count: u64,
    /// Stream duration, falling back to the container duration.
    pub duration: Duration,
    /// Codec name (e.g. `"mjpeg"`, `"h264"`).
    pub codec: String,
    /// Container format name (e.g. `"avi"`).
    pub format: String,
}

impl VideoMetadata {
    /// Duration implied by the frame count and frame rate.
    ///
    /// This is the figure the sampler bounds itself by, matching what a
    /// frame-indexed reader would see. Returns [`Duration::ZERO`] when the
    /// frame rate is unknown or the ratio does not fit a [`Duration`].
    pub fn frame_duration(&self) -> Duration {
        if self.frames_per_second > 0.0 {
            Duration::try_from_secs_f64(self.frame_count as f64 / self.frames_per_second)
                .unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }
}
