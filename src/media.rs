//! Core [`VideoFile`] implementation.
//!
//! `VideoFile` opens a container with FFmpeg, picks the best video stream,
//! and caches its [`VideoMetadata`]. Frame access lives in
//! [`video`](crate::video) behind the [`FrameSource`](crate::FrameSource)
//! trait.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{
    conversion::positive_rate, error::GenderError, metadata::VideoMetadata,
    validation::ValidationReport,
};

/// An opened video file.
///
/// The demuxer context is owned by this struct and released when it is
/// dropped, so a `VideoFile` is scoped to a single analysis.
///
/// # Example
///
/// ```no_run
/// use speaker_gender::{FrameSource, GenderError, VideoFile};
///
/// let mut video = VideoFile::open("split_videos/left_speaker.avi")?;
/// println!("{:.2} fps", video.metadata().frames_per_second);
/// if let Some(frame) = video.read_frame(0)? {
///     frame.save("first_frame.png")?;
/// }
/// # Ok::<(), GenderError>(())
/// ```
pub struct VideoFile {
    pub(crate) input_context: Input,
    pub(crate) metadata: VideoMetadata,
    pub(crate) stream_index: usize,
    /// Size frames are scaled to when decoded.
    pub(crate) output_size: (u32, u32),
    pub(crate) file_path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("metadata", &self.metadata)
            .field("stream_index", &self.stream_index)
            .field("output_size", &self.output_size)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file and read its stream metadata.
    ///
    /// # Errors
    ///
    /// - [`GenderError::FileOpen`] if FFmpeg cannot open or probe the file.
    /// - [`GenderError::NoVideoStream`] if the container holds no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GenderError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        crate::ffmpeg::initialize().map_err(|error| GenderError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| GenderError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(GenderError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
            GenderError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to read codec parameters for stream {stream_index}: {error}"),
            }
        })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| GenderError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to create video decoder for stream {stream_index}: {error}"),
            })?;

        let frames_per_second = positive_rate(stream.avg_frame_rate())
            .or_else(|| positive_rate(stream.rate()))
            .unwrap_or(0.0);

        // Stream duration is in the stream time base; AV_NOPTS_VALUE is negative.
        let stream_duration = stream.duration();
        let duration = if stream_duration > 0 && time_base.denominator() > 0 {
            Duration::try_from_secs_f64(crate::conversion::pts_to_seconds(stream_duration, time_base))
                .unwrap_or(Duration::ZERO)
        } else if input_context.duration() > 0 {
            Duration::from_micros(input_context.duration() as u64)
        } else {
            Duration::ZERO
        };

        let frame_count = match stream.frames() {
            count if count > 0 => count as u64,
            _ if frames_per_second > 0.0 => (duration.as_secs_f64() * frames_per_second) as u64,
            _ => 0,
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
            format: input_context.format().name().to_string(),
        };

        log::info!(
            "Opened video file: {} (format={}, {}x{}, {:.2} fps, {} frames, {:.2}s)",
            file_path.display(),
            metadata.format,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.duration.as_secs_f64(),
        );

        Ok(Self {
            input_context,
            output_size: (metadata.width, metadata.height),
            metadata,
            stream_index,
            file_path,
        })
    }

    /// The cached stream metadata.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Scale decoded frames to `width` × `height`. Zero dimensions are
    /// replaced by the source size.
    pub fn set_output_size(&mut self, width: u32, height: u32) {
        let width = if width == 0 { self.metadata.width } else { width };
        let height = if height == 0 { self.metadata.height } else { height };
        self.output_size = (width, height);
    }

    /// Check the stream for properties that make sampling unreliable or
    /// impossible. Does not re-read the file.
    pub fn validate(&self) -> ValidationReport {
        crate::validation::validate_metadata(&self.metadata)
    }
}
