//! Frame access.
//!
//! [`FrameSource`] is the seam between the sampler and the decoder: the
//! analyzer only needs the stream's frame rate and frame count, and a way to
//! read the frame at a given index. [`VideoFile`] implements it by seeking
//! to the nearest keyframe and decoding forward.

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{error::GenderError, media::VideoFile, metadata::VideoMetadata};

/// Random access to the frames of a video.
pub trait FrameSource {
    /// Stream metadata; the sampler reads `frames_per_second` and
    /// `frame_count`.
    fn metadata(&self) -> &VideoMetadata;

    /// Read the frame at `frame_number` (0-indexed).
    ///
    /// Returns `Ok(None)` when no frame exists at or after that index, the
    /// way a positioned read past the end of a stream fails.
    fn read_frame(&mut self, frame_number: u64) -> Result<Option<DynamicImage>, GenderError>;
}

impl FrameSource for VideoFile {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Seeks to the nearest keyframe before the target and decodes forward
    /// until the requested frame, or the first frame after it, is reached.
    fn read_frame(&mut self, frame_number: u64) -> Result<Option<DynamicImage>, GenderError> {
        let frames_per_second = self.metadata.frames_per_second;
        if frames_per_second <= 0.0 {
            return Err(GenderError::FrameRateUnavailable);
        }

        let total_frames = self.metadata.frame_count;
        if total_frames > 0 && frame_number >= total_frames {
            return Ok(None);
        }

        let (target_width, target_height) = self.output_size;

        let stream = self
            .input_context
            .stream(self.stream_index)
            .ok_or(GenderError::NoVideoStream)?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            target_width,
            target_height,
            ScalingFlags::BILINEAR,
        )?;

        let seek_timestamp =
            crate::conversion::frame_number_to_seek_timestamp(frame_number, frames_per_second);
        self.input_context.seek(seek_timestamp, ..seek_timestamp)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame
                    .timestamp()
                    .or_else(|| decoded_frame.pts())
                    .unwrap_or(0);
                let current =
                    crate::conversion::pts_to_frame_number(pts, time_base, frames_per_second);

                if current >= frame_number {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return frame_to_image(&rgb_frame, target_width, target_height).map(Some);
                }
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame
                .timestamp()
                .or_else(|| decoded_frame.pts())
                .unwrap_or(0);
            let current = crate::conversion::pts_to_frame_number(pts, time_base, frames_per_second);

            if current >= frame_number {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return frame_to_image(&rgb_frame, target_width, target_height).map(Some);
            }
        }

        log::debug!(
            "No frame at or after {frame_number} in {}",
            self.file_path.display()
        );
        Ok(None)
    }
}

/// Convert a scaled RGB24 frame to an [`image::DynamicImage`].
fn frame_to_image(rgb_frame: &VideoFrame, width: u32, height: u32) -> Result<DynamicImage, GenderError> {
    let buffer = crate::conversion::packed_plane(rgb_frame, width, height, 3);
    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        GenderError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}
