//! Internal conversion helpers.
//!
//! Timestamp arithmetic between frame numbers, stream time bases and
//! FFmpeg's seek time base, plus stripping row padding from decoded frames.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Convert an FFmpeg rational to a float, returning `None` for a zero or
/// negative denominator or a non-positive value.
pub(crate) fn positive_rate(rate: Rational) -> Option<f64> {
    if rate.denominator() <= 0 {
        return None;
    }
    let value = rate.numerator() as f64 / rate.denominator() as f64;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a frame number.
///
/// Rounds to the nearest frame so that timestamps stored with less precision
/// than the frame period still land on the intended index.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts_to_seconds(pts, time_base).max(0.0);
    (seconds * frames_per_second).round() as u64
}

/// Convert a frame number to a seek timestamp in `AV_TIME_BASE`
/// (microseconds), as expected by `Input::seek` with no stream selected.
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

/// Copy the first plane of a packed video frame into a tightly-packed buffer.
///
/// Decoded frames frequently carry per-row padding (stride > width × bpp).
/// The returned buffer can be passed straight to
/// [`image::RgbImage::from_raw`].
pub(crate) fn packed_plane(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * height as usize].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_bytes]);
    }
    buffer
}
