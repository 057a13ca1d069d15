//! Sample index planning.
//!
//! A [`SamplePlan`] is the ordered list of frame numbers classified for one
//! video: one frame per second of `min(clip duration, budget)`, starting at
//! frame 0.

use std::time::Duration;

use crate::{error::GenderError, metadata::VideoMetadata};

/// Frame numbers to sample from one video.
///
/// The step between samples is the frame rate truncated to a whole number of
/// frames (at least 1), and the plan stops before
/// `floor(min(duration, budget) × fps)`, where `duration` is
/// `frame_count / fps`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use speaker_gender::SamplePlan;
///
/// // 3.5 seconds at 30 fps, 10 second budget: frames 0, 30, 60, 90.
/// let plan = SamplePlan::new(30.0, 105, Duration::from_secs(10)).unwrap();
/// assert_eq!(plan.frame_numbers(), &[0, 30, 60, 90]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SamplePlan {
    frame_numbers: Vec<u64>,
    step: u64,
    analyzed_frames: u64,
}

impl SamplePlan {
    /// Plan samples for a stream with the given rate and frame count.
    ///
    /// # Errors
    ///
    /// - [`GenderError::FrameRateUnavailable`] if `frames_per_second` is zero,
    ///   negative or not finite.
    /// - [`GenderError::InvalidSampleBudget`] if `budget` is zero.
    pub fn new(
        frames_per_second: f64,
        frame_count: u64,
        budget: Duration,
    ) -> Result<Self, GenderError> {
        if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
            return Err(GenderError::FrameRateUnavailable);
        }
        if budget.is_zero() {
            return Err(GenderError::InvalidSampleBudget);
        }

        let duration_seconds = frame_count as f64 / frames_per_second;
        let analyzed_seconds = duration_seconds.min(budget.as_secs_f64());
        let analyzed_frames = (analyzed_seconds * frames_per_second) as u64;

        // Sub-1 fps streams would otherwise produce a zero step.
        let step = (frames_per_second as u64).max(1);

        let frame_numbers: Vec<u64> = (0..analyzed_frames).step_by(step as usize).collect();

        Ok(Self {
            frame_numbers,
            step,
            analyzed_frames,
        })
    }

    /// Plan samples for `metadata` under `budget`.
    pub fn for_metadata(metadata: &VideoMetadata, budget: Duration) -> Result<Self, GenderError> {
        Self::new(metadata.frames_per_second, metadata.frame_count, budget)
    }

    /// Frame numbers to sample, in ascending order.
    pub fn frame_numbers(&self) -> &[u64] {
        &self.frame_numbers
    }

    /// Distance between consecutive samples, in frames.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Exclusive upper bound on sampled frame numbers.
    pub fn analyzed_frames(&self) -> u64 {
        self.analyzed_frames
    }

    pub fn len(&self) -> usize {
        self.frame_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_numbers.is_empty()
    }
}

impl<'a> IntoIterator for &'a SamplePlan {
    type Item = &'a u64;
    type IntoIter = std::slice::Iter<'a, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.frame_numbers.iter()
    }
}
