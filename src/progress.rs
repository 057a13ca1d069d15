//! Per-sample progress reporting and cancellation.
//!
//! [`ProgressCallback`] receives one [`ProgressInfo`] per sampled frame (or
//! per batch, see [`AnalysisOptions::with_batch_size`](crate::AnalysisOptions::with_batch_size)),
//! carrying the frame number and the label the classifier produced for it,
//! if any. [`CancellationToken`] lets another thread stop an analysis
//! between samples.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use speaker_gender::{AnalysisOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintVotes;
//!
//! impl ProgressCallback for PrintVotes {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let (Some(frame), Some(gender)) = (info.current_frame, info.gender) {
//!             println!("Frame {frame}: {gender}");
//!         }
//!     }
//! }
//!
//! let options = AnalysisOptions::new().with_progress(Arc::new(PrintVotes));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::classifier::Gender;

/// A snapshot of analysis progress for one video.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many samples have been attempted so far.
    pub current: u64,
    /// Samples planned for this video.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known and non-zero.
    pub percentage: Option<f32>,
    /// Wall-clock time since the analysis of this video started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on the throughput so far.
    pub estimated_remaining: Option<Duration>,
    /// Frame number of the sample just processed.
    pub current_frame: Option<u64>,
    /// Label produced for that frame, `None` when it yielded no vote.
    pub gender: Option<Gender>,
}

/// Receives progress updates during an analysis.
///
/// Callbacks observe but cannot halt the analysis; use
/// [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called after each batch of samples.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Shared stop flag, checked by the analyzer before every sample.
///
/// Clones observe the same flag, so one can be handed to a signal handler or
/// another thread while the analysis runs.
///
/// ```
/// use speaker_gender::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    stop: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the analysis to stop before its next sample.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Counts samples for one video and calls back every `batch_size` of them.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    planned: Option<u64>,
    done: u64,
    batch_size: u64,
    pending: u64,
    started: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, planned: Option<u64>, batch_size: u64) -> Self {
        Self {
            callback,
            planned,
            done: 0,
            batch_size: batch_size.max(1),
            pending: 0,
            started: Instant::now(),
        }
    }

    /// Record one attempted sample and the label it produced.
    pub(crate) fn advance(&mut self, frame_number: u64, gender: Option<Gender>) {
        self.done += 1;
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.emit(Some(frame_number), gender);
        }
    }

    /// Flush samples not yet reported.
    pub(crate) fn finish(&mut self) {
        if self.pending > 0 {
            self.emit(None, None);
        }
    }

    fn emit(&mut self, current_frame: Option<u64>, gender: Option<Gender>) {
        self.pending = 0;
        let elapsed = self.started.elapsed();
        let planned = self.planned.filter(|&planned| planned > 0);

        // Linear extrapolation from the average time per sample so far.
        let estimated_remaining = planned.map(|planned| {
            let left = planned.saturating_sub(self.done) as f64;
            elapsed.mul_f64(left / self.done as f64)
        });

        self.callback.on_progress(&ProgressInfo {
            current: self.done,
            total: self.planned,
            percentage: planned.map(|planned| self.done as f32 * 100.0 / planned as f32),
            elapsed,
            estimated_remaining,
            current_frame,
            gender,
        });
    }
}
