//! Stream validation.
//!
//! Provides [`VideoFile::validate`](crate::VideoFile::validate), which checks
//! the cached [`VideoMetadata`] for properties that make per-second sampling
//! impossible (errors) or unreliable (warnings).
//!
//! # Example
//!
//! ```no_run
//! use speaker_gender::VideoFile;
//!
//! let video = VideoFile::open("split_videos/left_speaker.avi")?;
//! let report = video.validate();
//! if !report.is_valid() {
//!     print!("{report}");
//! }
//! # Ok::<(), speaker_gender::GenderError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::metadata::VideoMetadata;

/// Findings from [`validate_metadata`].
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Issues that may reduce the number of usable samples.
    pub warnings: Vec<String>,
    /// Issues that prevent sampling altogether.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Run the sampling checks on `metadata`.
pub fn validate_metadata(metadata: &VideoMetadata) -> ValidationReport {
    let mut report = ValidationReport::default();

    if metadata.width == 0 || metadata.height == 0 {
        report.errors.push(format!(
            "Invalid video dimensions: {}×{}",
            metadata.width, metadata.height,
        ));
    }

    if metadata.frames_per_second <= 0.0 || !metadata.frames_per_second.is_finite() {
        report
            .errors
            .push("Frame rate is zero — no sampling cadence can be derived".to_string());
    } else {
        if metadata.frames_per_second < 1.0 {
            report.warnings.push(format!(
                "Frame rate below 1 fps ({:.2}) — every frame will be sampled",
                metadata.frames_per_second,
            ));
        } else if metadata.frames_per_second > 240.0 {
            report.warnings.push(format!(
                "Unusually high frame rate ({:.1} fps)",
                metadata.frames_per_second,
            ));
        }

        if metadata.frame_count == 0 {
            report
                .warnings
                .push("Frame count is zero — nothing will be sampled".to_string());
        } else if metadata.frame_duration() < Duration::from_secs(1) {
            report.warnings.push(format!(
                "Clip is shorter than one second ({} frames) — only the first frame will be sampled",
                metadata.frame_count,
            ));
        }
    }

    report.info.push(format!(
        "Video: {} {}×{} @ {:.2} fps, {} frames, {:.2}s [{}]",
        metadata.codec,
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.frame_count,
        metadata.duration.as_secs_f64(),
        metadata.format,
    ));

    report
}
