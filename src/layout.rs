//! Ordered video → verdict mapping.
//!
//! [`SpeakerLayout`] keeps results in the order videos were processed, so
//! the left/right speaker pair prints the way it was analysed.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde_json::{Value, json};

use crate::{analyzer::AnalysisReport, vote::GenderVerdict};

/// Directory the speaker clips are read from by default.
pub const DEFAULT_VIDEO_DIRECTORY: &str = "split_videos";

/// Clips analysed by default, in order.
pub const DEFAULT_VIDEOS: [&str; 2] = ["left_speaker.avi", "right_speaker.avi"];

/// Video identifier → analysis report, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SpeakerLayout {
    entries: Vec<(String, AnalysisReport)>,
}

impl SpeakerLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the report for `name`. A replaced entry keeps its
    /// original position.
    pub fn insert<S: Into<String>>(&mut self, name: S, report: AnalysisReport) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = report,
            None => self.entries.push((name, report)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AnalysisReport> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, report)| report)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnalysisReport)> {
        self.entries.iter().map(|(name, report)| (name.as_str(), report))
    }

    /// Names and verdicts in insertion order.
    pub fn verdicts(&self) -> Vec<(&str, GenderVerdict)> {
        self.iter().map(|(name, report)| (name, report.verdict)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON rendering: `{"layout": {...}, "videos": [...]}`. `layout` maps
    /// names to verdict labels; `videos` carries the per-video detail.
    pub fn to_json(&self) -> Value {
        let layout: serde_json::Map<String, Value> = self
            .iter()
            .map(|(name, report)| (name.to_string(), Value::from(report.verdict.label())))
            .collect();

        let videos: Vec<Value> = self
            .iter()
            .map(|(name, report)| {
                json!({
                    "name": name,
                    "path": report.path.as_ref().map(|path| path.display().to_string()),
                    "gender": report.verdict.label(),
                    "planned_samples": report.planned_samples,
                    "attempted_samples": report.attempted_samples,
                    "failed_samples": report.failed_samples,
                    "unknown_reason": report.unknown_reason.as_ref().map(ToString::to_string),
                    "votes": report.votes.iter().map(|vote| json!({
                        "frame": vote.frame_number,
                        "gender": vote.gender.label(),
                        "confidence": vote.confidence,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();

        json!({ "layout": layout, "videos": videos })
    }
}

/// Renders like a Python dict: `{'left_speaker.avi': 'Man', 'right_speaker.avi': 'Woman'}`.
impl Display for SpeakerLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("{")?;
        for (index, (name, report)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{name}': '{}'", report.verdict)?;
        }
        f.write_str("}")
    }
}
