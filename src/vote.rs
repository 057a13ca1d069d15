//! Majority voting over per-frame labels.
//!
//! Per-frame classifications are noisy; [`GenderTally`] counts them and
//! [`GenderVerdict`] is the outcome, with [`GenderVerdict::Unknown`] standing
//! in when no frame produced a usable label.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::classifier::Gender;

/// Aggregate result for one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenderVerdict {
    /// The most frequent label across successful samples.
    Known(Gender),
    /// No sampled frame yielded a usable classification.
    Unknown,
}

impl GenderVerdict {
    /// The label, if known.
    pub fn gender(self) -> Option<Gender> {
        match self {
            GenderVerdict::Known(gender) => Some(gender),
            GenderVerdict::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, GenderVerdict::Unknown)
    }

    /// Display label: `"Man"`, `"Woman"` or `"Unknown"`.
    pub fn label(self) -> &'static str {
        match self {
            GenderVerdict::Known(gender) => gender.label(),
            GenderVerdict::Unknown => "Unknown",
        }
    }
}

impl Display for GenderVerdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

impl From<Option<Gender>> for GenderVerdict {
    fn from(value: Option<Gender>) -> Self {
        value.map_or(GenderVerdict::Unknown, GenderVerdict::Known)
    }
}

/// Vote counter for one video.
///
/// Labels are kept in the order they first received a vote. On a tie the
/// label seen first wins.
///
/// ```
/// use speaker_gender::{Gender, GenderTally, GenderVerdict};
///
/// let mut tally = GenderTally::new();
/// for gender in [Gender::Man, Gender::Man, Gender::Woman] {
///     tally.record(gender);
/// }
/// assert_eq!(tally.verdict(), GenderVerdict::Known(Gender::Man));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenderTally {
    counts: Vec<(Gender, u64)>,
    failures: u64,
}

impl GenderTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one vote for `gender`.
    pub fn record(&mut self, gender: Gender) {
        match self.counts.iter_mut().find(|(label, _)| *label == gender) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((gender, 1)),
        }
    }

    /// Count a sample that produced no vote.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Votes received by `gender`.
    pub fn votes_for(&self, gender: Gender) -> u64 {
        self.counts
            .iter()
            .find(|(label, _)| *label == gender)
            .map_or(0, |(_, count)| *count)
    }

    /// Total votes across all labels.
    pub fn total_votes(&self) -> u64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    /// Samples that produced no vote.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// The label with the most votes and its count.
    pub fn most_common(&self) -> Option<(Gender, u64)> {
        // `max_by_key` keeps the last maximum; fold to keep the first instead.
        self.counts.iter().fold(None, |best, &(label, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((label, count)),
        })
    }

    pub fn verdict(&self) -> GenderVerdict {
        self.most_common().map(|(gender, _)| gender).into()
    }
}

impl Extend<Gender> for GenderTally {
    fn extend<I: IntoIterator<Item = Gender>>(&mut self, iter: I) {
        for gender in iter {
            self.record(gender);
        }
    }
}

impl FromIterator<Gender> for GenderTally {
    fn from_iter<I: IntoIterator<Item = Gender>>(iter: I) -> Self {
        let mut tally = Self::new();
        tally.extend(iter);
        tally
    }
}
