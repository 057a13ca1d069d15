//! Metadata validation tests.
//!
//! File-based tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

mod common;

use std::path::Path;
use std::time::Duration;

use common::metadata;
use speaker_gender::{VideoFile, validate_metadata};

#[test]
fn healthy_metadata_is_valid() {
    let report = validate_metadata(&metadata(30.0, 300));
    assert!(report.is_valid());
    assert!(report.warnings.is_empty());
    assert_eq!(report.info.len(), 1);
    assert!(report.info[0].contains("mjpeg"));
}

#[test]
fn zero_frame_rate_is_an_error() {
    let report = validate_metadata(&metadata(0.0, 300));
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("Frame rate")));
}

#[test]
fn zero_dimensions_are_an_error() {
    let mut zero = metadata(30.0, 300);
    zero.width = 0;
    let report = validate_metadata(&zero);
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("dimensions")));
}

#[test]
fn empty_stream_warns() {
    let report = validate_metadata(&metadata(30.0, 0));
    assert!(report.is_valid());
    assert!(report.warnings.iter().any(|w| w.contains("Frame count is zero")));
}

#[test]
fn short_clip_warns() {
    let report = validate_metadata(&metadata(30.0, 10));
    assert!(report.warnings.iter().any(|w| w.contains("shorter than one second")));
}

#[test]
fn unusual_frame_rates_warn() {
    assert!(!validate_metadata(&metadata(0.5, 20)).warnings.is_empty());
    assert!(!validate_metadata(&metadata(480.0, 4800)).warnings.is_empty());
}

#[test]
fn absurd_header_values_do_not_panic() {
    let mut absurd = metadata(30.0, u64::MAX);
    absurd.frames_per_second = f64::MIN_POSITIVE;
    assert_eq!(absurd.frame_duration(), Duration::ZERO);

    let report = validate_metadata(&absurd);
    assert!(report.is_valid());
}

#[test]
fn frame_duration_of_normal_clip() {
    assert_eq!(metadata(25.0, 50).frame_duration(), Duration::from_secs(2));
    assert_eq!(metadata(0.0, 50).frame_duration(), Duration::ZERO);
}

#[test]
fn display_tags_each_finding() {
    let text = validate_metadata(&metadata(0.0, 0)).to_string();
    assert!(text.contains("[INFO]"));
    assert!(text.contains("[ERROR]"));
}

#[test]
fn validate_fixture() {
    let path = "tests/fixtures/sample_video.avi";
    if !Path::new(path).exists() {
        return;
    }

    let video = VideoFile::open(path).expect("Failed to open fixture");
    let report = video.validate();
    assert!(report.is_valid(), "fixture should be valid: {report}");
    assert!(report.warnings.is_empty());
}
