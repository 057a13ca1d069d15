//! Speaker layout rendering tests.

use std::path::PathBuf;

use speaker_gender::{
    AnalysisReport, DEFAULT_VIDEO_DIRECTORY, DEFAULT_VIDEOS, FrameVote, Gender, GenderVerdict,
    SpeakerLayout, UnknownReason,
};

fn known(gender: Gender, frames: &[u64]) -> AnalysisReport {
    AnalysisReport {
        path: Some(PathBuf::from("split_videos/clip.avi")),
        verdict: GenderVerdict::Known(gender),
        votes: frames
            .iter()
            .map(|&frame_number| FrameVote {
                frame_number,
                gender,
                confidence: 0.9,
            })
            .collect(),
        planned_samples: frames.len(),
        attempted_samples: frames.len(),
        failed_samples: 0,
        unknown_reason: None,
    }
}

fn missing() -> AnalysisReport {
    AnalysisReport {
        path: None,
        verdict: GenderVerdict::Unknown,
        votes: Vec::new(),
        planned_samples: 0,
        attempted_samples: 0,
        failed_samples: 0,
        unknown_reason: Some(UnknownReason::FileNotFound),
    }
}

#[test]
fn defaults_name_the_speaker_pair() {
    assert_eq!(DEFAULT_VIDEO_DIRECTORY, "split_videos");
    assert_eq!(DEFAULT_VIDEOS, ["left_speaker.avi", "right_speaker.avi"]);
}

#[test]
fn display_looks_like_a_mapping() {
    let mut layout = SpeakerLayout::new();
    layout.insert("left_speaker.avi", known(Gender::Man, &[0, 30]));
    layout.insert("right_speaker.avi", known(Gender::Woman, &[0]));

    assert_eq!(
        layout.to_string(),
        "{'left_speaker.avi': 'Man', 'right_speaker.avi': 'Woman'}"
    );
}

#[test]
fn empty_layout_displays_braces() {
    assert_eq!(SpeakerLayout::new().to_string(), "{}");
    assert!(SpeakerLayout::new().is_empty());
}

#[test]
fn insertion_order_is_kept() {
    let mut layout = SpeakerLayout::new();
    layout.insert("b.avi", missing());
    layout.insert("a.avi", known(Gender::Man, &[0]));

    let verdicts = layout.verdicts();
    assert_eq!(
        verdicts,
        vec![
            ("b.avi", GenderVerdict::Unknown),
            ("a.avi", GenderVerdict::Known(Gender::Man)),
        ]
    );
}

#[test]
fn reinsert_replaces_in_place() {
    let mut layout = SpeakerLayout::new();
    layout.insert("left.avi", missing());
    layout.insert("right.avi", missing());
    layout.insert("left.avi", known(Gender::Woman, &[0]));

    assert_eq!(layout.len(), 2);
    assert_eq!(layout.to_string(), "{'left.avi': 'Woman', 'right.avi': 'Unknown'}");
}

#[test]
fn json_carries_layout_and_details() {
    let mut layout = SpeakerLayout::new();
    layout.insert("right_speaker.avi", known(Gender::Woman, &[0, 30, 60]));
    layout.insert("left_speaker.avi", missing());

    let json = layout.to_json();

    let names: Vec<&String> = json["layout"].as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["right_speaker.avi", "left_speaker.avi"]);
    assert_eq!(json["layout"]["right_speaker.avi"], "Woman");
    assert_eq!(json["layout"]["left_speaker.avi"], "Unknown");

    let videos = json["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0]["attempted_samples"], 3);
    assert_eq!(videos[0]["votes"].as_array().unwrap().len(), 3);
    assert_eq!(videos[0]["votes"][2]["frame"], 60);
    assert_eq!(videos[0]["unknown_reason"], serde_json::Value::Null);
    assert_eq!(videos[1]["unknown_reason"], "file not found");
    assert_eq!(videos[1]["path"], serde_json::Value::Null);
}
