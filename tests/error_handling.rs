//! Error handling tests.

use std::path::Path;

use speaker_gender::{ClassifierOptions, GenderError, OnnxGenderClassifier, VideoFile};

#[test]
fn open_nonexistent_file() {
    let result = VideoFile::open("nonexistent_file.avi");
    assert!(matches!(result, Err(GenderError::FileOpen { .. })));
}

#[test]
fn open_garbage_file() {
    let file = tempfile::Builder::new().suffix(".avi").tempfile().unwrap();
    std::fs::write(file.path(), [0u8; 64]).unwrap();

    assert!(VideoFile::open(file.path()).is_err());
}

#[test]
fn open_audio_only_file() {
    let path = "tests/fixtures/sample_audio_only.wav";
    if !Path::new(path).exists() {
        return;
    }

    assert!(matches!(VideoFile::open(path), Err(GenderError::NoVideoStream)));
}

#[test]
fn missing_model_fails_to_load() {
    let result = OnnxGenderClassifier::load(ClassifierOptions::new("no/such/model.onnx"));
    match result {
        Err(GenderError::ModelLoad { path, .. }) => {
            assert_eq!(path, Path::new("no/such/model.onnx"));
        }
        Err(other) => panic!("expected ModelLoad, got {other}"),
        Ok(_) => panic!("expected ModelLoad, got a classifier"),
    }
}

#[test]
fn error_messages() {
    let open = GenderError::FileOpen {
        path: "clip.avi".into(),
        reason: "No such file or directory".to_string(),
    };
    assert!(open.to_string().contains("clip.avi"));

    assert_eq!(
        GenderError::FrameRateUnavailable.to_string(),
        "Could not read a frame rate for the video stream"
    );
    assert_eq!(GenderError::Cancelled.to_string(), "Operation cancelled");
    assert_eq!(GenderError::NoFaceDetected.to_string(), "No face detected in frame");
    assert!(
        GenderError::UnexpectedOutput("expected 2 class scores, got 3".to_string())
            .to_string()
            .contains("got 3")
    );
}

#[test]
fn io_errors_convert() {
    let error: GenderError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, GenderError::IoError(_)));
}
