//! Error handling integration tests.
//!
//! These verify that meaningful errors come back from the FFmpeg backend
//! and the player for the usual failure conditions.

use std::path::Path;

use stillframe::{FrameSource, Player, PlayerOptions, StillframeError};

#[test]
fn open_nonexistent_file() {
    let player = Player::ffmpeg(PlayerOptions::new());
    let result = player.load("this_file_does_not_exist.mp4");

    let error = result.unwrap_err();
    assert!(matches!(error, StillframeError::OpenFailed { .. }));
    let error_message = error.to_string();
    assert!(
        error_message.contains("Failed to open video"),
        "Error message should mention open failure: {error_message}",
    );
    assert!(error_message.contains("this_file_does_not_exist.mp4"));
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    let mut source = FrameSource::new(std::sync::Arc::new(stillframe::FfmpegBackend));
    let result = source.open(&invalid_file_path);
    assert!(matches!(result, Err(StillframeError::OpenFailed { .. })));
    assert!(!source.is_open());
}

#[test]
fn no_video_stream_error() {
    let path = "tests/fixtures/sample_audio_only.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let player = Player::ffmpeg(PlayerOptions::new());
    let result = player.load(path);
    assert!(result.is_err(), "Audio-only files cannot be played");
}

#[test]
fn invalid_parameter_classification() {
    assert!(StillframeError::InvalidCount.is_invalid_parameters());
    assert!(StillframeError::InvalidFrameRate(0.0).is_invalid_parameters());
    assert!(!StillframeError::SourceBusy.is_invalid_parameters());
    assert!(!StillframeError::NotLoaded.is_invalid_parameters());
}

#[test]
fn source_busy_message_explains_the_fix() {
    let message = StillframeError::SourceBusy.to_string();
    assert!(message.contains("stop playback"), "{message}");
}
