//! FFmpeg backend tests against a real file.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and return early when they are missing.

use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use stillframe::{
    ExtractOptions, FfmpegBackend, FfmpegLogLevel, Frame, FrameSink, FrameSource, PlaybackState,
    Player, PlayerOptions, StopReason,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn quiet() {
    stillframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
}

#[test]
fn metadata_matches_the_fixture() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }
    quiet();

    let player = Player::ffmpeg(PlayerOptions::new());
    let metadata = player.load(path).expect("Failed to load fixture");
    assert_eq!((metadata.width, metadata.height), (320, 240));
    assert!((metadata.frames_per_second - 30.0).abs() < 0.01);
    assert_eq!(metadata.frame_count, 300);
    let duration = metadata.duration().expect("Positive frame rate");
    assert!((duration.as_secs_f64() - 10.0).abs() < 0.05);
}

#[test]
fn sequential_reads_advance_one_frame_at_a_time() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }
    quiet();

    let mut source = FrameSource::new(Arc::new(FfmpegBackend));
    source.open(path).expect("Failed to open fixture");
    for expected in 0..5 {
        let frame = source.read_next().expect("Frame should decode");
        assert_eq!(frame.position_index(), expected);
        assert_eq!(frame.data().len(), 320 * 240 * 3);
    }
}

#[test]
fn seek_lands_on_the_requested_frame() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }
    quiet();

    let mut source = FrameSource::new(Arc::new(FfmpegBackend));
    source.open(path).expect("Failed to open fixture");
    let landed = source.seek(150).expect("Failed to seek");
    assert_eq!(landed, 150);
    let frame = source.read_next().expect("Frame should decode");
    assert_eq!(frame.position_index(), 150);
}

#[test]
fn reading_past_the_end_returns_none() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }
    quiet();

    let mut source = FrameSource::new(Arc::new(FfmpegBackend));
    source.open(path).expect("Failed to open fixture");
    source.seek(299).expect("Failed to seek");
    assert!(source.read_next().is_some());
    assert!(source.read_next().is_none());
}

#[test]
fn evenly_spaced_screenshots_from_a_real_file() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }
    quiet();

    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let player = Player::ffmpeg(PlayerOptions::new().with_storage_root(output.path()));
    player.load(path).expect("Failed to load fixture");

    let summary = player
        .extract_evenly(
            4,
            Some(Duration::from_secs(8)),
            Some(Duration::from_secs(10)),
            &ExtractOptions::new(),
        )
        .expect("Failed to extract");

    assert_eq!(summary.saved, 4);
    let directory = output.path().join("BatchScreenshots").join("sample_video");
    for ordinal in 1..=4 {
        let image = image::open(directory.join(format!("Screenshot_{ordinal}.png")))
            .expect("Screenshot should be a readable image");
        assert_eq!((image.width(), image.height()), (320, 240));
    }
}

#[derive(Default)]
struct LastFrame {
    index: Mutex<Option<u64>>,
    stopped: Mutex<Option<StopReason>>,
}

impl FrameSink for LastFrame {
    fn on_frame(&self, frame: &Frame, _position: Duration) {
        *self.index.lock().unwrap() = Some(frame.position_index());
    }

    fn on_stopped(&self, reason: StopReason) {
        *self.stopped.lock().unwrap() = Some(reason);
    }
}

#[test]
fn playback_reaches_end_of_stream() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }
    quiet();

    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let player = Player::ffmpeg(
        PlayerOptions::new()
            .with_storage_root(output.path())
            .with_pacing_interval(Duration::ZERO),
    );
    player.load(path).expect("Failed to load fixture");
    player.seek(290).expect("Failed to seek");

    let sink = Arc::new(LastFrame::default());
    player.play(sink.clone()).expect("Failed to play");

    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while sink.stopped.lock().unwrap().is_none() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(*sink.stopped.lock().unwrap(), Some(StopReason::EndOfStream));
    assert_eq!(*sink.index.lock().unwrap(), Some(299));
    assert_eq!(player.state(), PlaybackState::Stopped);
}
