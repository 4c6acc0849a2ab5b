//! Playback, capture, and extraction sharing one decode handle.

mod common;

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use stillframe::{
    CaptureObserver, ExtractOptions, Frame, FrameSink, PlaybackState, Player, ProgressCallback,
    ProgressInfo, StillframeError,
};

use common::{
    CLIP, LONG_CLIP, SyntheticBackend, fast_options, file_names, frame_index_of, wait_until,
};

#[derive(Default)]
struct CountingSink {
    frames: Mutex<u64>,
}

impl FrameSink for CountingSink {
    fn on_frame(&self, _frame: &Frame, _position: Duration) {
        *self.frames.lock().unwrap() += 1;
    }
}

impl CountingSink {
    fn count(&self) -> u64 {
        *self.frames.lock().unwrap()
    }
}

#[test]
fn extraction_is_refused_while_playing_or_paused() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let player = common::player(&SyntheticBackend::new(), fast_options(output.path()));
    player.load(LONG_CLIP).expect("Failed to load clip");

    let sink = Arc::new(CountingSink::default());
    player.play(sink.clone()).expect("Failed to play");
    assert!(wait_until(|| sink.count() > 0));

    let while_playing = player.extract_evenly(3, None, None, &ExtractOptions::new());
    assert!(matches!(while_playing, Err(StillframeError::SourceBusy)));

    player.pause();
    let while_paused = player.extract_evenly(3, None, None, &ExtractOptions::new());
    assert!(matches!(while_paused, Err(StillframeError::SourceBusy)));
    assert_eq!(player.state(), PlaybackState::Paused);

    assert!(!output.path().join("BatchScreenshots").exists());
    player.stop();
}

struct PlayDuringExtraction {
    player: Arc<Player>,
    outcomes: Mutex<Vec<Result<(), String>>>,
}

impl ProgressCallback for PlayDuringExtraction {
    fn on_progress(&self, _info: &ProgressInfo) {
        let outcome = self
            .player
            .play(Arc::new(CountingSink::default()))
            .map_err(|error| error.to_string());
        self.outcomes.lock().unwrap().push(outcome);
    }
}

#[test]
fn playback_is_refused_while_extracting() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let player = Arc::new(common::player(
        &SyntheticBackend::new(),
        fast_options(output.path()),
    ));
    player.load(CLIP).expect("Failed to load clip");

    let watcher = Arc::new(PlayDuringExtraction {
        player: Arc::clone(&player),
        outcomes: Mutex::new(Vec::new()),
    });
    let options = ExtractOptions::new().with_progress(watcher.clone());
    let summary = player
        .extract_evenly(4, None, None, &options)
        .expect("Failed to extract");
    assert_eq!(summary.saved, 4);

    let outcomes = watcher.outcomes.lock().unwrap().clone();
    assert_eq!(outcomes.len(), 4);
    assert!(
        outcomes.iter().all(|outcome| outcome.is_err()),
        "playback must not start mid-extraction: {outcomes:?}"
    );
    assert_eq!(player.state(), PlaybackState::Idle);

    // The reservation ends with the extraction.
    let sink = Arc::new(CountingSink::default());
    player.play(sink.clone()).expect("Play after extraction failed");
    assert!(wait_until(|| sink.count() > 0));
    player.stop();
}

struct QueryDuringExtraction {
    player: Arc<Player>,
    seen: Mutex<Vec<(Option<u64>, Option<u64>)>>,
}

impl ProgressCallback for QueryDuringExtraction {
    fn on_progress(&self, _info: &ProgressInfo) {
        let frame_count = self.player.metadata().map(|metadata| metadata.frame_count);
        let position = self.player.position();
        self.seen.lock().unwrap().push((frame_count, position));
    }
}

#[test]
fn progress_callback_can_query_the_player() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let player = Arc::new(common::player(
        &SyntheticBackend::new(),
        fast_options(output.path()),
    ));
    player.load(CLIP).expect("Failed to load clip");

    let watcher = Arc::new(QueryDuringExtraction {
        player: Arc::clone(&player),
        seen: Mutex::new(Vec::new()),
    });
    let options = ExtractOptions::new().with_progress(watcher.clone());
    player
        .extract_evenly(5, None, None, &options)
        .expect("Failed to extract");

    let seen = watcher.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            (Some(300), Some(1)),
            (Some(300), Some(61)),
            (Some(300), Some(121)),
            (Some(300), Some(181)),
            (Some(300), Some(241)),
        ]
    );
}

#[test]
fn extraction_keeps_the_video_loaded() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let player = common::player(&SyntheticBackend::new(), fast_options(output.path()));
    player.load(CLIP).expect("Failed to load clip");

    player
        .extract_evenly(2, None, None, &ExtractOptions::new())
        .expect("Failed to extract");
    assert_eq!(player.state(), PlaybackState::Idle);
    assert!(player.position().is_some());
}

#[test]
fn capture_runs_alongside_playback() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let options = fast_options(output.path())
        .with_screenshot_interval(Duration::ZERO)
        .with_batch_size(3);
    let player = common::player(&SyntheticBackend::new(), options);
    player.load(LONG_CLIP).expect("Failed to load clip");

    let sink = Arc::new(CountingSink::default());
    player.play(sink.clone()).expect("Failed to play");
    player.start_capture().expect("Failed to start capture");
    assert!(player.is_capturing());

    let directory = output.path().join("Screenshots").join("long_clip");
    assert!(wait_until(|| directory.exists() && file_names(&directory).len() >= 6));

    let discarded = player.stop_capture();
    assert!(discarded < 3, "only an incomplete batch is discarded");
    assert!(!player.is_capturing());
    assert_eq!(player.queued_captures(), 0);
    player.stop();
    // Dropping the player waits for the drain thread to finish its batch.
    drop(player);

    let names = file_names(&directory);
    assert!(names.iter().all(|name| name.starts_with("Capture_")));
    assert_eq!(names.len() % 3, 0, "batches are written whole: {names:?}");
}

#[test]
fn capture_needs_a_loaded_video() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let player = common::player(&SyntheticBackend::new(), fast_options(output.path()));
    assert!(matches!(
        player.start_capture(),
        Err(StillframeError::NotLoaded)
    ));
}

#[derive(Default)]
struct SaveTimes {
    saved: Mutex<Vec<(PathBuf, Instant)>>,
}

impl CaptureObserver for SaveTimes {
    fn on_saved(&self, path: &Path, _sequence: u64) {
        self.saved
            .lock()
            .unwrap()
            .push((path.to_path_buf(), Instant::now()));
    }
}

#[test]
fn seeking_while_capturing_keeps_the_capture_clock() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let options = fast_options(output.path())
        .with_screenshot_interval(Duration::from_millis(300))
        .with_batch_size(1);
    let player = common::player(&SyntheticBackend::new(), options);
    player.load(LONG_CLIP).expect("Failed to load clip");

    let observer = Arc::new(SaveTimes::default());
    player.set_capture_observer(observer.clone());
    player
        .play(Arc::new(CountingSink::default()))
        .expect("Failed to play");
    player.start_capture().expect("Failed to start capture");
    let started = Instant::now();

    thread::sleep(Duration::from_millis(200));
    let before_seek = player.position().expect("Video is open");
    assert_eq!(player.seek(0).expect("Failed to seek"), 0);

    assert!(wait_until(|| !observer.saved.lock().unwrap().is_empty()));
    let (path, saved_at) = observer.saved.lock().unwrap()[0].clone();
    assert!(
        saved_at.duration_since(started) < Duration::from_millis(450),
        "first capture came {:?} after start",
        saved_at.duration_since(started)
    );
    assert!(frame_index_of(&path) < before_seek);

    player.stop();
}
