//! Core [`Player`] implementation.
//!
//! `Player` is the entry point a presentation layer talks to. It owns the
//! shared [`FrameSource`], the [`PlaybackLoop`], interval capture, and the
//! [`StorageNamer`], and makes sure playback and range extraction never use
//! the decode handle at the same time.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::VideoBackend;
use crate::capture::{CaptureObserver, CaptureSession, CaptureTarget};
use crate::configuration::{ExtractOptions, PlayerOptions};
use crate::decoder::FfmpegBackend;
use crate::error::StillframeError;
use crate::extract::{CaptureRequest, ExtractionSummary, RangeExtractor};
use crate::metadata::VideoMetadata;
use crate::playback::{FrameSink, Pacing, PlaybackLoop, PlaybackState, SharedSource, lock_source};
use crate::queue::ScreenshotQueue;
use crate::source::{FrameSource, SourceStatus};
use crate::storage::StorageNamer;

/// Plays a video, captures frames at intervals, and extracts evenly
/// spaced screenshots.
///
/// Every method takes `&self`, so a `Player` can sit in an [`Arc`] and be
/// driven from UI callbacks, including from inside a [`FrameSink`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use stillframe::{ExtractOptions, Frame, FrameSink, Player, PlayerOptions};
///
/// struct PrintPosition;
///
/// impl FrameSink for PrintPosition {
///     fn on_frame(&self, frame: &Frame, position: Duration) {
///         println!("frame {} at {position:?}", frame.position_index());
///     }
/// }
///
/// let player = Player::ffmpeg(PlayerOptions::new());
/// player.load("input.mp4")?;
/// player.play(Arc::new(PrintPosition))?;
/// player.start_capture()?;
/// std::thread::sleep(Duration::from_secs(5));
/// player.stop_capture();
/// player.stop();
///
/// player.load("input.mp4")?;
/// let summary = player.extract_evenly(10, None, None, &ExtractOptions::new())?;
/// println!("{} screenshots in {}", summary.saved, summary.directory.display());
/// # Ok::<(), stillframe::StillframeError>(())
/// ```
pub struct Player {
    options: PlayerOptions,
    namer: StorageNamer,
    source: SharedSource,
    status: Arc<SourceStatus>,
    capture: Arc<CaptureSession>,
    playback: PlaybackLoop,
}

impl Debug for Player {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Player")
            .field("options", &self.options)
            .field("state", &self.state())
            .field("storage", &self.namer)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Create a player that opens videos through `backend`.
    pub fn new(backend: Arc<dyn VideoBackend>, options: PlayerOptions) -> Self {
        let namer = match &options.storage_root {
            Some(root) => StorageNamer::new(root.clone(), options.image_format),
            None => StorageNamer::pictures(options.image_format),
        };
        let source = FrameSource::new(backend);
        let status = source.status();
        let source: SharedSource = Arc::new(Mutex::new(source));
        let capture = Arc::new(CaptureSession::new(
            Arc::new(ScreenshotQueue::new()),
            Arc::new(AtomicU64::new(0)),
            options.screenshot_interval,
            options.batch_size,
            options.drain_poll_interval,
        ));
        let playback = PlaybackLoop::new(
            Arc::clone(&source),
            Arc::clone(&capture),
            Pacing {
                frame_interval: options.pacing_interval,
                pause_poll_interval: options.pause_poll_interval,
            },
        );

        Self {
            options,
            namer,
            source,
            status,
            capture,
            playback,
        }
    }

    /// Create a player backed by FFmpeg.
    pub fn ffmpeg(options: PlayerOptions) -> Self {
        Self::new(Arc::new(FfmpegBackend), options)
    }

    /// Stop anything in progress and open `path`, leaving playback `Idle`.
    ///
    /// The previous decode handle is always released first, also when the
    /// new file fails to open.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::OpenFailed`] if the video cannot be opened.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<VideoMetadata, StillframeError> {
        let path = path.as_ref();
        self.capture.stop();
        self.playback.stop();

        let metadata = lock_source(&self.source).open(path)?;
        self.playback.reset();
        log::info!(
            "Loaded {} ({}x{}, {:.3} fps, {} frames)",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count
        );
        Ok(metadata)
    }

    /// Metadata of the open video, if any.
    ///
    /// Does not wait for playback or an extraction in progress.
    pub fn metadata(&self) -> Option<VideoMetadata> {
        self.status.metadata()
    }

    /// Playback duration of the open video.
    pub fn duration(&self) -> Option<Duration> {
        self.metadata().and_then(|metadata| metadata.duration().ok())
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Index of the next frame playback reads.
    pub fn position(&self) -> Option<u64> {
        self.status.position()
    }

    /// Start playback, delivering frames to `sink`.
    ///
    /// See [`PlaybackLoop::start`] for the error cases.
    pub fn play(&self, sink: Arc<dyn FrameSink>) -> Result<(), StillframeError> {
        self.playback.start(sink)
    }

    /// Pause while playing.
    pub fn pause(&self) {
        self.playback.pause();
    }

    /// Resume while paused.
    pub fn resume(&self) {
        self.playback.resume();
    }

    /// Flip between playing and paused.
    pub fn toggle_pause(&self) {
        self.playback.toggle_pause();
    }

    /// Stop playback and release the decode handle.
    ///
    /// Load a video again before playing or extracting.
    pub fn stop(&self) {
        self.playback.stop();
    }

    /// Jump to `frame_index`, e.g. from a scrub bar. Works while playing;
    /// interval capture timing is not affected.
    ///
    /// Returns the position the backend reports after the jump.
    pub fn seek(&self, frame_index: u64) -> Result<u64, StillframeError> {
        lock_source(&self.source).seek(frame_index)
    }

    /// Turn on interval capture for the open video.
    ///
    /// Frames are written under
    /// `<root>/<capture folder>/<video stem>/<capture prefix>_<n>.<ext>`.
    ///
    /// # Errors
    ///
    /// [`StillframeError::NotLoaded`] when no video is open.
    pub fn start_capture(&self) -> Result<(), StillframeError> {
        let video_path = lock_source(&self.source)
            .path()
            .map(Path::to_path_buf)
            .ok_or(StillframeError::NotLoaded)?;

        self.capture.start(CaptureTarget {
            namer: self.namer.clone(),
            video_path,
            base_folder: self.options.capture_folder.clone(),
            prefix: self.options.capture_prefix.clone(),
        });
        Ok(())
    }

    /// Turn off interval capture. Returns how many buffered frames were
    /// discarded because they never filled a batch.
    pub fn stop_capture(&self) -> usize {
        self.capture.stop()
    }

    /// Whether interval capture is on.
    pub fn is_capturing(&self) -> bool {
        self.capture.is_enabled()
    }

    /// Frames captured but not yet flushed.
    pub fn queued_captures(&self) -> usize {
        self.capture.queue().len()
    }

    /// Route capture write outcomes to `observer`.
    pub fn set_capture_observer(&self, observer: Arc<dyn CaptureObserver>) {
        self.capture.set_observer(observer);
    }

    /// The namer used for all output.
    pub fn storage(&self) -> &StorageNamer {
        &self.namer
    }

    /// Run a range extraction against the open video.
    ///
    /// # Errors
    ///
    /// - [`StillframeError::SourceBusy`] while playing or paused.
    /// - Anything [`RangeExtractor::extract`] returns.
    pub fn extract(
        &self,
        request: &CaptureRequest,
        options: &ExtractOptions,
    ) -> Result<ExtractionSummary, StillframeError> {
        let _access = self.playback.exclusive_access()?;
        let mut source = lock_source(&self.source);
        RangeExtractor::new(&mut source, &self.namer).extract(request, options)
    }

    /// Extract `count` evenly spaced screenshots into the default folder
    /// (`<root>/<extract folder>/<video stem>`).
    ///
    /// `start` and `end` default to the whole video. Parameters are
    /// validated before the output directory is created.
    pub fn extract_evenly(
        &self,
        count: u32,
        start: Option<Duration>,
        end: Option<Duration>,
        options: &ExtractOptions,
    ) -> Result<ExtractionSummary, StillframeError> {
        let _access = self.playback.exclusive_access()?;
        let mut source = lock_source(&self.source);
        let metadata = source.metadata().ok_or(StillframeError::NotLoaded)?.clone();

        let directory = self
            .namer
            .directory_path(&metadata.path, &self.options.extract_folder);
        let request = CaptureRequest::new(count, directory)
            .with_start(start)
            .with_end(end)
            .with_prefix(self.options.extract_prefix.clone());
        request.validate(&metadata)?;

        RangeExtractor::new(&mut source, &self.namer).extract(&request, options)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.capture.shutdown();
        self.playback.stop();
    }
}
