//! Paced sequential playback.
//!
//! [`PlaybackLoop`] runs a background thread that reads the shared
//! [`FrameSource`], hands every frame to a [`FrameSink`], and offers it to
//! interval capture. Waits are condition-variable waits, so `stop`, `pause`
//! and `resume` take effect without waiting out a full pacing interval.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::capture::CaptureSession;
use crate::error::StillframeError;
use crate::frame::Frame;
use crate::source::FrameSource;

/// A frame source shared between playback and extraction.
pub type SharedSource = Arc<Mutex<FrameSource>>;

pub(crate) fn lock_source(source: &SharedSource) -> MutexGuard<'_, FrameSource> {
    source
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Where playback is in its lifecycle.
///
/// `Idle → Playing` on start, `Playing ↔ Paused` on toggle, anything
/// `→ Stopped` on stop or end of stream, `Stopped → Idle` when a new video
/// is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// A video is loaded (or nothing is) and playback has not started.
    Idle,
    /// Frames are being read and published.
    Playing,
    /// The loop is alive but not reading.
    Paused,
    /// Playback ended and the decode handle was released.
    Stopped,
}

/// Why playback stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source ran out of frames or a read failed.
    EndOfStream,
    /// [`PlaybackLoop::stop`] was called.
    Requested,
}

/// Receives decoded frames from the playback thread.
///
/// The frame is only borrowed: the loop overwrites the same buffer on the
/// next iteration, so copy anything that has to outlive the call. Callbacks
/// run without any internal lock held and may call back into the
/// [`Player`](crate::Player).
pub trait FrameSink: Send + Sync {
    /// Called once per displayed frame with its presentation time.
    fn on_frame(&self, frame: &Frame, position: Duration);

    /// Called once when playback stops.
    fn on_stopped(&self, _reason: StopReason) {}
}

struct LoopState {
    state: PlaybackState,
    extracting: bool,
    /// Bumped on every start. A worker only runs while this matches the
    /// value it was spawned with.
    generation: u64,
}

impl LoopState {
    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

struct Control {
    state: Mutex<LoopState>,
    signal: Condvar,
}

impl Control {
    fn lock(&self) -> MutexGuard<'_, LoopState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Timing for the playback thread.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Delay between iterations.
    pub frame_interval: Duration,
    /// Re-check period while paused.
    pub pause_poll_interval: Duration,
}

/// The playback state machine and its thread.
pub struct PlaybackLoop {
    control: Arc<Control>,
    source: SharedSource,
    capture: Arc<CaptureSession>,
    pacing: Pacing,
    worker: Mutex<Option<JoinHandle<()>>>,
    sink: Mutex<Option<Arc<dyn FrameSink>>>,
}

impl Debug for PlaybackLoop {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PlaybackLoop")
            .field("state", &self.state())
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

/// Holds playback off while a range extraction uses the source.
///
/// Released on drop.
pub struct ExclusiveAccess {
    control: Arc<Control>,
}

impl Drop for ExclusiveAccess {
    fn drop(&mut self) {
        self.control.lock().extracting = false;
    }
}

impl PlaybackLoop {
    /// Create an idle loop over `source`, offering frames to `capture`.
    pub fn new(source: SharedSource, capture: Arc<CaptureSession>, pacing: Pacing) -> Self {
        Self {
            control: Arc::new(Control {
                state: Mutex::new(LoopState {
                    state: PlaybackState::Idle,
                    extracting: false,
                    generation: 0,
                }),
                signal: Condvar::new(),
            }),
            source,
            capture,
            pacing,
            worker: Mutex::new(None),
            sink: Mutex::new(None),
        }
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.control.lock().state
    }

    /// Start playback from `Idle`.
    ///
    /// Does nothing when already playing or paused.
    ///
    /// # Errors
    ///
    /// - [`StillframeError::NotLoaded`] when stopped or nothing is open.
    /// - [`StillframeError::SourceBusy`] while a range extraction runs.
    pub fn start(&self, sink: Arc<dyn FrameSink>) -> Result<(), StillframeError> {
        let mut loop_state = self.control.lock();
        match loop_state.state {
            PlaybackState::Playing | PlaybackState::Paused => return Ok(()),
            PlaybackState::Stopped => return Err(StillframeError::NotLoaded),
            PlaybackState::Idle => {}
        }
        if loop_state.extracting {
            return Err(StillframeError::SourceBusy);
        }

        let frames_per_second = {
            let source = lock_source(&self.source);
            source
                .metadata()
                .ok_or(StillframeError::NotLoaded)?
                .require_frame_rate()?
        };

        // A thread that ended on its own may still need joining.
        if let Some(previous) = self.take_worker() {
            let _ = previous.join();
        }

        loop_state.state = PlaybackState::Playing;
        loop_state.generation += 1;
        let generation = loop_state.generation;
        drop(loop_state);

        *self
            .sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&sink));

        let worker = PlaybackWorker {
            control: Arc::clone(&self.control),
            source: Arc::clone(&self.source),
            capture: Arc::clone(&self.capture),
            sink,
            pacing: self.pacing,
            frames_per_second,
            generation,
        };
        let spawned = thread::Builder::new()
            .name("stillframe-playback".to_string())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                *self
                    .worker
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
                log::debug!("Playback started");
                Ok(())
            }
            Err(error) => {
                self.control.lock().state = PlaybackState::Idle;
                Err(StillframeError::IoError(error))
            }
        }
    }

    /// Pause while playing.
    pub fn pause(&self) {
        self.transition(PlaybackState::Playing, PlaybackState::Paused);
    }

    /// Resume while paused.
    pub fn resume(&self) {
        self.transition(PlaybackState::Paused, PlaybackState::Playing);
    }

    /// Flip between playing and paused. Ignored in any other state.
    pub fn toggle_pause(&self) {
        let mut loop_state = self.control.lock();
        loop_state.state = match loop_state.state {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
            other => other,
        };
        drop(loop_state);
        self.control.signal.notify_all();
    }

    fn transition(&self, from: PlaybackState, to: PlaybackState) {
        let mut loop_state = self.control.lock();
        if loop_state.state == from {
            loop_state.state = to;
            log::debug!("Playback {from:?} -> {to:?}");
        }
        drop(loop_state);
        self.control.signal.notify_all();
    }

    /// Stop playback, wait for the thread, and release the decode handle.
    ///
    /// Safe to call from inside a [`FrameSink`] callback; the thread then
    /// exits on its own right after the callback returns, even if the
    /// callback went on to load and start playback again.
    pub fn stop(&self) {
        let previous = {
            let mut loop_state = self.control.lock();
            std::mem::replace(&mut loop_state.state, PlaybackState::Stopped)
        };
        self.control.signal.notify_all();

        if let Some(handle) = self.take_worker() {
            if handle.thread().id() == thread::current().id() {
                log::debug!("Stop requested from the playback thread");
            } else {
                let _ = handle.join();
            }
        }

        lock_source(&self.source).release();

        let sink = self
            .sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if matches!(previous, PlaybackState::Playing | PlaybackState::Paused) {
            log::debug!("Playback stopped");
            if let Some(sink) = sink {
                sink.on_stopped(StopReason::Requested);
            }
        }
    }

    /// Return to `Idle` after a new video was opened.
    pub(crate) fn reset(&self) {
        self.control.lock().state = PlaybackState::Idle;
    }

    /// Reserve the source for a range extraction.
    ///
    /// # Errors
    ///
    /// [`StillframeError::SourceBusy`] while playing, paused, or when
    /// another extraction holds the reservation.
    pub fn exclusive_access(&self) -> Result<ExclusiveAccess, StillframeError> {
        let mut loop_state = self.control.lock();
        if loop_state.extracting
            || matches!(
                loop_state.state,
                PlaybackState::Playing | PlaybackState::Paused
            )
        {
            return Err(StillframeError::SourceBusy);
        }
        loop_state.extracting = true;
        Ok(ExclusiveAccess {
            control: Arc::clone(&self.control),
        })
    }

    fn take_worker(&self) -> Option<JoinHandle<()>> {
        self.worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl Drop for PlaybackLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PlaybackWorker {
    control: Arc<Control>,
    source: SharedSource,
    capture: Arc<CaptureSession>,
    sink: Arc<dyn FrameSink>,
    pacing: Pacing,
    frames_per_second: f64,
    generation: u64,
}

impl PlaybackWorker {
    fn is_playing(&self, loop_state: &LoopState) -> bool {
        loop_state.is_current(self.generation) && loop_state.state == PlaybackState::Playing
    }

    fn run(self) {
        let mut display = Frame::default();

        loop {
            {
                let mut loop_state = self.control.lock();
                while loop_state.is_current(self.generation)
                    && loop_state.state == PlaybackState::Paused
                {
                    loop_state = match self
                        .control
                        .signal
                        .wait_timeout(loop_state, self.pacing.pause_poll_interval)
                    {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    };
                }
                if !self.is_playing(&loop_state) {
                    return;
                }
            }

            {
                let mut source = lock_source(&self.source);
                match source.read_next() {
                    Some(frame) => display.clone_from(frame),
                    None => {
                        source.release();
                        drop(source);
                        self.finish();
                        return;
                    }
                }
            }

            let position =
                Duration::from_secs_f64(display.position_index() as f64 / self.frames_per_second);
            self.sink.on_frame(&display, position);
            self.capture.offer(&display, Instant::now());

            let loop_state = self.control.lock();
            let _ = self.control.signal.wait_timeout_while(
                loop_state,
                self.pacing.frame_interval,
                |loop_state| self.is_playing(loop_state),
            );
        }
    }

    /// End of stream: stop unless someone else already did.
    fn finish(&self) {
        let ended = {
            let mut loop_state = self.control.lock();
            if loop_state.is_current(self.generation)
                && matches!(
                    loop_state.state,
                    PlaybackState::Playing | PlaybackState::Paused
                )
            {
                loop_state.state = PlaybackState::Stopped;
                true
            } else {
                false
            }
        };
        if ended {
            log::debug!("Playback reached end of stream");
            self.sink.on_stopped(StopReason::EndOfStream);
        }
    }
}
