//! Interval capture: deciding which frames to keep and flushing them.
//!
//! [`CaptureTimer`] picks frames on the playback thread. [`CaptureSession`]
//! owns the [`ScreenshotQueue`] and the single background drain thread
//! that writes full batches through a [`StorageNamer`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::StillframeError;
use crate::frame::Frame;
use crate::queue::ScreenshotQueue;
use crate::storage::StorageNamer;

/// Wall-clock gate for interval capture.
///
/// A frame qualifies once at least `interval` has passed since the timer
/// was armed or since the previous qualifying frame. Seeking does not touch
/// the timer; only wall-clock time matters.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
///
/// use stillframe::CaptureTimer;
///
/// let start = Instant::now();
/// let mut timer = CaptureTimer::new(Duration::from_millis(100));
/// timer.arm(start);
/// assert!(!timer.should_capture(start + Duration::from_millis(50)));
/// assert!(timer.should_capture(start + Duration::from_millis(100)));
/// assert!(!timer.should_capture(start + Duration::from_millis(150)));
/// ```
#[derive(Debug, Clone)]
pub struct CaptureTimer {
    interval: Duration,
    last_capture: Option<Instant>,
}

impl CaptureTimer {
    /// Create a disarmed timer.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_capture: None,
        }
    }

    /// Start counting from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.last_capture = Some(now);
    }

    /// Stop selecting frames until re-armed.
    pub fn disarm(&mut self) {
        self.last_capture = None;
    }

    /// Returns `true` and restarts the interval if `now` is due.
    pub fn should_capture(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_capture else {
            return false;
        };
        if now.saturating_duration_since(last) >= self.interval {
            self.last_capture = Some(now);
            true
        } else {
            false
        }
    }
}

/// Receives the outcome of every frame the drain task writes.
///
/// Both methods run on the drain thread. Failures never stop the drain:
/// the rest of the batch is still written.
pub trait CaptureObserver: Send + Sync {
    /// A captured frame was written to `path`.
    fn on_saved(&self, _path: &Path, _sequence: u64) {}

    /// A captured frame could not be written.
    fn on_write_error(&self, _error: &StillframeError) {}
}

struct SilentObserver;

impl CaptureObserver for SilentObserver {}

/// Where and how the drain task writes.
#[derive(Debug, Clone)]
pub struct CaptureTarget {
    /// Namer that owns the root directory and image format.
    pub namer: StorageNamer,
    /// Video the frames came from; its file stem names the directory.
    pub video_path: PathBuf,
    /// Folder under the storage root.
    pub base_folder: String,
    /// File name prefix.
    pub prefix: String,
}

struct DrainState {
    enabled: bool,
    worker_alive: bool,
    target: Option<CaptureTarget>,
    timer: CaptureTimer,
}

struct Shared {
    state: Mutex<DrainState>,
    queue: Arc<ScreenshotQueue>,
    sequence: Arc<AtomicU64>,
    observer: Mutex<Arc<dyn CaptureObserver>>,
    batch_size: usize,
    poll_interval: Duration,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, DrainState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn observer(&self) -> Arc<dyn CaptureObserver> {
        self.observer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Capture mode: the queue, the timer, and the drain thread.
///
/// At most one drain thread exists at a time. Restarting capture while the
/// previous thread is still winding down reuses that thread.
pub struct CaptureSession {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureSession {
    /// Create an idle session.
    ///
    /// `sequence` numbers written files; share one counter between sessions
    /// to keep names increasing across restarts.
    pub fn new(
        queue: Arc<ScreenshotQueue>,
        sequence: Arc<AtomicU64>,
        interval: Duration,
        batch_size: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(DrainState {
                    enabled: false,
                    worker_alive: false,
                    target: None,
                    timer: CaptureTimer::new(interval),
                }),
                queue,
                sequence,
                observer: Mutex::new(Arc::new(SilentObserver)),
                batch_size: batch_size.max(1),
                poll_interval,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Route write outcomes to `observer`.
    pub fn set_observer(&self, observer: Arc<dyn CaptureObserver>) {
        *self
            .shared
            .observer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = observer;
    }

    /// Enable capture, arm the timer, and make sure a drain thread runs.
    pub fn start(&self, target: CaptureTarget) {
        let mut state = self.shared.state();
        state.enabled = true;
        state.target = Some(target);
        state.timer.arm(Instant::now());

        if state.worker_alive {
            log::debug!("Capture restarted; reusing the running drain thread");
            return;
        }
        state.worker_alive = true;
        drop(state);

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("stillframe-drain".to_string())
            .spawn(move || drain_loop(shared));

        match handle {
            Ok(handle) => {
                let previous = self
                    .worker
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .replace(handle);
                // A replaced handle belongs to a thread that already exited.
                if let Some(previous) = previous {
                    let _ = previous.join();
                }
                log::info!(
                    "Capture started (batch size {}, interval {:?})",
                    self.shared.batch_size,
                    self.shared.state().timer.interval
                );
            }
            Err(error) => {
                log::error!("Failed to spawn drain thread: {error}");
                let mut state = self.shared.state();
                state.worker_alive = false;
                state.enabled = false;
            }
        }
    }

    /// Disable capture and discard frames that never filled a batch.
    ///
    /// The drain thread finishes its current cycle and exits. Returns the
    /// number of discarded frames.
    pub fn stop(&self) -> usize {
        {
            let mut state = self.shared.state();
            if !state.enabled {
                return 0;
            }
            state.enabled = false;
            state.timer.disarm();
        }
        self.shared.queue.wake();
        let discarded = self.shared.queue.clear();
        log::info!("Capture stopped; discarded {discarded} buffered frames");
        discarded
    }

    /// Stop and wait for the drain thread to exit.
    pub fn shutdown(&self) {
        self.stop();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Whether capture mode is on.
    pub fn is_enabled(&self) -> bool {
        self.shared.state().enabled
    }

    /// Whether a drain thread is currently alive.
    pub fn is_draining(&self) -> bool {
        self.shared.state().worker_alive
    }

    /// Queue a copy of `frame` if capture is on and the interval elapsed.
    ///
    /// Called by the playback loop once per displayed frame.
    pub fn offer(&self, frame: &Frame, now: Instant) -> bool {
        if frame.is_empty() {
            return false;
        }
        let due = {
            let mut state = self.shared.state();
            state.enabled && state.timer.should_capture(now)
        };
        if due {
            self.shared.queue.enqueue(frame.clone());
        }
        due
    }

    /// The queue frames are buffered in.
    pub fn queue(&self) -> &Arc<ScreenshotQueue> {
        &self.shared.queue
    }

    /// The next sequence number a written frame will get.
    pub fn next_sequence(&self) -> u64 {
        self.shared.sequence.load(Ordering::SeqCst)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain_loop(shared: Arc<Shared>) {
    log::debug!("Drain thread started");
    loop {
        {
            let mut state = shared.state();
            if !state.enabled {
                state.worker_alive = false;
                break;
            }
        }

        let Some(batch) = shared
            .queue
            .wait_for_batch(shared.batch_size, shared.poll_interval)
        else {
            continue;
        };

        let target = shared.state().target.clone();
        match target {
            Some(target) => write_batch(&shared, &target, batch),
            None => log::warn!("Dropping a batch of {} frames with no capture target", batch.len()),
        }
    }
    log::debug!("Drain thread exiting");
}

fn write_batch(shared: &Shared, target: &CaptureTarget, batch: Vec<Frame>) {
    let observer = shared.observer();
    let directory = target
        .namer
        .directory_for(&target.video_path, &target.base_folder);

    let mut written = 0usize;
    let total = batch.len();
    for frame in batch {
        let sequence = shared.sequence.fetch_add(1, Ordering::SeqCst);
        let result = match &directory {
            Ok(directory) => target
                .namer
                .write(directory, &target.prefix, sequence, &frame),
            Err(error) => Err(StillframeError::WriteFailed {
                path: target
                    .namer
                    .root()
                    .join(&target.base_folder)
                    .join(target.namer.file_name(&target.prefix, sequence)),
                reason: error.to_string(),
            }),
        };
        match result {
            Ok(path) => {
                written += 1;
                observer.on_saved(&path, sequence);
            }
            Err(error) => {
                log::warn!("Capture write failed: {error}");
                observer.on_write_error(&error);
            }
        }
    }
    log::debug!("Flushed batch: {written}/{total} frames written");
}
