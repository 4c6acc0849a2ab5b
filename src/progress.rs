//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring long-running
//! operations, [`CancellationToken`] for cooperative cancellation, and
//! [`ProgressInfo`] for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillframe::{
//!     CancellationToken, ExtractOptions, Player, PlayerOptions, ProgressCallback,
//!     ProgressInfo, StillframeError,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let player = Player::ffmpeg(PlayerOptions::new());
//! player.load("input.mp4")?;
//! let options = ExtractOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(CancellationToken::new());
//! let summary = player.extract_evenly(10, None, None, &options)?;
//! println!("{} screenshots written", summary.saved);
//! # Ok::<(), StillframeError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Writing evenly spaced screenshots from a time range.
    RangeExtraction,
}

/// A snapshot of progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items have been attempted so far.
    pub current: u64,
    /// Total items requested, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The frame number most recently processed.
    pub current_frame: Option<u64>,
    /// The video timestamp most recently processed.
    pub current_timestamp: Option<Duration>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks may be
/// invoked from worker threads.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// operation. Use [`CancellationToken`] for cooperative cancellation.
///
/// During a [`Player`](crate::Player) extraction the callback runs while
/// the extraction holds the video. [`Player::metadata`](crate::Player::metadata),
/// [`Player::position`](crate::Player::position) and
/// [`Player::state`](crate::Player::state) answer immediately; methods that
/// use the decode handle (`load`, `seek`, `stop`, `extract*`) block until
/// the extraction returns and must not be called from here.
pub trait ProgressCallback: Send + Sync {
    /// Called after each unit of work.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. Used when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation. Extraction checks the token before each target frame.
///
/// # Example
///
/// ```
/// use stillframe::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one attempted item and report it.
    pub(crate) fn advance(&mut self, frame_number: Option<u64>, timestamp: Option<Duration>) {
        self.current += 1;
        self.report(frame_number, timestamp);
    }

    pub(crate) fn current(&self) -> u64 {
        self.current
    }

    fn report(&self, frame_number: Option<u64>, timestamp: Option<Duration>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.div_f64(self.current as f64).mul_f64(remaining as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_number,
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}
