//! Player and extraction configuration.
//!
//! [`PlayerOptions`] holds the timing, batching, and naming settings of a
//! [`Player`](crate::Player). [`ExtractOptions`] threads progress callbacks
//! and cancellation tokens through range extraction without polluting every
//! function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use stillframe::{ImageFormat, PlayerOptions};
//!
//! let options = PlayerOptions::new()
//!     .with_screenshot_interval(Duration::from_millis(500))
//!     .with_batch_size(20)
//!     .with_image_format(ImageFormat::Png)
//!     .with_storage_root("/tmp/captures");
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::storage::ImageFormat;

/// Delay between playback iterations. Roughly a 30 fps display cadence.
pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_millis(33);
/// How long a paused loop sleeps before re-checking its state.
pub const DEFAULT_PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Minimum wall-clock gap between two interval captures.
pub const DEFAULT_SCREENSHOT_INTERVAL: Duration = Duration::from_millis(1000);
/// How often the drain task re-checks the queue.
pub const DEFAULT_DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Number of captured frames flushed per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Settings for a [`Player`](crate::Player).
///
/// All fields have defaults matching a desktop frame grabber: 33 ms pacing,
/// one capture per second, batches of ten.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub(crate) pacing_interval: Duration,
    pub(crate) pause_poll_interval: Duration,
    pub(crate) screenshot_interval: Duration,
    pub(crate) batch_size: usize,
    pub(crate) drain_poll_interval: Duration,
    pub(crate) capture_prefix: String,
    pub(crate) capture_folder: String,
    pub(crate) extract_prefix: String,
    pub(crate) extract_folder: String,
    pub(crate) image_format: ImageFormat,
    /// `None` means the user's pictures directory.
    pub(crate) storage_root: Option<PathBuf>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            pacing_interval: DEFAULT_PACING_INTERVAL,
            pause_poll_interval: DEFAULT_PAUSE_POLL_INTERVAL,
            screenshot_interval: DEFAULT_SCREENSHOT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            drain_poll_interval: DEFAULT_DRAIN_POLL_INTERVAL,
            capture_prefix: "Capture".to_string(),
            capture_folder: "Screenshots".to_string(),
            extract_prefix: "Screenshot".to_string(),
            extract_folder: "BatchScreenshots".to_string(),
            image_format: ImageFormat::default(),
            storage_root: None,
        }
    }

    /// Set the delay between playback iterations.
    ///
    /// This throttles how often frames reach the sink; it is not tied to
    /// the video's native frame rate.
    #[must_use]
    pub fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }

    /// Set how long a paused playback loop waits between state checks.
    #[must_use]
    pub fn with_pause_poll_interval(mut self, interval: Duration) -> Self {
        self.pause_poll_interval = interval;
        self
    }

    /// Set the minimum wall-clock time between two interval captures.
    #[must_use]
    pub fn with_screenshot_interval(mut self, interval: Duration) -> Self {
        self.screenshot_interval = interval;
        self
    }

    /// Set how many captured frames are flushed per batch.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set how often the drain task checks for a full batch.
    #[must_use]
    pub fn with_drain_poll_interval(mut self, interval: Duration) -> Self {
        self.drain_poll_interval = interval;
        self
    }

    /// Set the file name prefix for interval captures.
    #[must_use]
    pub fn with_capture_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.capture_prefix = prefix.into();
        self
    }

    /// Set the folder (under the storage root) for interval captures.
    #[must_use]
    pub fn with_capture_folder(mut self, folder: impl Into<String>) -> Self {
        self.capture_folder = folder.into();
        self
    }

    /// Set the file name prefix for range extraction.
    #[must_use]
    pub fn with_extract_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.extract_prefix = prefix.into();
        self
    }

    /// Set the folder (under the storage root) for range extraction.
    #[must_use]
    pub fn with_extract_folder(mut self, folder: impl Into<String>) -> Self {
        self.extract_folder = folder.into();
        self
    }

    /// Set the image format for written screenshots.
    #[must_use]
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Write screenshots under `root` instead of the pictures directory.
    #[must_use]
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = Some(root.into());
        self
    }

    /// The configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The configured capture interval.
    pub fn screenshot_interval(&self) -> Duration {
        self.screenshot_interval
    }
}

/// Progress and cancellation settings for range extraction.
///
/// A default-constructed value reports nowhere and never cancels.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with no progress callback and no cancellation.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Attach a progress callback, invoked after every attempted target.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, extraction stops before its next target
    /// and returns [`StillframeError::Cancelled`](crate::StillframeError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
