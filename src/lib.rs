//! # stillframe
//!
//! Capture still frames from video, either while it plays or at evenly
//! spaced timestamps, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Play and capture every second
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use stillframe::{Frame, FrameSink, Player, PlayerOptions};
//!
//! struct Discard;
//!
//! impl FrameSink for Discard {
//!     fn on_frame(&self, _frame: &Frame, _position: Duration) {}
//! }
//!
//! let player = Player::ffmpeg(
//!     PlayerOptions::new().with_screenshot_interval(Duration::from_secs(1)),
//! );
//! player.load("input.mp4")?;
//! player.play(Arc::new(Discard))?;
//! player.start_capture()?;
//! std::thread::sleep(Duration::from_secs(30));
//! player.stop();
//! # Ok::<(), stillframe::StillframeError>(())
//! ```
//!
//! ### Evenly spaced screenshots
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use stillframe::{ExtractOptions, Player, PlayerOptions};
//!
//! let player = Player::ffmpeg(PlayerOptions::new().with_storage_root("/tmp/shots"));
//! player.load("input.mp4")?;
//! let summary = player.extract_evenly(
//!     4,
//!     Some(Duration::from_secs(8)),
//!     Some(Duration::from_secs(10)),
//!     &ExtractOptions::new(),
//! )?;
//! assert!(summary.saved <= 4);
//! # Ok::<(), stillframe::StillframeError>(())
//! ```
//!
//! ## Features
//!
//! - **Paced playback** with pause, resume, stop and seek, delivering frames
//!   to a [`FrameSink`]
//! - **Interval capture** buffered in a [`ScreenshotQueue`] and flushed in
//!   batches by one background drain thread
//! - **Range extraction** of `N` evenly spaced screenshots between two
//!   timestamps, with progress and cancellation
//! - **Pluggable decoding** through [`VideoBackend`], with FFmpeg as the
//!   default
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`extract_async`] runs range extraction on Tokio's blocking pool |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod backend;
pub mod capture;
pub mod configuration;
pub mod decoder;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod frame;
#[cfg(feature = "async")]
pub mod future;
pub mod metadata;
pub mod playback;
pub mod player;
pub mod progress;
pub mod queue;
pub mod source;
pub mod storage;
pub mod utilities;

pub use backend::{VideoBackend, VideoDecoder};
pub use capture::{CaptureObserver, CaptureSession, CaptureTarget, CaptureTimer};
pub use configuration::{ExtractOptions, PlayerOptions};
pub use decoder::FfmpegBackend;
pub use error::StillframeError;
pub use extract::{
    CaptureRequest, ExtractionSummary, MAX_SCREENSHOT_COUNT, RangeExtractor, TargetFrame,
};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::Frame;
#[cfg(feature = "async")]
pub use future::{ExtractionFuture, extract_async};
pub use metadata::VideoMetadata;
pub use playback::{
    ExclusiveAccess, FrameSink, Pacing, PlaybackLoop, PlaybackState, SharedSource, StopReason,
};
pub use player::Player;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use queue::ScreenshotQueue;
pub use source::{FrameSource, SourceStatus};
pub use storage::{ImageFormat, StorageNamer};
