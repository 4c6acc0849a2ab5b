//! Error types for the `stillframe` crate.
//!
//! This module defines [`StillframeError`], the unified error type returned
//! by every fallible operation in the crate. Errors carry enough context
//! (paths, frame numbers, upstream messages) to be shown to a user as-is.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `stillframe` operations.
///
/// End of stream is deliberately absent: running out of frames is the normal
/// way for playback to finish and is signalled by
/// [`FrameSource::read_next`](crate::FrameSource::read_next) returning `None`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StillframeError {
    /// The video could not be opened. Retrying with another path is fine.
    #[error("Failed to open video at {path}: {reason}")]
    OpenFailed {
        /// Path that was passed to [`FrameSource::open`](crate::FrameSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// An operation needed a loaded video but none is open.
    #[error("No video is loaded")]
    NotLoaded,

    /// The decode handle is held by playback and cannot be used for
    /// random-access extraction until playback stops.
    #[error("Video source is busy with playback; stop playback before extracting")]
    SourceBusy,

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    DecodeError(String),

    /// The video reports a frame rate that makes time arithmetic meaningless.
    #[error("Invalid frame rate: {0} (must be greater than zero)")]
    InvalidFrameRate(f64),

    /// A screenshot count of zero, or above
    /// [`MAX_SCREENSHOT_COUNT`](crate::extract::MAX_SCREENSHOT_COUNT), was requested.
    #[error("Screenshot count must be between 1 and {}", crate::extract::MAX_SCREENSHOT_COUNT)]
    InvalidCount,

    /// A range's start is not strictly before its end.
    #[error("Invalid range: start ({start:?}) must be less than end ({end:?})")]
    InvalidRange {
        /// The start of the range.
        start: Duration,
        /// The end of the range.
        end: Duration,
    },

    /// A range ends after the video does.
    #[error("Range end {end:?} exceeds video duration {duration:?}")]
    RangeExceedsDuration {
        /// The requested end of the range.
        end: Duration,
        /// The duration of the video.
        duration: Duration,
    },

    /// A single image could not be written.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while creating directories or files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl StillframeError {
    /// Returns `true` for errors caused by bad request parameters.
    ///
    /// These are always raised before any seek or write happens, so the
    /// caller can fix the input and retry with no cleanup.
    pub fn is_invalid_parameters(&self) -> bool {
        matches!(
            self,
            StillframeError::InvalidFrameRate(_)
                | StillframeError::InvalidCount
                | StillframeError::InvalidRange { .. }
                | StillframeError::RangeExceedsDuration { .. }
        )
    }
}

impl From<FfmpegError> for StillframeError {
    fn from(error: FfmpegError) -> Self {
        StillframeError::FfmpegError(error.to_string())
    }
}
