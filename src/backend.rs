//! Decode backend abstraction.
//!
//! A [`VideoBackend`] opens files into [`VideoDecoder`]s, the opaque decode
//! handles owned by a [`FrameSource`](crate::FrameSource). The crate ships
//! [`FfmpegBackend`](crate::FfmpegBackend); tests and embedders can plug in
//! their own.

use std::path::Path;

use crate::error::StillframeError;
use crate::frame::Frame;
use crate::metadata::VideoMetadata;

/// Opens decode handles.
pub trait VideoBackend: Send + Sync {
    /// Open `path` for decoding.
    ///
    /// # Errors
    ///
    /// Implementations return [`StillframeError::OpenFailed`] when the file
    /// cannot be opened or holds no decodable video.
    fn open(&self, path: &Path) -> Result<Box<dyn VideoDecoder>, StillframeError>;
}

/// One open video stream positioned at a frame index.
///
/// Dropping the decoder releases every backend resource it holds.
pub trait VideoDecoder: Send {
    /// Metadata read when the stream was opened.
    fn metadata(&self) -> &VideoMetadata;

    /// Decode the frame at the current position and advance by one.
    ///
    /// Returns `None` at end of stream. Decoders also return `None` when a
    /// read fails; callers treat both the same way.
    fn read_frame(&mut self) -> Option<&Frame>;

    /// Reposition so the next read returns `frame_index` or the nearest
    /// frame the backend can reach.
    fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError>;

    /// Index of the frame the next read will return, as the backend sees it.
    fn position(&self) -> u64;
}
