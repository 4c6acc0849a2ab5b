//! Exclusive owner of one decode handle.
//!
//! [`FrameSource`] is a slot that holds at most one open
//! [`VideoDecoder`](crate::VideoDecoder). Opening a new file always closes
//! the previous one first, and every stop path ends in
//! [`release`](FrameSource::release).

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::{VideoBackend, VideoDecoder};
use crate::error::StillframeError;
use crate::frame::Frame;
use crate::metadata::VideoMetadata;

/// Sequential and random-access frame reader over a single video.
///
/// # Example
///
/// ```no_run
/// use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
///
/// use stillframe::{FfmpegBackend, FrameSource};
///
/// let mut source = FrameSource::new(Arc::new(FfmpegBackend));
/// source.open("input.mp4")?;
/// source.seek(120)?;
/// if let Some(frame) = source.read_next() {
///     println!("read frame {}", frame.position_index());
/// }
/// source.release();
/// # Ok::<(), stillframe::StillframeError>(())
/// ```
pub struct FrameSource {
    backend: Arc<dyn VideoBackend>,
    decoder: Option<Box<dyn VideoDecoder>>,
    status: Arc<SourceStatus>,
}

/// What a [`FrameSource`] has open, readable without locking the source.
///
/// Updated by the source after every open, read, seek and release. Lets
/// progress callbacks and UI code query the video while an extraction or
/// the playback thread holds the source.
#[derive(Debug, Default)]
pub struct SourceStatus {
    metadata: Mutex<Option<VideoMetadata>>,
    position: AtomicU64,
}

impl SourceStatus {
    /// Metadata of the open video.
    pub fn metadata(&self) -> Option<VideoMetadata> {
        self.slot().clone()
    }

    /// Index the next read returns, or `None` when nothing is open.
    pub fn position(&self) -> Option<u64> {
        let slot = self.slot();
        slot.as_ref().map(|_| self.position.load(Ordering::SeqCst))
    }

    fn slot(&self) -> MutexGuard<'_, Option<VideoMetadata>> {
        self.metadata
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish_open(&self, metadata: VideoMetadata, position: u64) {
        let mut slot = self.slot();
        self.position.store(position, Ordering::SeqCst);
        *slot = Some(metadata);
    }

    fn publish_position(&self, position: u64) {
        self.position.store(position, Ordering::SeqCst);
    }

    fn publish_release(&self) {
        *self.slot() = None;
        self.position.store(0, Ordering::SeqCst);
    }
}

impl Debug for FrameSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameSource")
            .field("metadata", &self.metadata())
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

impl FrameSource {
    /// Create an empty source that opens files through `backend`.
    pub fn new(backend: Arc<dyn VideoBackend>) -> Self {
        Self {
            backend,
            decoder: None,
            status: Arc::new(SourceStatus::default()),
        }
    }

    /// Close any open video, then open `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::OpenFailed`] if the backend cannot open the
    /// file or reports a non-positive frame rate. The source is left empty
    /// in that case.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<VideoMetadata, StillframeError> {
        let path = path.as_ref();
        self.release();

        let decoder = self.backend.open(path)?;
        let metadata = decoder.metadata().clone();
        if let Err(error) = metadata.require_frame_rate() {
            return Err(StillframeError::OpenFailed {
                path: path.to_path_buf(),
                reason: error.to_string(),
            });
        }

        self.status.publish_open(metadata.clone(), decoder.position());
        self.decoder = Some(decoder);
        Ok(metadata)
    }

    /// Read the frame at the current position and advance by one.
    ///
    /// Returns `None` at end of stream, after a failed read, or when nothing
    /// is open. The returned frame is overwritten by the next read; clone it
    /// to keep it.
    pub fn read_next(&mut self) -> Option<&Frame> {
        let frame = self.decoder.as_mut()?.read_frame()?;
        self.status.publish_position(frame.position_index() + 1);
        Some(frame)
    }

    /// Ask the backend to reposition to `frame_index`.
    ///
    /// The index is clamped to the frame count. Returns the position the
    /// backend reports afterwards, which may differ slightly from the
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::NotLoaded`] when nothing is open, or the
    /// backend's seek error.
    pub fn seek(&mut self, frame_index: u64) -> Result<u64, StillframeError> {
        let decoder = self.decoder.as_mut().ok_or(StillframeError::NotLoaded)?;
        let frame_count = decoder.metadata().frame_count;
        let target = if frame_count > 0 {
            frame_index.min(frame_count - 1)
        } else {
            0
        };
        decoder.seek(target)?;
        let landed = decoder.position();
        self.status.publish_position(landed);
        if landed != target {
            log::debug!("Seek to frame {target} landed on {landed}");
        }
        Ok(landed)
    }

    /// Drop the decode handle. Does nothing when nothing is open.
    pub fn release(&mut self) {
        if let Some(decoder) = self.decoder.take() {
            log::debug!("Releasing video: {}", decoder.metadata().path.display());
            self.status.publish_release();
        }
    }

    /// Shared, lock-free view of this source.
    pub fn status(&self) -> Arc<SourceStatus> {
        Arc::clone(&self.status)
    }

    /// Whether a video is currently open.
    pub fn is_open(&self) -> bool {
        self.decoder.is_some()
    }

    /// Metadata of the open video.
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.decoder.as_ref().map(|decoder| decoder.metadata())
    }

    /// Path of the open video.
    pub fn path(&self) -> Option<&Path> {
        self.metadata().map(|metadata| metadata.path.as_path())
    }

    /// Index the next read returns, as reported by the backend.
    pub fn position(&self) -> Option<u64> {
        self.decoder.as_ref().map(|decoder| decoder.position())
    }
}
