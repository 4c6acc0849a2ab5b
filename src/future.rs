//! Range extraction off the async runtime.
//!
//! Decoding and image encoding are blocking, CPU-heavy work. [`extract_async`]
//! runs a whole [`RangeExtractor`] pass on Tokio's blocking pool with its
//! own decode handle and hands back an [`ExtractionFuture`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillframe::{
//!     CaptureRequest, ExtractOptions, FfmpegBackend, ImageFormat, StillframeError,
//!     StorageNamer, extract_async,
//! };
//!
//! # async fn example() -> Result<(), StillframeError> {
//! let namer = StorageNamer::new("/tmp/shots", ImageFormat::Png);
//! let request = CaptureRequest::new(8, "/tmp/shots/input");
//! let summary = extract_async(
//!     Arc::new(FfmpegBackend),
//!     "input.mp4",
//!     namer,
//!     request,
//!     ExtractOptions::new(),
//! )
//! .await?;
//! println!("{} written", summary.saved);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::backend::VideoBackend;
use crate::configuration::ExtractOptions;
use crate::error::StillframeError;
use crate::extract::{CaptureRequest, ExtractionSummary, RangeExtractor};
use crate::source::FrameSource;
use crate::storage::StorageNamer;

/// Resolves to the outcome of a background range extraction.
///
/// Dropping the future does not stop the work; cancel through the
/// [`CancellationToken`](crate::CancellationToken) in the options instead.
pub struct ExtractionFuture {
    handle: JoinHandle<Result<ExtractionSummary, StillframeError>>,
}

impl Future for ExtractionFuture {
    type Output = Result<ExtractionSummary, StillframeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| {
            joined.unwrap_or_else(|error| {
                log::error!("Extraction task failed: {error}");
                Err(StillframeError::Cancelled)
            })
        })
    }
}

/// Open `video_path` through `backend` on a blocking thread and run
/// `request` against it.
///
/// Must be called from within a Tokio runtime.
pub fn extract_async(
    backend: Arc<dyn VideoBackend>,
    video_path: impl Into<PathBuf>,
    namer: StorageNamer,
    request: CaptureRequest,
    options: ExtractOptions,
) -> ExtractionFuture {
    let video_path = video_path.into();
    let handle = tokio::task::spawn_blocking(move || {
        let mut source = FrameSource::new(backend);
        source.open(&video_path)?;
        let summary = RangeExtractor::new(&mut source, &namer).extract(&request, &options);
        source.release();
        summary
    });
    ExtractionFuture { handle }
}
