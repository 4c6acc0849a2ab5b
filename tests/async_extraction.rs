//! Async range extraction tests.

#![cfg(feature = "async")]

mod common;

use std::sync::Arc;

use stillframe::{
    CaptureRequest, ExtractOptions, ImageFormat, StillframeError, StorageNamer, extract_async,
};

use common::{CLIP, SyntheticBackend, file_names};

#[tokio::test]
async fn extraction_runs_on_the_blocking_pool() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let backend = SyntheticBackend::new();
    let namer = StorageNamer::new(output.path(), ImageFormat::Png);
    let request = CaptureRequest::new(5, output.path().join("async"));

    let summary = extract_async(
        Arc::new(backend.clone()),
        CLIP,
        namer,
        request,
        ExtractOptions::new(),
    )
    .await
    .expect("Failed to extract");

    assert_eq!(summary.saved, 5);
    assert_eq!(file_names(&output.path().join("async")).len(), 5);
    assert!(!backend.is_open(CLIP), "the handle is released afterwards");
}

#[tokio::test]
async fn open_failures_surface_through_the_future() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let namer = StorageNamer::new(output.path(), ImageFormat::Png);
    let request = CaptureRequest::new(1, output.path().join("never"));

    let result = extract_async(
        Arc::new(SyntheticBackend::new()),
        "missing.mp4",
        namer,
        request,
        ExtractOptions::new(),
    )
    .await;

    assert!(matches!(result, Err(StillframeError::OpenFailed { .. })));
    assert!(!output.path().join("never").exists());
}
