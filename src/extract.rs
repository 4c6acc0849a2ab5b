//! Evenly spaced screenshots from a time range.
//!
//! A [`CaptureRequest`] asks for `count` screenshots between two
//! timestamps. [`RangeExtractor`] splits the range into `count` equal
//! intervals, seeks to the first frame of each, and writes it as
//! `<prefix>_<n>.<ext>` where `n` is the 1-based interval number.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::configuration::ExtractOptions;
use crate::error::StillframeError;
use crate::metadata::VideoMetadata;
use crate::progress::{OperationType, ProgressTracker};
use crate::source::FrameSource;
use crate::storage::StorageNamer;

/// Largest number of screenshots one request may ask for.
pub const MAX_SCREENSHOT_COUNT: u32 = 1000;

/// Slack allowed when comparing a range end to the video duration.
const DURATION_TOLERANCE_SECONDS: f64 = 1e-9;

/// A request for `count` evenly spaced screenshots.
///
/// Without an explicit range the whole video is covered.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use stillframe::CaptureRequest;
///
/// let request = CaptureRequest::new(4, "/tmp/shots")
///     .with_range(Duration::from_secs(8), Duration::from_secs(10))
///     .with_prefix("Screenshot");
/// assert_eq!(request.count, 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Number of screenshots to take, `1..=MAX_SCREENSHOT_COUNT`.
    pub count: u32,
    /// Start of the range. Defaults to the beginning of the video.
    pub start: Option<Duration>,
    /// End of the range. Defaults to the end of the video.
    pub end: Option<Duration>,
    /// Directory images are written to. Created after validation.
    pub directory: PathBuf,
    /// File name prefix.
    pub prefix: String,
}

/// One computed screenshot position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetFrame {
    /// 1-based interval number, used as the file name suffix.
    pub ordinal: u32,
    /// Target time within the video.
    pub timestamp: Duration,
    /// `floor(timestamp * fps)`. May be past the last frame.
    pub frame_index: u64,
}

impl CaptureRequest {
    /// Request `count` screenshots of the whole video into `directory`.
    pub fn new(count: u32, directory: impl Into<PathBuf>) -> Self {
        Self {
            count,
            start: None,
            end: None,
            directory: directory.into(),
            prefix: "Screenshot".to_string(),
        }
    }

    /// Limit the request to `start..end`.
    #[must_use]
    pub fn with_range(mut self, start: Duration, end: Duration) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Set only the start of the range.
    #[must_use]
    pub fn with_start(mut self, start: Option<Duration>) -> Self {
        self.start = start;
        self
    }

    /// Set only the end of the range.
    #[must_use]
    pub fn with_end(mut self, end: Option<Duration>) -> Self {
        self.end = end;
        self
    }

    /// Set the file name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Check the request against `metadata` and resolve the default range.
    ///
    /// # Errors
    ///
    /// - [`StillframeError::InvalidFrameRate`] if fps is not positive.
    /// - [`StillframeError::InvalidCount`] if `count` is zero or above
    ///   [`MAX_SCREENSHOT_COUNT`].
    /// - [`StillframeError::InvalidRange`] if `start >= end`.
    /// - [`StillframeError::RangeExceedsDuration`] if `end` is past the end.
    pub fn validate(
        &self,
        metadata: &VideoMetadata,
    ) -> Result<(Duration, Duration), StillframeError> {
        metadata.require_frame_rate()?;
        if self.count == 0 || self.count > MAX_SCREENSHOT_COUNT {
            return Err(StillframeError::InvalidCount);
        }

        let duration = metadata.duration()?;
        let start = self.start.unwrap_or(Duration::ZERO);
        let end = self.end.unwrap_or(duration);

        if start >= end {
            return Err(StillframeError::InvalidRange { start, end });
        }
        if end.as_secs_f64() > duration.as_secs_f64() + DURATION_TOLERANCE_SECONDS {
            return Err(StillframeError::RangeExceedsDuration { end, duration });
        }
        Ok((start, end))
    }

    /// Validate, then compute one target per interval.
    ///
    /// Frame indices never decrease and there are exactly `count` targets.
    /// Targets past the last frame are kept here and skipped by the
    /// extractor.
    pub fn targets(&self, metadata: &VideoMetadata) -> Result<Vec<TargetFrame>, StillframeError> {
        let (start, end) = self.validate(metadata)?;
        let fps = metadata.require_frame_rate()?;

        let start_seconds = start.as_secs_f64();
        let interval = (end.as_secs_f64() - start_seconds) / self.count as f64;

        Ok((0..self.count)
            .map(|i| {
                let seconds = start_seconds + i as f64 * interval;
                TargetFrame {
                    ordinal: i + 1,
                    timestamp: Duration::from_secs_f64(seconds),
                    frame_index: crate::utilities::seconds_to_frame_number(seconds, fps),
                }
            })
            .collect())
    }
}

/// Outcome of a range extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Screenshots asked for.
    pub requested: u32,
    /// Targets processed before finishing.
    pub attempted: u64,
    /// Images actually written. May be below `requested`.
    pub saved: u64,
    /// Targets past the end of the video or that decoded to nothing.
    pub skipped: u64,
    /// Targets whose image could not be written.
    pub failed: u64,
    /// Where the images went.
    pub directory: PathBuf,
}

/// Random-access screenshot writer over an exclusively borrowed source.
///
/// Holding `&mut FrameSource` for the whole run is what keeps playback from
/// seeking the same handle in between.
pub struct RangeExtractor<'a> {
    source: &'a mut FrameSource,
    namer: &'a StorageNamer,
}

impl<'a> RangeExtractor<'a> {
    /// Extract from `source`, writing through `namer`.
    pub fn new(source: &'a mut FrameSource, namer: &'a StorageNamer) -> Self {
        Self { source, namer }
    }

    /// Write one screenshot per target of `request`.
    ///
    /// Validation happens before any seek, read, or directory creation.
    /// Write failures on single images are logged and counted, not returned.
    /// Progress is reported after every target, saved or not.
    ///
    /// # Errors
    ///
    /// - [`StillframeError::NotLoaded`] when the source is empty.
    /// - Any validation error from [`CaptureRequest::validate`].
    /// - [`StillframeError::IoError`] if the directory cannot be created.
    /// - [`StillframeError::Cancelled`] when the token fires; images written
    ///   before that stay on disk.
    pub fn extract(
        &mut self,
        request: &CaptureRequest,
        options: &ExtractOptions,
    ) -> Result<ExtractionSummary, StillframeError> {
        let metadata = self
            .source
            .metadata()
            .ok_or(StillframeError::NotLoaded)?
            .clone();
        let targets = request.targets(&metadata)?;

        fs::create_dir_all(&request.directory)?;
        log::info!(
            "Extracting {} screenshots from {} into {}",
            request.count,
            metadata.path.display(),
            request.directory.display(),
        );

        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::RangeExtraction,
            Some(request.count as u64),
        );
        let mut summary = ExtractionSummary {
            requested: request.count,
            attempted: 0,
            saved: 0,
            skipped: 0,
            failed: 0,
            directory: request.directory.clone(),
        };

        for target in targets {
            if options.is_cancelled() {
                log::info!(
                    "Extraction cancelled after {} of {} targets",
                    tracker.current(),
                    request.count
                );
                return Err(StillframeError::Cancelled);
            }

            if target.frame_index >= metadata.frame_count {
                summary.skipped += 1;
                tracker.advance(Some(target.frame_index), Some(target.timestamp));
                continue;
            }

            match self.write_target(request, &target) {
                Ok(true) => summary.saved += 1,
                Ok(false) => summary.skipped += 1,
                Err(error) => {
                    log::warn!("Screenshot {} failed: {error}", target.ordinal);
                    summary.failed += 1;
                }
            }
            tracker.advance(Some(target.frame_index), Some(target.timestamp));

            // Give the caller's threads a turn between writes.
            thread::yield_now();
        }

        summary.attempted = tracker.current();
        log::info!(
            "Extraction finished: {} saved, {} skipped, {} failed",
            summary.saved,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// Seek, read, and write one target. `Ok(false)` means nothing to save.
    fn write_target(
        &mut self,
        request: &CaptureRequest,
        target: &TargetFrame,
    ) -> Result<bool, StillframeError> {
        if let Err(error) = self.source.seek(target.frame_index) {
            log::debug!("Seek to frame {} failed: {error}", target.frame_index);
            return Ok(false);
        }
        let Some(frame) = self.source.read_next() else {
            return Ok(false);
        };
        if frame.is_empty() {
            return Ok(false);
        }
        self.namer.write(
            &request.directory,
            &request.prefix,
            target.ordinal as u64,
            frame,
        )?;
        Ok(true)
    }
}
