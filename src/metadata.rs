//! Video metadata.
//!
//! [`VideoMetadata`] is read once when a [`FrameSource`](crate::FrameSource)
//! opens a file and cached for as long as the decode handle lives.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::StillframeError;

/// Metadata for an opened video.
///
/// # Example
///
/// ```no_run
/// use stillframe::{Player, PlayerOptions};
///
/// let player = Player::ffmpeg(PlayerOptions::new());
/// let metadata = player.load("input.mp4").unwrap();
/// println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Path the video was opened from.
    pub path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames. Estimated from duration when the container
    /// does not store it.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Fail with [`StillframeError::InvalidFrameRate`] unless fps is positive.
    ///
    /// Every duration or interval computation goes through this first.
    pub fn require_frame_rate(&self) -> Result<f64, StillframeError> {
        if self.frames_per_second > 0.0 && self.frames_per_second.is_finite() {
            Ok(self.frames_per_second)
        } else {
            Err(StillframeError::InvalidFrameRate(self.frames_per_second))
        }
    }

    /// Total running time, `frame_count / fps`.
    pub fn duration(&self) -> Result<Duration, StillframeError> {
        let fps = self.require_frame_rate()?;
        Ok(Duration::from_secs_f64(self.frame_count as f64 / fps))
    }

    /// Presentation time of a frame index.
    pub fn frame_time(&self, frame_index: u64) -> Result<Duration, StillframeError> {
        let fps = self.require_frame_rate()?;
        Ok(Duration::from_secs_f64(frame_index as f64 / fps))
    }
}
