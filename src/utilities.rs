//! Internal utility functions.
//!
//! Timestamp conversion helpers shared by the FFmpeg decoder and range
//! extraction.

use std::time::Duration;

use ffmpeg_next::Rational;

/// Guards `floor` against values like `254.99999999` that should be `255`.
const FLOOR_TOLERANCE: f64 = 1e-9;

/// Convert a [`Duration`] to a frame number using the video's frame rate.
pub fn timestamp_to_frame_number(timestamp: Duration, frames_per_second: f64) -> u64 {
    seconds_to_frame_number(timestamp.as_secs_f64(), frames_per_second)
}

/// `floor(seconds * fps)`, tolerant of floating point noise.
pub fn seconds_to_frame_number(seconds: f64, frames_per_second: f64) -> u64 {
    let frames = seconds * frames_per_second;
    if frames <= 0.0 {
        0
    } else {
        (frames + FLOOR_TOLERANCE).floor() as u64
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a frame number.
pub fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts_to_seconds(pts, time_base);
    if seconds <= 0.0 {
        return 0;
    }
    // Nearest, not floor: PTS values are rounded in the stream time base.
    (seconds * frames_per_second).round() as u64
}

/// Convert a frame number to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` goes through `avformat_seek_file` with `stream_index = -1`,
/// which expects container-level microseconds rather than stream ticks.
pub fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}
