//! FFmpeg decode backend.
//!
//! [`FfmpegBackend`] opens files with `ffmpeg-next`, decodes the best video
//! stream, and converts each frame to BGR24 at the source resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as FfmpegVideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::backend::{VideoBackend, VideoDecoder};
use crate::error::StillframeError;
use crate::frame::Frame;
use crate::metadata::VideoMetadata;

/// The production [`VideoBackend`], backed by FFmpeg.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use stillframe::{FfmpegBackend, VideoBackend};
///
/// let mut decoder = FfmpegBackend.open(Path::new("input.mp4")).unwrap();
/// if let Some(frame) = decoder.read_frame() {
///     println!("first frame is {}x{}", frame.width(), frame.height());
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl VideoBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoDecoder>, StillframeError> {
        Ok(Box::new(FfmpegDecoder::open(path)?))
    }
}

/// An open FFmpeg demuxer + decoder pair.
struct FfmpegDecoder {
    input_context: Input,
    decoder: FfmpegVideoDecoder,
    scaler: Scaler,
    video_stream_index: usize,
    time_base: Rational,
    metadata: VideoMetadata,
    decoded_frame: VideoFrame,
    converted_frame: VideoFrame,
    /// Reused across reads; lent out by `read_frame`.
    frame: Frame,
    /// Index the next read returns.
    position: u64,
    /// Frames decoded before this index are dropped (accurate seek).
    seek_target: Option<u64>,
    eof_sent: bool,
}

/// The BGR24 converter, movable between the playback and caller threads.
///
/// `ffmpeg-next` marks the demuxer, codec context and frames `Send` but not
/// the swscale context.
struct Scaler(ScalingContext);

// SAFETY: an `SwsContext` keeps no thread-local state and is only touched
// through `&mut self` in `read_frame`, which the frame source lock
// serialises. It moves between threads but is never shared.
unsafe impl Send for Scaler {}

fn open_failed(path: &Path, reason: impl Into<String>) -> StillframeError {
    StillframeError::OpenFailed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

impl FfmpegDecoder {
    fn open(path: &Path) -> Result<Self, StillframeError> {
        log::debug!("Opening video: {}", path.display());

        // Safe to call repeatedly.
        ffmpeg_next::init()
            .map_err(|error| open_failed(path, format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_failed(path, error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| open_failed(path, StillframeError::NoVideoStream.to_string()))?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_failed(path, format!("Failed to read codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_failed(path, format!("Failed to create video decoder: {error}")))?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() > 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let stored_frames = stream.frames();
        let frame_count = if stored_frames > 0 {
            stored_frames as u64
        } else {
            let duration_microseconds = input_context.duration();
            let duration = if duration_microseconds > 0 {
                Duration::from_micros(duration_microseconds as u64)
            } else {
                Duration::ZERO
            };
            (duration.as_secs_f64() * frames_per_second.max(0.0)) as u64
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::BGR24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| open_failed(path, format!("Failed to create scaler: {error}")))?;

        let metadata = VideoMetadata {
            path: PathBuf::from(path),
            width,
            height,
            frames_per_second,
            frame_count,
            codec,
        };

        log::debug!(
            "Opened {}: {}x{} @ {:.3} fps, {} frames [{}]",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: Scaler(scaler),
            video_stream_index,
            time_base,
            metadata,
            decoded_frame: VideoFrame::empty(),
            converted_frame: VideoFrame::empty(),
            frame: Frame::default(),
            position: 0,
            seek_target: None,
            eof_sent: false,
        })
    }

    /// Decode until a frame at or past the seek target is available.
    ///
    /// Returns `Ok(false)` at end of stream.
    fn decode_next(&mut self) -> Result<bool, StillframeError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let index = match self.decoded_frame.timestamp().or(self.decoded_frame.pts()) {
                    Some(pts) => crate::utilities::pts_to_frame_number(
                        pts,
                        self.time_base,
                        self.metadata.frames_per_second,
                    ),
                    None => self.position,
                };

                if let Some(target) = self.seek_target {
                    if index < target {
                        continue;
                    }
                    self.seek_target = None;
                }

                self.scaler
                    .0
                    .run(&self.decoded_frame, &mut self.converted_frame)?;
                self.frame.fill_from_plane(
                    self.converted_frame.data(0),
                    self.converted_frame.stride(0),
                    self.metadata.width,
                    self.metadata.height,
                    index,
                );
                self.position = index + 1;
                return Ok(true);
            }

            if self.eof_sent {
                return Ok(false);
            }

            match self.input_context.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.video_stream_index {
                        continue;
                    }
                    self.decoder.send_packet(&packet)?;
                }
                None => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self) -> Option<&Frame> {
        match self.decode_next() {
            Ok(true) => Some(&self.frame),
            Ok(false) => None,
            Err(error) => {
                log::debug!("Read failed at frame {}: {error}", self.position);
                None
            }
        }
    }

    fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError> {
        let fps = self.metadata.require_frame_rate()?;
        let timestamp = crate::utilities::frame_number_to_seek_timestamp(frame_index, fps);

        // Land on the keyframe at or before the target, then decode forward.
        self.input_context.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.eof_sent = false;
        self.seek_target = Some(frame_index);
        self.position = frame_index;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }
}
