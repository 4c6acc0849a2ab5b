//! Deterministic in-memory video backend shared by the integration tests.
//!
//! Frames are tiny solid-colour images whose blue channel encodes the frame
//! index, so a written screenshot tells which frame it came from. Like a
//! real file handle, a path can only be open once at a time.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use stillframe::{
    Frame, Player, PlayerOptions, StillframeError, VideoBackend, VideoDecoder, VideoMetadata,
};

pub const CLIP: &str = "clip.mp4";
pub const LONG_CLIP: &str = "long_clip.mp4";
pub const SHORT_CLIP: &str = "short_clip.mp4";

pub const WIDTH: u32 = 4;
pub const HEIGHT: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct SyntheticVideo {
    pub frames_per_second: f64,
    pub frame_count: u64,
}

#[derive(Debug, Default)]
struct Registry {
    open: HashSet<PathBuf>,
    seeks: Vec<u64>,
    opened: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticBackend {
    videos: Arc<HashMap<PathBuf, SyntheticVideo>>,
    registry: Arc<Mutex<Registry>>,
}

impl SyntheticBackend {
    /// `clip.mp4`: 10 s at 30 fps. `long_clip.mp4`: 100 s at 30 fps.
    /// `short_clip.mp4`: 10 frames at 30 fps.
    pub fn new() -> Self {
        Self::with_videos([
            (CLIP, 30.0, 300),
            (LONG_CLIP, 30.0, 3_000),
            (SHORT_CLIP, 30.0, 10),
        ])
    }

    pub fn with_videos<const N: usize>(videos: [(&str, f64, u64); N]) -> Self {
        let videos = videos
            .into_iter()
            .map(|(path, frames_per_second, frame_count)| {
                (
                    PathBuf::from(path),
                    SyntheticVideo {
                        frames_per_second,
                        frame_count,
                    },
                )
            })
            .collect();
        Self {
            videos: Arc::new(videos),
            registry: Arc::default(),
        }
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.registry.lock().unwrap().open.contains(Path::new(path))
    }

    pub fn open_count(&self) -> usize {
        self.registry.lock().unwrap().opened
    }

    pub fn seeks(&self) -> Vec<u64> {
        self.registry.lock().unwrap().seeks.clone()
    }
}

impl VideoBackend for SyntheticBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoDecoder>, StillframeError> {
        let video = self
            .videos
            .get(path)
            .copied()
            .ok_or_else(|| StillframeError::OpenFailed {
                path: path.to_path_buf(),
                reason: "No such file".to_string(),
            })?;

        let mut registry = self.registry.lock().unwrap();
        if !registry.open.insert(path.to_path_buf()) {
            return Err(StillframeError::OpenFailed {
                path: path.to_path_buf(),
                reason: "File is already open".to_string(),
            });
        }
        registry.opened += 1;

        Ok(Box::new(SyntheticDecoder {
            metadata: VideoMetadata {
                path: path.to_path_buf(),
                width: WIDTH,
                height: HEIGHT,
                frames_per_second: video.frames_per_second,
                frame_count: video.frame_count,
                codec: "synthetic".to_string(),
            },
            registry: Arc::clone(&self.registry),
            frame: Frame::default(),
            position: 0,
        }))
    }
}

struct SyntheticDecoder {
    metadata: VideoMetadata,
    registry: Arc<Mutex<Registry>>,
    frame: Frame,
    position: u64,
}

impl VideoDecoder for SyntheticDecoder {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self) -> Option<&Frame> {
        if self.position >= self.metadata.frame_count {
            return None;
        }
        self.frame = synthetic_frame(self.position);
        self.position += 1;
        Some(&self.frame)
    }

    fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError> {
        self.registry.lock().unwrap().seeks.push(frame_index);
        self.position = frame_index;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }
}

impl Drop for SyntheticDecoder {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.open.remove(&self.metadata.path);
        }
    }
}

/// Blue encodes `index % 256`, green `index / 256`, red is fixed.
pub fn synthetic_frame(index: u64) -> Frame {
    let pixel = [(index % 256) as u8, (index / 256 % 256) as u8, 200];
    let data = pixel.repeat((WIDTH * HEIGHT) as usize);
    Frame::from_packed_bgr(WIDTH, HEIGHT, data, index).unwrap()
}

/// Frame index stored in a written screenshot.
pub fn frame_index_of(path: &Path) -> u64 {
    let image = image::open(path).unwrap().to_rgb8();
    let [red, green, blue] = image.get_pixel(0, 0).0;
    assert_eq!(red, 200, "unexpected pixel data in {}", path.display());
    green as u64 * 256 + blue as u64
}

/// Fast timings so playback tests finish quickly.
pub fn fast_options(root: &Path) -> PlayerOptions {
    PlayerOptions::new()
        .with_storage_root(root)
        .with_pacing_interval(Duration::from_millis(1))
        .with_pause_poll_interval(Duration::from_millis(5))
        .with_drain_poll_interval(Duration::from_millis(5))
}

pub fn player(backend: &SyntheticBackend, options: PlayerOptions) -> Player {
    Player::new(Arc::new(backend.clone()), options)
}

/// Sorted file names in `directory`.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Poll `condition` for up to five seconds.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
