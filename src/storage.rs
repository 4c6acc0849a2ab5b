//! Output directories, file names, and image writing.
//!
//! Screenshots land in `<root>/<folder>/<video stem>/<prefix>_<n>.<ext>`.
//! Names only depend on the caller's sequence number; nothing checks for
//! existing files, so running twice into the same directory overwrites
//! the first run's images.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat as EncoderFormat;

use crate::error::StillframeError;
use crate::frame::Frame;

/// Lossless image formats screenshots can be written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG. This is the default.
    #[default]
    Png,
    /// Uncompressed BMP.
    Bmp,
    /// TIFF.
    Tiff,
}

impl ImageFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
        }
    }

    /// Parse an extension or format name (`png`, `bmp`, `tif`, `tiff`).
    pub fn from_extension(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().trim_start_matches('.') {
            "png" => Some(ImageFormat::Png),
            "bmp" => Some(ImageFormat::Bmp),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    fn encoder_format(self) -> EncoderFormat {
        match self {
            ImageFormat::Png => EncoderFormat::Png,
            ImageFormat::Bmp => EncoderFormat::Bmp,
            ImageFormat::Tiff => EncoderFormat::Tiff,
        }
    }
}

/// Derives output locations and writes frames.
#[derive(Debug, Clone)]
pub struct StorageNamer {
    root: PathBuf,
    format: ImageFormat,
}

impl StorageNamer {
    /// Write under `root` in the given format.
    pub fn new(root: impl Into<PathBuf>, format: ImageFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    /// Write under the user's pictures directory.
    ///
    /// Falls back to `$HOME/Pictures`, then the working directory, when the
    /// platform does not define one.
    pub fn pictures(format: ImageFormat) -> Self {
        let root = dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root, format)
    }

    /// The root all output directories hang off.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configured image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// `<root>/<base_folder>/<video file stem>`, without touching the disk.
    pub fn directory_path(&self, video_path: &Path, base_folder: &str) -> PathBuf {
        let video_name = video_path
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_else(|| "video".into());
        self.root.join(base_folder).join(video_name)
    }

    /// Same as [`directory_path`](Self::directory_path), but creates the
    /// directory if missing.
    ///
    /// Calling this again with the same arguments returns the same path and
    /// succeeds even though the directory already exists.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::IoError`] if the directory tree cannot be
    /// created.
    pub fn directory_for(
        &self,
        video_path: &Path,
        base_folder: &str,
    ) -> Result<PathBuf, StillframeError> {
        let directory = self.directory_path(video_path, base_folder);
        fs::create_dir_all(&directory)?;
        Ok(directory)
    }

    /// `<prefix>_<sequence>.<ext>`.
    pub fn file_name(&self, prefix: &str, sequence: u64) -> String {
        format!("{prefix}_{sequence}.{}", self.format.extension())
    }

    /// Encode `frame` to `<directory>/<prefix>_<sequence>.<ext>`.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::WriteFailed`] naming the destination when
    /// conversion or encoding fails.
    pub fn write(
        &self,
        directory: &Path,
        prefix: &str,
        sequence: u64,
        frame: &Frame,
    ) -> Result<PathBuf, StillframeError> {
        let path = directory.join(self.file_name(prefix, sequence));
        let write_failed = |reason: String| StillframeError::WriteFailed {
            path: path.clone(),
            reason,
        };

        let image = frame
            .to_rgb_image()
            .map_err(|error| write_failed(error.to_string()))?;
        image
            .save_with_format(&path, self.format.encoder_format())
            .map_err(|error| write_failed(error.to_string()))?;

        log::trace!("Wrote {}", path.display());
        Ok(path)
    }
}
