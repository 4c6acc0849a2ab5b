//! Verbosity of FFmpeg's own stderr output.
//!
//! FFmpeg logs through its own channel, independent of the [`log`] facade
//! this crate uses. Decoding damaged or unusual files can make it very
//! chatty, which is a problem for a player printing to the same terminal.
//!
//! ```no_run
//! use stillframe::{FfmpegLogLevel, set_ffmpeg_log_level};
//!
//! set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// FFmpeg log threshold, from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Nothing at all.
    Quiet,
    /// Only unrecoverable errors.
    Fatal,
    /// Errors.
    Error,
    /// Warnings and errors. FFmpeg's own default.
    #[default]
    Warning,
    /// Informational messages.
    Info,
    /// Decoder internals.
    Debug,
}

impl FfmpegLogLevel {
    /// Every level, quietest first.
    pub const ALL: [FfmpegLogLevel; 6] = [
        FfmpegLogLevel::Quiet,
        FfmpegLogLevel::Fatal,
        FfmpegLogLevel::Error,
        FfmpegLogLevel::Warning,
        FfmpegLogLevel::Info,
        FfmpegLogLevel::Debug,
    ];

    fn name(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Debug => "debug",
        }
    }

    fn level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        let value = if value == "warn" { "warning" } else { value.as_str() };
        FfmpegLogLevel::ALL
            .into_iter()
            .find(|level| level.name() == value)
            .ok_or_else(|| {
                let names: Vec<&str> = FfmpegLogLevel::ALL.iter().map(|l| l.name()).collect();
                format!("unknown FFmpeg log level '{value}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Set the threshold below which FFmpeg stays silent.
///
/// Process-wide; applies to every decoder opened afterwards and to those
/// already open.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.level());
    log::debug!("FFmpeg log level set to {level}");
}
