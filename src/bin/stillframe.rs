use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        mpsc::{self, Sender},
    },
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use stillframe::{
    CaptureObserver, ExtractOptions, FfmpegLogLevel, Frame, FrameSink, ImageFormat, Player,
    PlayerOptions, ProgressCallback, ProgressInfo, StillframeError, StopReason,
};

const CLI_AFTER_HELP: &str = "Examples:\n  stillframe info input.mp4 --json\n  stillframe extract input.mp4 --count 10 --start 0:08 --end 0:10 --progress\n  stillframe play input.mp4 --capture --interval-ms 500 --for 30\n  stillframe completions zsh > _stillframe";

#[derive(Debug, Parser)]
#[command(
    name = "stillframe",
    version,
    about = "Capture still frames from video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    ffmpeg_log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print video metadata.
    #[command(
        about = "Print video metadata",
        visible_alias = "probe",
        after_help = "Examples:\n  stillframe info input.mp4\n  stillframe info input.mp4 --json"
    )]
    Info {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write evenly spaced screenshots from a time range.
    #[command(
        about = "Extract evenly spaced screenshots",
        after_help = "Examples:\n  stillframe extract input.mp4 --count 5\n  stillframe extract input.mp4 --count 4 --start 8 --end 10 --out shots --format bmp"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Number of screenshots (1 to 1000).
        #[arg(long, default_value_t = 10)]
        count: u32,
        /// Range start (SS, MM:SS or HH:MM:SS.f). Defaults to the beginning.
        #[arg(long)]
        start: Option<String>,
        /// Range end. Defaults to the end of the video.
        #[arg(long)]
        end: Option<String>,
        /// Storage root. Defaults to the pictures directory.
        #[arg(long)]
        out: Option<PathBuf>,
        /// File name prefix.
        #[arg(long)]
        prefix: Option<String>,
        /// Image format (png, bmp, tiff).
        #[arg(long, default_value = "png")]
        format: String,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
    },

    /// Play a video headlessly, optionally capturing frames at intervals.
    #[command(
        about = "Play with optional interval capture",
        after_help = "Examples:\n  stillframe play input.mp4 --for 5\n  stillframe play input.mp4 --capture --interval-ms 250 --batch-size 4 --out captures"
    )]
    Play {
        /// Input video path.
        input: PathBuf,
        /// Capture frames while playing.
        #[arg(long)]
        capture: bool,
        /// Minimum milliseconds between captures.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Captured frames written per batch.
        #[arg(long, default_value_t = 10)]
        batch_size: usize,
        /// Stop after this many seconds instead of at end of stream.
        #[arg(long = "for")]
        duration: Option<f64>,
        /// Storage root. Defaults to the pictures directory.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Image format (png, bmp, tiff).
        #[arg(long, default_value = "png")]
        format: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn seconds_to_duration(seconds: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    Duration::try_from_secs_f64(seconds.max(0.0))
        .map_err(|_| format!("time value out of range: {seconds}").into())
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds_to_duration(seconds);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0_u64, minutes.parse::<u64>()?, seconds),
        [hours, minutes, seconds] => (hours.parse::<u64>()?, minutes.parse::<u64>()?, seconds),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    let seconds = seconds.parse::<f64>()?;
    let total = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    seconds_to_duration(total)
}

fn parse_image_format(value: &str) -> Result<ImageFormat, Box<dyn std::error::Error>> {
    ImageFormat::from_extension(value)
        .ok_or_else(|| format!("unsupported --format: {value} (expected png, bmp or tiff)").into())
}

fn player_options(out: Option<PathBuf>, format: ImageFormat) -> PlayerOptions {
    let options = PlayerOptions::new().with_image_format(format);
    match out {
        Some(root) => options.with_storage_root(root),
        None => options,
    }
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    if let Some(level) = global.ffmpeg_log_level {
        stillframe::set_ffmpeg_log_level(level);
    }
}

fn progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        if let Some(timestamp) = info.current_timestamp {
            self.bar.set_message(format!("{:.2}s", timestamp.as_secs_f64()));
        }
    }
}

struct PositionSink {
    bar: ProgressBar,
    stopped: Mutex<Sender<StopReason>>,
}

impl FrameSink for PositionSink {
    fn on_frame(&self, frame: &Frame, position: Duration) {
        self.bar.set_position(frame.position_index());
        self.bar.set_message(format!("{:.2}s", position.as_secs_f64()));
    }

    fn on_stopped(&self, reason: StopReason) {
        let sender = self
            .stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = sender.send(reason);
    }
}

struct PrintSaved;

impl CaptureObserver for PrintSaved {
    fn on_saved(&self, path: &Path, _sequence: u64) {
        log::info!("Captured {}", path.display());
    }

    fn on_write_error(&self, error: &StillframeError) {
        eprintln!("{} {error}", "warning:".yellow().bold());
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Info { input, json } => {
            let player = Player::ffmpeg(PlayerOptions::new());
            let metadata = player.load(&input)?;
            let duration = metadata.duration()?;
            if json {
                let payload = json!({
                    "path": metadata.path.display().to_string(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "duration_seconds": duration.as_secs_f64(),
                    "codec": metadata.codec,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("File: {}", metadata.path.display());
                println!(
                    "Video: {}x{} @ {:.3} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!("Frames: {}", metadata.frame_count);
                println!("Duration: {:.3}s", duration.as_secs_f64());
            }
        }
        Commands::Extract {
            input,
            count,
            start,
            end,
            out,
            prefix,
            format,
            progress,
        } => {
            let start = start.as_deref().map(parse_timecode).transpose()?;
            let end = end.as_deref().map(parse_timecode).transpose()?;
            let mut options = player_options(out, parse_image_format(&format)?);
            if let Some(prefix) = prefix {
                options = options.with_extract_prefix(prefix);
            }

            let player = Player::ffmpeg(options);
            player.load(&input)?;

            let bar = if progress {
                let bar = ProgressBar::new(count as u64);
                bar.set_style(progress_style(
                    "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})",
                ));
                Some(bar)
            } else {
                None
            };
            let mut extract_options = ExtractOptions::new();
            if let Some(bar) = &bar {
                extract_options =
                    extract_options.with_progress(Arc::new(BarProgress { bar: bar.clone() }));
            }

            let summary = player.extract_evenly(count, start, end, &extract_options)?;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            println!(
                "{} {} of {} screenshots to {}",
                "Saved".green().bold(),
                summary.saved,
                summary.requested,
                summary.directory.display(),
            );
            if summary.skipped > 0 {
                println!("Skipped {} targets past the end of the video", summary.skipped);
            }
            if summary.failed > 0 {
                eprintln!(
                    "{} {} screenshots could not be written",
                    "warning:".yellow().bold(),
                    summary.failed
                );
            }
        }
        Commands::Play {
            input,
            capture,
            interval_ms,
            batch_size,
            duration,
            out,
            format,
        } => {
            let options = player_options(out, parse_image_format(&format)?)
                .with_screenshot_interval(Duration::from_millis(interval_ms))
                .with_batch_size(batch_size);
            let player = Player::ffmpeg(options);
            let metadata = player.load(&input)?;

            let bar = ProgressBar::new(metadata.frame_count);
            bar.set_style(progress_style(
                "{spinner:.green} [{bar:40.cyan/blue}] frame {pos}/{len} {msg}",
            ));

            let (sender, receiver) = mpsc::channel();
            let sink = Arc::new(PositionSink {
                bar: bar.clone(),
                stopped: Mutex::new(sender),
            });
            if capture {
                player.set_capture_observer(Arc::new(PrintSaved));
            }
            player.play(sink)?;
            if capture {
                player.start_capture()?;
            }

            let reason = match duration {
                Some(seconds) => receiver.recv_timeout(seconds_to_duration(seconds)?).ok(),
                None => receiver.recv().ok(),
            };

            let discarded = if capture { player.stop_capture() } else { 0 };
            player.stop();
            bar.finish_and_clear();

            match reason {
                Some(StopReason::EndOfStream) => println!("{}", "End of stream".green().bold()),
                _ => println!("{}", "Stopped".green().bold()),
            }
            if discarded > 0 {
                println!("Discarded {discarded} captures that did not fill a batch");
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stillframe", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{parse_image_format, parse_timecode, seconds_to_duration};
    use stillframe::ImageFormat;

    #[test]
    fn parse_image_format_aliases() {
        assert_eq!(parse_image_format("png").unwrap(), ImageFormat::Png);
        assert_eq!(parse_image_format("BMP").unwrap(), ImageFormat::Bmp);
        assert_eq!(parse_image_format("tif").unwrap(), ImageFormat::Tiff);
        assert!(parse_image_format("jpg").is_err());
    }

    #[test]
    fn parse_timecode_formats() {
        let seconds = parse_timecode("75").unwrap();
        assert_eq!(seconds.as_secs(), 75);

        let mm_ss = parse_timecode("01:15").unwrap();
        assert_eq!(mm_ss.as_secs(), 75);

        let hh_mm_ss = parse_timecode("00:01:15.5").unwrap();
        assert_eq!(hh_mm_ss.as_millis(), 75_500);
    }

    #[test]
    fn parse_timecode_rejects_garbage() {
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
        assert!(parse_timecode("ab:cd").is_err());
        assert!(parse_timecode("inf").is_err());
        assert!(parse_timecode("1e30").is_err());
        assert!(parse_timecode("1:00:1e30").is_err());
    }

    #[test]
    fn play_duration_is_checked_instead_of_panicking() {
        assert_eq!(seconds_to_duration(2.5).unwrap(), Duration::from_millis(2_500));
        assert_eq!(seconds_to_duration(-3.0).unwrap(), Duration::ZERO);
        assert!(seconds_to_duration(1e30).is_err());
        assert!(seconds_to_duration(f64::INFINITY).is_err());
    }
}
