use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framepick::{
    ChangeMetric, CountMode, DecoderLogLevel, ExtractionConfig, FrameCount, FrameSource,
    OperationType, PayloadEncoding, ProgressCallback, ProgressInfo, Resolution, VideoFileSource,
    extract_keyframes, is_remote_url,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framepick extract input.mp4 --k 6\n  framepick extract input.mp4 --k auto --resolution 720p --base64 --json\n  framepick extract input.mp4 --mode interval --interval 5 --out keyframes --progress\n  framepick probe input.mp4 --json\n  framepick completions zsh > _framepick";

#[derive(Debug, Parser)]
#[command(
    name = "framepick",
    version,
    about = "Pick representative keyframes from a video",
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
    /// Show additional output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract keyframes from a video file.
    #[command(
        about = "Extract keyframes",
        after_help = "Examples:\n  framepick extract input.mp4 --k 4 --out keyframes\n  framepick extract input.mp4 --k auto --min-frames 3 --max-frames 10 --frame-skip 5"
    )]
    Extract(ExtractArgs),

    /// Print duration, resolution, and frame rate of a video file.
    #[command(about = "Print video stream information")]
    Probe {
        /// Input video path.
        input: String,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    #[command(about = "Generate shell completion script")]
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Debug, clap::Args)]
struct ExtractArgs {
    /// Input video path.
    input: String,

    /// Number of keyframes, or "auto".
    #[arg(long, default_value = "5")]
    k: FrameCount,

    /// Count mode: fixed, adaptive, or interval. Defaults to adaptive for `--k auto`.
    #[arg(long)]
    mode: Option<CountMode>,

    /// Lower bound for adaptive mode.
    #[arg(long, default_value_t = 3)]
    min_frames: u32,

    /// Upper bound for adaptive and interval modes.
    #[arg(long, default_value_t = 15)]
    max_frames: u32,

    /// Seconds per keyframe in interval mode.
    #[arg(long, default_value_t = 10.0)]
    interval: f64,

    /// Score only the last frame of every run of N frames.
    #[arg(long, default_value_t = 1)]
    frame_skip: u32,

    /// Output resolution: original, 360p, 480p, 720p, 1080p, or WxH.
    #[arg(long, default_value = "original")]
    resolution: Resolution,

    /// Return base64 JPEG payloads instead of raw RGB.
    #[arg(long)]
    base64: bool,

    /// Write each keyframe as a JPEG into this directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Change metric: pixel-delta, histogram, or phash.
    #[arg(long, default_value = "pixel-delta")]
    metric: ChangeMetric,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 85)]
    quality: u8,

    /// Print the full result as JSON.
    #[arg(long)]
    json: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,
}

fn parse_log_level(value: &str) -> Option<DecoderLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(DecoderLogLevel::Quiet),
        "error" => Some(DecoderLogLevel::Error),
        "warning" | "warn" => Some(DecoderLogLevel::Warning),
        "info" => Some(DecoderLogLevel::Info),
        "debug" => Some(DecoderLogLevel::Debug),
        _ => None,
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        framepick::set_decoder_log_level(parsed);
    }
    Ok(())
}

fn build_config(args: &ExtractArgs) -> ExtractionConfig {
    let mode = args.mode.unwrap_or(match args.k {
        FrameCount::Auto => CountMode::Adaptive,
        FrameCount::Fixed(_) => CountMode::Fixed,
    });
    let encoding = if args.base64 {
        PayloadEncoding::Base64
    } else {
        PayloadEncoding::Raw
    };

    let mut config = ExtractionConfig::new()
        .with_frame_count(args.k)
        .with_mode(mode)
        .with_frame_bounds(args.min_frames, args.max_frames)
        .with_interval(args.interval)
        .with_frame_skip(args.frame_skip)
        .with_resolution(args.resolution)
        .with_encoding(encoding)
        .with_metric(args.metric)
        .with_jpeg_quality(args.quality);
    if let Some(out) = &args.out {
        config = config.with_persist_dir(out);
    }
    config
}

fn ensure_local_input(input: &str) -> Result<(), Box<dyn std::error::Error>> {
    if is_remote_url(input) {
        return Err(format!(
            "remote input is not supported here: {input} (download it first and pass the local file)"
        )
        .into());
    }
    Ok(())
}

/// Drives an indicatif bar from library progress callbacks.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg:>13} {bar:40.cyan/blue} {pos}/{len}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let stage = match info.operation {
            OperationType::Scoring => "scoring",
            OperationType::Normalization => "normalizing",
            _ => "working",
        };
        self.bar.set_message(stage);
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

fn run_extract(args: ExtractArgs, global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    ensure_local_input(&args.input)?;
    let mut config = build_config(&args);
    config.validate()?;

    let progress = if args.progress {
        let progress = Arc::new(TerminalProgress::new()?);
        config = config.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let source = VideoFileSource::open(&args.input)?;
    if global.verbose {
        eprintln!(
            "{} {} [{}] {}x{}, {:.2}s",
            "opened".cyan().bold(),
            args.input,
            source.codec(),
            source.native_resolution().0,
            source.native_resolution().1,
            source.duration().as_secs_f64()
        );
    }
    let result = extract_keyframes(source, &config)?;

    if let Some(progress) = progress {
        progress.bar.finish_with_message("done");
    }

    if args.json {
        println!("{}", result.to_json()?);
        return Ok(());
    }

    if let Some(reason) = &result.error {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("no keyframes extracted: {reason}").yellow()
        );
    }
    for (ordinal, keyframe) in result.keyframes.iter().enumerate() {
        let location = keyframe
            .persisted_path
            .as_ref()
            .map(|path| format!(" -> {}", path.display()))
            .unwrap_or_default();
        match &keyframe.error {
            None => println!(
                "{:>3}. {:>9.3}s  frame {:<7} score {:>7.2}  {}x{}  {} bytes{location}",
                ordinal + 1,
                keyframe.timestamp.as_secs_f64(),
                keyframe.index,
                keyframe.change_score,
                keyframe.resolution.0,
                keyframe.resolution.1,
                keyframe.payload_len(),
            ),
            Some(error) => println!(
                "{:>3}. {:>9.3}s  frame {:<7} {}",
                ordinal + 1,
                keyframe.timestamp.as_secs_f64(),
                keyframe.index,
                format!("failed: {error}").red()
            ),
        }
    }
    if global.verbose {
        eprintln!(
            "Scored {} of {} frames ({} unreadable); max score {:.2}, mean {:.2}",
            result.total_frames_analyzed,
            result.total_frames_read,
            result.skipped_frames,
            result.statistics.max_score,
            result.statistics.avg_score
        );
    }
    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "{} of {} keyframe(s) from {:.2}s of video ({} mode)",
            result.successful_keyframes(),
            result.calculated_frame_count,
            result.video_duration,
            result.mode
        )
        .green()
    );
    Ok(())
}

fn run_probe(input: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    ensure_local_input(input)?;
    let source = VideoFileSource::open(input)?;
    let (width, height) = source.native_resolution();
    let duration = source.duration().as_secs_f64();
    if json {
        let payload = json!({
            "path": input,
            "codec": source.codec(),
            "duration_seconds": duration,
            "width": width,
            "height": height,
            "fps": source.frame_rate(),
            "estimated_frame_count": source.estimated_frame_count(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Duration: {duration:.3}s");
        println!("Video: {width}x{height} [{}]", source.codec());
        match source.frame_rate() {
            Some(fps) => println!("Frame rate: {fps:.3} fps"),
            None => println!("Frame rate: unknown"),
        }
        if let Some(frames) = source.estimated_frame_count() {
            println!("Frames (estimated): {frames}");
        }
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Extract(args) => run_extract(args, &cli.global)?,
        Commands::Probe { input, json } => run_probe(&input, json)?,
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framepick", &mut std::io::stdout());
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
