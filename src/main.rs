// Entry point of the media converter CLI.
// The library (lib.rs) holds everything; this file parses arguments,
// sets up logging and prints results.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use media_converter_lib::core::{FilterSpec, Progress, ProgressType, ResizeSpec};
use media_converter_lib::report::BatchReport;
use media_converter_lib::{
    AppConfig, AppState, ConversionSettings, TargetFormat, convert_files, download_media, media_info,
};

#[derive(Parser)]
#[command(name = "media-converter")]
#[command(version, about = "Convert images and videos, and fetch media through the download backend")]
struct Cli {
    /// Configuration file (defaults to ./media-converter.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert files or directories into an output directory
    Convert(ConvertArgs),

    /// Show metadata for a YouTube or Instagram link
    Info {
        url: String,
        #[arg(short, long, default_value = "human")]
        output: OutputFormat,
    },

    /// Have the backend prepare a download
    Download {
        url: String,
        #[arg(long, default_value = "best")]
        quality: String,
        #[arg(long, default_value = "mp4")]
        format: String,
        /// Fetch the prepared file into the output directory
        #[arg(long)]
        save: bool,
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,
    #[arg(long, default_value = "webp")]
    image_format: TargetFormat,
    #[arg(long, default_value = "mp4")]
    video_format: TargetFormat,
    /// 0.0 (smallest) to 1.0 (best)
    #[arg(short, long, default_value_t = 0.8)]
    quality: f32,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Use width and height as given instead of keeping the aspect ratio
    #[arg(long)]
    no_aspect_lock: bool,
    /// -100..=100
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    brightness: i32,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    contrast: i32,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    saturation: i32,
    /// Output name template: {name} {index} {format} {original_format} {date} {time} {timestamp}
    #[arg(long, default_value = "{name}")]
    pattern: String,
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    #[arg(long, default_value = "human")]
    report: OutputFormat,
}

impl ConvertArgs {
    fn settings(&self) -> ConversionSettings {
        ConversionSettings {
            image_format: self.image_format,
            video_format: self.video_format,
            quality: self.quality,
            resize: ResizeSpec {
                width: self.width,
                height: self.height,
                aspect_locked: !self.no_aspect_lock,
            },
            filters: FilterSpec::new(self.brightness, self.contrast, self.saturation),
            filename_pattern: self.pattern.clone(),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn log_progress(progress: Progress) {
    match progress.progress_type {
        ProgressType::Transcoding => debug!(
            "{:>5.1}% {} {}",
            progress.progress_percentage,
            progress.status,
            progress.file_name.as_deref().unwrap_or_default()
        ),
        _ => info!(
            "[{}/{}] {:.0}% {}",
            progress.completed_tasks,
            progress.total_tasks,
            progress.progress_percentage,
            progress.status
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.log_level);

    info!("=== Media Converter Starting ===");
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Convert(args) => {
            let settings = args.settings();
            let output_dir = args
                .output_dir
                .clone()
                .unwrap_or_else(|| state.config().output_dir.clone());

            let output = convert_files(&state, &args.inputs, &settings, &output_dir, &log_progress).await?;
            match args.report {
                OutputFormat::Human => {
                    println!("{}", BatchReport::new(&output.summary, &output.inputs));
                    for rejected in &output.rejected {
                        println!("- {rejected}");
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
            }
        }

        Commands::Info { url, output } => {
            let result = media_info(&state, &url).await?;
            match output {
                OutputFormat::Human => {
                    let info = &result.info;
                    println!("{} ({} {})", info.title, result.platform, result.id);
                    if let Some(author) = &info.author {
                        println!("  by {author}");
                    }
                    if let Some(seconds) = info.duration_seconds {
                        println!("  duration {}", media_converter_lib::report::format_duration(seconds));
                    }
                    if !info.available_formats.is_empty() {
                        println!("  formats: {}", info.available_formats.join(", "));
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
        }

        Commands::Download { url, quality, format, save, output_dir } => {
            let dir = output_dir.unwrap_or_else(|| state.config().output_dir.clone());
            let result = download_media(&state, &url, &quality, &format, save.then_some(dir.as_path())).await?;
            println!("{} → {}", result.ticket.filename, result.url);
            if let Some(path) = &result.saved_to {
                println!("saved to {}", path.display());
            }
        }
    }

    Ok(())
}
