//! Reelgrab - Video Downloader
//!
//! A small desktop front end for yt-dlp and ffmpeg: paste a URL, preview it,
//! pick MP4 or MP3 and a quality, and download it with live progress.

use anyhow::{bail, Context, Result};
use clap::Parser;
use reelgrab::converter::{Converter, FfmpegConverter};
use reelgrab::downloader::{
    DownloadCoordinator, DownloadRequest, OutputFormat, ProgressEvent, ProgressReporter,
    ProgressStatus, Quality,
};
use reelgrab::extractor::{Extractor, YtDlpExtractor};
use reelgrab::utils::format::{format_bytes, format_clock, format_duration, format_speed};
use reelgrab::utils::{AppSettings, ToolReport};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "reelgrab", version, about = "Download videos as MP4 or MP3")]
struct Args {
    /// Print metadata for a URL and exit
    #[arg(long, value_name = "URL", conflicts_with = "download")]
    info: Option<String>,

    /// Download a URL without opening the window
    #[arg(long, value_name = "URL")]
    download: Option<String>,

    /// Output format (mp4 or mp3)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Maximum quality (best, 1080, 720, 480)
    #[arg(long)]
    quality: Option<Quality>,

    /// Output directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Settings file to read instead of the default one
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let mut settings = AppSettings::load_or_default(args.config.as_deref());
    if let Some(format) = args.format {
        settings.format = format;
    }
    if let Some(quality) = args.quality {
        settings.quality = quality;
    }
    if let Some(output) = args.output.clone() {
        settings.download_location = output;
    }

    if let Some(url) = args.info {
        let rt = tokio::runtime::Runtime::new()?;
        return rt.block_on(print_info(settings, url));
    }

    if let Some(url) = args.download {
        let rt = tokio::runtime::Runtime::new()?;
        return rt.block_on(download_cli(settings, url));
    }

    info!("Starting Reelgrab {}", env!("CARGO_PKG_VERSION"));
    reelgrab::app::run(settings).context("the window could not be opened")?;

    Ok(())
}

async fn print_info(settings: AppSettings, url: String) -> Result<()> {
    let extractor = YtDlpExtractor::new(&settings);
    let metadata = extractor.fetch_metadata(&url).await?;

    println!("Title:     {}", metadata.title);
    if let Some(uploader) = &metadata.uploader {
        println!("Uploader:  {}", uploader);
    }
    if let Some(secs) = metadata.duration_secs() {
        println!("Duration:  {}", format_clock(secs));
    }
    if let Some(thumbnail) = &metadata.thumbnail {
        println!("Thumbnail: {}", thumbnail);
    }

    println!("Formats:");
    for format in metadata.media_formats() {
        println!("  {}", format.display_label());
    }

    println!("Estimated sizes:");
    for quality in metadata.quality_options() {
        if let Some(size) = metadata.estimated_size(OutputFormat::Mp4, quality) {
            println!("  MP4 {:<15} ~{}", quality.label(), format_bytes(size));
        }
    }
    if let Some(size) = metadata.estimated_size(OutputFormat::Mp3, Quality::Best) {
        println!("  MP3 {:<15} ~{}", "audio", format_bytes(size));
    }

    Ok(())
}

async fn download_cli(settings: AppSettings, url: String) -> Result<()> {
    let report = {
        let settings = settings.clone();
        tokio::task::spawn_blocking(move || ToolReport::detect(&settings)).await?
    };
    for warning in report.warnings() {
        warn!("{}", warning);
    }
    let Some(ffmpeg) = report.ffmpeg.clone() else {
        bail!("ffmpeg is required to download {} files", settings.format);
    };

    let extractor: Arc<dyn Extractor> = Arc::new(YtDlpExtractor::with_binaries(
        report.ytdlp.clone(),
        Some(ffmpeg.clone()),
    ));
    let converter: Arc<dyn Converter> = Arc::new(FfmpegConverter::new(ffmpeg));
    let request = DownloadRequest::new(
        url,
        settings.format,
        settings.quality,
        &settings.download_location,
    );
    let coordinator = DownloadCoordinator::new(extractor, Some(converter), settings);

    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel::<ProgressEvent>(64);
    let reporter = ProgressReporter::new(request.id(), tx, cancel.clone());

    // Ctrl-C cancels the download instead of killing the process outright
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_progress(request_label(event.job_id), &event);
        }
    });

    let result = coordinator.run(&request, &reporter).await;
    drop(reporter);
    let _ = printer.await;

    let path = result?;
    println!("Saved to {}", path.display());
    Ok(())
}

fn request_label(job_id: Uuid) -> String {
    job_id.simple().to_string()[..8].to_string()
}

fn print_progress(label: String, event: &ProgressEvent) {
    match &event.status {
        ProgressStatus::Downloading => {
            let total = event
                .total_bytes
                .map(format_bytes)
                .unwrap_or_else(|| "?".to_string());
            let speed = event.speed.map(format_speed).unwrap_or_default();
            let eta = event
                .eta()
                .map(|eta| format!(" ETA {}", format_duration(eta)))
                .unwrap_or_default();
            println!(
                "[{}] {:5.1}% {} / {} {}{}",
                label,
                event.fraction() * 100.0,
                format_bytes(event.downloaded_bytes),
                total,
                speed,
                eta
            );
        }
        ProgressStatus::Failed { error } => eprintln!("[{}] {}", label, error),
        status => println!("[{}] {}", label, status.label()),
    }
}
