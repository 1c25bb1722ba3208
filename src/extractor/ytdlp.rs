//! yt-dlp wrapper for video extraction
//!
//! Metadata comes from `yt-dlp --dump-json`. Downloads run yt-dlp with a
//! machine readable progress template and stream its output line by line,
//! so progress reaches the UI while the transfer is still running.

use crate::downloader::{validate_url, DownloadRequest, OutputFormat, ProgressReporter, Quality};
use crate::extractor::models::{FormatOption, VideoMetadata};
use crate::extractor::output::{
    classify_error, file_print_template, parse_file_line, parse_progress_line, progress_template,
    ProgressAccumulator,
};
use crate::extractor::traits::Extractor;
use crate::utils::error::{GrabError, Result};
use crate::utils::tools::{self, Tool};
use crate::utils::AppSettings;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, info, warn};

/// Lines of stderr kept for error classification
const STDERR_TAIL: usize = 40;

/// Video extractor backed by the yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    ytdlp_path: Option<PathBuf>,
    ffmpeg_path: Option<PathBuf>,
}

impl YtDlpExtractor {
    /// Locate yt-dlp and ffmpeg using the configured paths first.
    ///
    /// A missing yt-dlp is not an error here: the window still opens and
    /// every request fails with `ToolNotFound` until it is installed.
    pub fn new(settings: &AppSettings) -> Self {
        let ytdlp_path = tools::locate(Tool::YtDlp, settings.ytdlp_path.as_deref());
        let ffmpeg_path = tools::locate(Tool::Ffmpeg, settings.ffmpeg_path.as_deref());
        Self::with_binaries(ytdlp_path, ffmpeg_path)
    }

    pub fn with_binaries(ytdlp_path: Option<PathBuf>, ffmpeg_path: Option<PathBuf>) -> Self {
        Self {
            ytdlp_path,
            ffmpeg_path,
        }
    }

    pub fn ytdlp_path(&self) -> Option<&Path> {
        self.ytdlp_path.as_deref()
    }

    fn binary(&self) -> Result<&Path> {
        self.ytdlp_path
            .as_deref()
            .ok_or_else(|| GrabError::ToolNotFound(Tool::YtDlp.name().to_string()))
    }
}

/// yt-dlp `-f` expression for the user's choices
pub fn format_selector(format: OutputFormat, quality: Quality) -> String {
    match (format, quality.max_height()) {
        (OutputFormat::Mp3, _) => "bestaudio/best".to_string(),
        (OutputFormat::Mp4, None) => "bestvideo+bestaudio/best".to_string(),
        (OutputFormat::Mp4, Some(h)) => {
            format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]")
        }
    }
}

/// Arguments for a metadata-only run
pub fn metadata_args(url: &str) -> Vec<OsString> {
    ["--dump-json", "--no-download", "--no-warnings", "--no-playlist", url]
        .into_iter()
        .map(OsString::from)
        .collect()
}

/// Arguments for a download run
pub fn download_args(request: &DownloadRequest, ffmpeg: Option<&Path>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-f".into(),
        format_selector(request.format(), request.quality()).into(),
        "-o".into(),
        request.output_dir().join("%(title)s.%(ext)s").into_os_string(),
        "--no-playlist".into(),
        "--newline".into(),
        "--progress".into(),
        "--no-simulate".into(),
        "--progress-template".into(),
        progress_template().into(),
        "--print".into(),
        file_print_template().into(),
    ];

    if request.format() == OutputFormat::Mp4 {
        args.push("--merge-output-format".into());
        args.push("mp4".into());
    }

    if let Some(ffmpeg) = ffmpeg {
        args.push("--ffmpeg-location".into());
        args.push(ffmpeg.as_os_str().to_os_string());
    }

    args.push(request.url().into());
    args
}

/// Parse `--dump-json` output into metadata.
///
/// Sites that serve a single direct file report no `formats` list; the top
/// level entry then stands in as the only format.
pub fn parse_metadata(stdout: &str, requested_url: &str) -> Result<VideoMetadata> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| GrabError::ExtractionFailed("yt-dlp printed no metadata".to_string()))?;

    let mut value: Value = serde_json::from_str(line)?;
    if let Some(obj) = value.as_object_mut() {
        if obj.get("formats").is_some_and(Value::is_null) {
            obj.remove("formats");
        }
    }

    let mut metadata: VideoMetadata = serde_json::from_value(value.clone())?;

    if metadata.formats.is_empty() && value.get("url").and_then(Value::as_str).is_some() {
        let single: FormatOption = serde_json::from_value(value)?;
        debug!("No format list, using the direct entry {}", single.format_id);
        metadata.formats.push(single);
    }

    if metadata.webpage_url.is_empty() {
        metadata.webpage_url = requested_url.to_string();
    }
    metadata.title = metadata.title.trim().to_string();

    if metadata.title.is_empty() {
        return Err(GrabError::UnsupportedFormat(
            "the site returned no title for this video".to_string(),
        ));
    }
    if metadata.media_formats().next().is_none() {
        return Err(GrabError::UnsupportedFormat(
            "no downloadable formats found".to_string(),
        ));
    }

    Ok(metadata)
}

fn spawn_error(err: io::Error) -> GrabError {
    if err.kind() == io::ErrorKind::NotFound {
        GrabError::ToolNotFound(Tool::YtDlp.name().to_string())
    } else {
        GrabError::ExtractionFailed(format!("failed to start yt-dlp: {}", err))
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let parsed = validate_url(url)?;
        let ytdlp = self.binary()?;
        debug!("Extracting video info for URL: {}", parsed);

        let output = AsyncCommand::new(ytdlp)
            .args(metadata_args(parsed.as_str()))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("yt-dlp extraction failed: {}", stderr.trim());
            return Err(classify_error(&stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata = parse_metadata(&stdout, parsed.as_str())?;
        info!(
            "Fetched \"{}\" ({} formats)",
            metadata.title,
            metadata.formats.len()
        );
        Ok(metadata)
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        reporter: &ProgressReporter,
    ) -> Result<PathBuf> {
        validate_url(request.url())?;
        let ytdlp = self.binary()?;
        let args = download_args(request, self.ffmpeg_path.as_deref());
        debug!("Running {} {:?}", ytdlp.display(), args);

        let mut child = AsyncCommand::new(ytdlp)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(GrabError::ExtractionFailed(
                "yt-dlp output streams unavailable".to_string(),
            ));
        };
        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();

        let mut accumulator = ProgressAccumulator::new();
        let mut final_path: Option<PathBuf> = None;
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);
        let mut out_open = true;
        let mut err_open = true;

        while out_open || err_open {
            let (line, from_stderr) = tokio::select! {
                line = out_lines.next_line(), if out_open => (line, false),
                line = err_lines.next_line(), if err_open => (line, true),
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    if from_stderr {
                        err_open = false;
                    } else {
                        out_open = false;
                    }
                    continue;
                }
                Err(e) => {
                    warn!("Stopped reading yt-dlp output: {}", e);
                    if from_stderr {
                        err_open = false;
                    } else {
                        out_open = false;
                    }
                    continue;
                }
            };

            if let Some(progress) = parse_progress_line(&line) {
                let overall = accumulator.push(progress);
                reporter
                    .downloading(overall.downloaded, overall.total, overall.speed)
                    .await;
            } else if let Some(path) = parse_file_line(&line) {
                debug!("yt-dlp wrote {}", path.display());
                final_path = Some(path);
            } else if from_stderr {
                if stderr_tail.len() == STDERR_TAIL {
                    stderr_tail.pop_front();
                }
                stderr_tail.push_back(line);
            } else {
                debug!("yt-dlp: {}", line);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| GrabError::ExtractionFailed(format!("waiting for yt-dlp: {}", e)))?;

        if !status.success() {
            let stderr = Vec::from(stderr_tail).join("\n");
            error!("yt-dlp exited with {}: {}", status, stderr.trim());
            return Err(classify_error(&stderr));
        }

        let path = final_path.ok_or_else(|| {
            GrabError::ExtractionFailed("yt-dlp did not report the downloaded file".to_string())
        })?;
        let path = if path.is_relative() {
            request.output_dir().join(path)
        } else {
            path
        };

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(GrabError::DiskWriteFailure(format!(
                "{} is missing after download",
                path.display()
            )));
        }

        info!("Downloaded {}", path.display());
        Ok(path)
    }
}
