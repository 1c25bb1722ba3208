//! ffmpeg subprocess wrapper

use super::{ConversionTarget, Converter};
use crate::utils::error::{GrabError, Result};
use crate::utils::tools::Tool;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, info};

/// Lines of ffmpeg stderr carried in a `ConversionFailure`
const STDERR_TAIL_LINES: usize = 8;

pub struct FfmpegConverter {
    ffmpeg_path: PathBuf,
}

impl FfmpegConverter {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

/// Full ffmpeg argument list for one conversion
pub fn ffmpeg_args(input: &Path, output: &Path, target: &ConversionTarget) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_os_string());

    match target {
        ConversionTarget::Mp3 { bitrate } => {
            args.extend(["-vn", "-codec:a", "libmp3lame", "-b:a"].map(OsString::from));
            args.push(bitrate.into());
        }
        ConversionTarget::Mp4 => {
            args.extend(["-c:v", "copy", "-c:a", "aac"].map(OsString::from));
        }
    }

    args.push(output.as_os_str().to_os_string());
    args
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl Converter for FfmpegConverter {
    async fn convert(&self, input: &Path, target: &ConversionTarget) -> Result<PathBuf> {
        let output = target.output_path(input);
        let args = ffmpeg_args(input, &output, target);
        debug!("Running {} {:?}", self.ffmpeg_path.display(), args);

        let result = AsyncCommand::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    GrabError::ToolNotFound(Tool::Ffmpeg.name().to_string())
                } else {
                    GrabError::ConversionFailure(format!("failed to start ffmpeg: {}", e))
                }
            })?;

        if !result.status.success() {
            let tail = stderr_tail(&result.stderr);
            error!("ffmpeg exited with {}: {}", result.status, tail);
            return Err(GrabError::ConversionFailure(if tail.is_empty() {
                format!("ffmpeg exited with {}", result.status)
            } else {
                tail
            }));
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(GrabError::ConversionFailure(format!(
                "ffmpeg reported success but {} was not written",
                output.display()
            )));
        }

        info!("Converted {} -> {}", input.display(), output.display());
        Ok(output)
    }
}
