//! Post-download conversion through ffmpeg

pub mod ffmpeg;
pub mod plan;

pub use ffmpeg::FfmpegConverter;
pub use plan::ConversionPlan;

use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// What a downloaded file is turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionTarget {
    /// Audio only, encoded with libmp3lame at `bitrate` (e.g. "192k")
    Mp3 { bitrate: String },
    /// Video stream copied, audio re-encoded to AAC, MP4 container
    Mp4,
}

impl ConversionTarget {
    pub fn extension(&self) -> &'static str {
        match self {
            ConversionTarget::Mp3 { .. } => "mp3",
            ConversionTarget::Mp4 => "mp4",
        }
    }

    /// Where the converted file goes: next to the input with the target
    /// extension, or `<stem>.converted.<ext>` when that would overwrite
    /// the input itself.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let natural = input.with_extension(self.extension());
        if natural == input {
            input.with_extension(format!("converted.{}", self.extension()))
        } else {
            natural
        }
    }
}

#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `input` and return the path of the new file
    async fn convert(&self, input: &Path, target: &ConversionTarget) -> Result<PathBuf>;
}
