//! Download requests and the choices a user makes before starting one

use crate::utils::error::GrabError;
use chrono::{DateTime, Utc};
use path_absolutize::Absolutize;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Output container the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Best video merged with best audio, delivered as MP4
    #[default]
    Mp4,
    /// Audio only, converted to MP3
    Mp3,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Mp4, OutputFormat::Mp3];

    pub fn is_audio_only(&self) -> bool {
        matches!(self, OutputFormat::Mp3)
    }

    /// File extension of the final file
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Mp4 => write!(f, "MP4"),
            OutputFormat::Mp3 => write!(f, "MP3"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" | "video" => Ok(OutputFormat::Mp4),
            "mp3" | "audio" => Ok(OutputFormat::Mp3),
            other => Err(format!("unknown format '{}', expected mp4 or mp3", other)),
        }
    }
}

/// Upper bound on video height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Best,
    P1080,
    P720,
    P480,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Best, Quality::P1080, Quality::P720, Quality::P480];

    /// Maximum video height, `None` for best available
    pub fn max_height(&self) -> Option<u32> {
        match self {
            Quality::Best => None,
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
        }
    }

    /// Get string representation for display
    pub fn label(&self) -> &'static str {
        match self {
            Quality::Best => "Best Available",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.trim_end_matches('p') {
            "best" | "best available" => Ok(Quality::Best),
            "1080" => Ok(Quality::P1080),
            "720" => Ok(Quality::P720),
            "480" => Ok(Quality::P480),
            _ => Err(format!(
                "unknown quality '{}', expected best, 1080, 720 or 480",
                s
            )),
        }
    }
}

/// A single download, fixed at the moment the user presses Download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    id: Uuid,
    url: String,
    format: OutputFormat,
    quality: Quality,
    output_dir: PathBuf,
    created_at: DateTime<Utc>,
}

impl DownloadRequest {
    /// Build a request. The output directory is made absolute against the
    /// current directory; the URL is validated when the download runs.
    pub fn new(
        url: impl Into<String>,
        format: OutputFormat,
        quality: Quality,
        output_dir: impl AsRef<Path>,
    ) -> Self {
        let output_dir = output_dir.as_ref();
        let output_dir = output_dir
            .absolutize()
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| output_dir.to_path_buf());

        Self {
            id: Uuid::new_v4(),
            url: url.into().trim().to_string(),
            format,
            quality,
            output_dir,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Accept only absolute http(s) URLs with a host
pub fn validate_url(url: &str) -> Result<Url, GrabError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(GrabError::InvalidUrl("URL is empty".to_string()));
    }

    let parsed = Url::parse(trimmed).map_err(|e| GrabError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(GrabError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                other, trimmed
            )))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(GrabError::InvalidUrl(format!("missing host in {}", trimmed)));
    }

    Ok(parsed)
}
