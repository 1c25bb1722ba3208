//! Application configuration
//!
//! Settings are read once at startup from an optional JSON file and then
//! overridden by command line flags. They are never written back.

use crate::downloader::{OutputFormat, Quality};
use crate::utils::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default output directory
    pub download_location: PathBuf,

    /// Preselected output format
    pub format: OutputFormat,

    /// Preselected quality
    pub quality: Quality,

    /// MP3 bitrate handed to ffmpeg, e.g. "192k"
    pub mp3_bitrate: String,

    /// Keep the downloaded file next to the converted one
    pub keep_original: bool,

    /// Explicit yt-dlp binary; discovered when unset
    pub ytdlp_path: Option<PathBuf>,

    /// Explicit ffmpeg binary; discovered when unset
    pub ffmpeg_path: Option<PathBuf>,

    /// Bounding box for the preview image
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,

    /// Timeout for the thumbnail request (seconds)
    pub thumbnail_timeout_secs: u64,

    /// Accepted relative difference between reported and written size
    pub size_tolerance: f64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            download_location: paths::get_downloads_dir(),
            format: OutputFormat::Mp4,
            quality: Quality::Best,
            mp3_bitrate: "192k".to_string(),
            keep_original: false,
            ytdlp_path: None,
            ffmpeg_path: None,
            thumbnail_width: 420,
            thumbnail_height: 240,
            thumbnail_timeout_secs: 15,
            size_tolerance: 0.10,
        }
    }
}

impl AppSettings {
    /// Read settings from a JSON file. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&raw)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        Ok(settings.validated())
    }

    /// Load from `path`, or from the default settings file when `path` is
    /// `None`. Falls back to defaults on any error.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let candidate = match path {
            Some(p) => p.to_path_buf(),
            None => paths::get_settings_path(),
        };

        if !candidate.exists() {
            if path.is_some() {
                warn!("Settings file {} does not exist, using defaults", candidate.display());
            } else {
                debug!("No settings file at {}, using defaults", candidate.display());
            }
            return Self::default();
        }

        match Self::load_from(&candidate) {
            Ok(settings) => {
                debug!("Loaded settings from {}", candidate.display());
                settings
            }
            Err(e) => {
                warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }
        }
    }

    /// Enforce sane values on anything read from disk
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.thumbnail_width == 0 {
            self.thumbnail_width = defaults.thumbnail_width;
        }
        if self.thumbnail_height == 0 {
            self.thumbnail_height = defaults.thumbnail_height;
        }
        if self.thumbnail_timeout_secs == 0 {
            self.thumbnail_timeout_secs = defaults.thumbnail_timeout_secs;
        }
        if self.mp3_bitrate.trim().is_empty() {
            self.mp3_bitrate = defaults.mp3_bitrate;
        }
        if !self.size_tolerance.is_finite() || self.size_tolerance < 0.0 {
            self.size_tolerance = defaults.size_tolerance;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppSettings::default();
        assert_eq!(config.format, OutputFormat::Mp4);
        assert_eq!(config.quality, Quality::Best);
        assert_eq!(config.mp3_bitrate, "192k");
        assert!(config.thumbnail_width > 0 && config.thumbnail_height > 0);
        assert!(config.download_location.is_absolute());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "format": "mp3", "keep_original": true }"#).unwrap();

        let config = AppSettings::load_from(&path).unwrap();
        assert_eq!(config.format, OutputFormat::Mp3);
        assert!(config.keep_original);
        assert_eq!(config.thumbnail_width, 420);
        assert_eq!(config.quality, Quality::Best);
    }

    #[test]
    fn test_quality_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "quality": "p720" }"#).unwrap();

        let config = AppSettings::load_from(&path).unwrap();
        assert_eq!(config.quality, Quality::P720);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(AppSettings::load_from(&path).is_err());
        assert_eq!(AppSettings::load_or_default(Some(&path)), AppSettings::default());
    }

    #[test]
    fn test_missing_explicit_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(AppSettings::load_or_default(Some(&path)), AppSettings::default());
    }

    #[test]
    fn test_validation_restores_minimums() {
        let mut config = AppSettings::default();
        config.thumbnail_width = 0;
        config.thumbnail_timeout_secs = 0;
        config.mp3_bitrate = "  ".to_string();
        config.size_tolerance = -1.0;

        let config = config.validated();
        assert_eq!(config.thumbnail_width, 420);
        assert_eq!(config.thumbnail_timeout_secs, 15);
        assert_eq!(config.mp3_bitrate, "192k");
        assert!((config.size_tolerance - 0.10).abs() < f64::EPSILON);
    }
}
