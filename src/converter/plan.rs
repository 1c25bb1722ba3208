//! Decides whether a finished download needs converting

use super::ConversionTarget;
use crate::downloader::OutputFormat;
use crate::utils::error::{GrabError, Result};
use crate::utils::AppSettings;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    pub target: ConversionTarget,
    /// Delete the downloaded file once the converted one exists
    pub replace_original: bool,
}

impl ConversionPlan {
    /// `None` when the downloaded file is already what the user asked for.
    ///
    /// MP3 output always goes through the converter. MP4 output is only
    /// remuxed when yt-dlp could not deliver an .mp4 container.
    pub fn for_download(format: OutputFormat, downloaded: &Path, settings: &AppSettings) -> Option<Self> {
        match format {
            OutputFormat::Mp3 => Some(Self {
                target: ConversionTarget::Mp3 {
                    bitrate: settings.mp3_bitrate.clone(),
                },
                replace_original: !settings.keep_original,
            }),
            OutputFormat::Mp4 => {
                let is_mp4 = downloaded
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("mp4"));
                if is_mp4 {
                    None
                } else {
                    Some(Self {
                        target: ConversionTarget::Mp4,
                        replace_original: true,
                    })
                }
            }
        }
    }

    /// Remove the original when the plan says so and give the converted
    /// file its final name. Returns the path the user should see.
    pub async fn settle(&self, original: &Path, converted: PathBuf) -> Result<PathBuf> {
        if !self.replace_original || converted == original {
            return Ok(converted);
        }

        tokio::fs::remove_file(original).await.map_err(GrabError::disk)?;
        debug!("Removed original {}", original.display());

        // A `.converted.` name was only needed while the original existed
        let natural = original.with_extension(self.target.extension());
        if natural != converted && !tokio::fs::try_exists(&natural).await.unwrap_or(false) {
            tokio::fs::rename(&converted, &natural)
                .await
                .map_err(GrabError::disk)?;
            info!("Renamed {} to {}", converted.display(), natural.display());
            return Ok(natural);
        }

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(keep_original: bool) -> AppSettings {
        AppSettings {
            keep_original,
            mp3_bitrate: "256k".to_string(),
            ..AppSettings::default()
        }
    }

    #[test]
    fn test_mp3_always_converts() {
        let plan = ConversionPlan::for_download(OutputFormat::Mp3, Path::new("a.m4a"), &settings(false)).unwrap();
        assert_eq!(
            plan.target,
            ConversionTarget::Mp3 {
                bitrate: "256k".to_string()
            }
        );
        assert!(plan.replace_original);

        let plan = ConversionPlan::for_download(OutputFormat::Mp3, Path::new("a.mp3"), &settings(true)).unwrap();
        assert!(!plan.replace_original);
    }

    #[test]
    fn test_mp4_only_when_container_differs() {
        assert!(ConversionPlan::for_download(OutputFormat::Mp4, Path::new("v.mp4"), &settings(false)).is_none());
        assert!(ConversionPlan::for_download(OutputFormat::Mp4, Path::new("v.MP4"), &settings(false)).is_none());

        let plan = ConversionPlan::for_download(OutputFormat::Mp4, Path::new("v.webm"), &settings(true)).unwrap();
        assert_eq!(plan.target, ConversionTarget::Mp4);
        assert!(plan.replace_original);
    }

    #[tokio::test]
    async fn test_settle_replaces_original() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("song.webm");
        let converted = dir.path().join("song.mp3");
        std::fs::write(&original, b"webm").unwrap();
        std::fs::write(&converted, b"mp3").unwrap();

        let plan = ConversionPlan::for_download(OutputFormat::Mp3, &original, &settings(false)).unwrap();
        let final_path = plan.settle(&original, converted.clone()).await.unwrap();

        assert_eq!(final_path, converted);
        assert!(!original.exists());
    }

    #[tokio::test]
    async fn test_settle_keeps_original_when_asked() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("song.webm");
        let converted = dir.path().join("song.mp3");
        std::fs::write(&original, b"webm").unwrap();
        std::fs::write(&converted, b"mp3").unwrap();

        let plan = ConversionPlan::for_download(OutputFormat::Mp3, &original, &settings(true)).unwrap();
        plan.settle(&original, converted).await.unwrap();
        assert!(original.exists());
    }

    #[tokio::test]
    async fn test_settle_renames_converted_copy() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("song.mp3");
        let converted = dir.path().join("song.converted.mp3");
        std::fs::write(&original, b"old").unwrap();
        std::fs::write(&converted, b"new").unwrap();

        let plan = ConversionPlan::for_download(OutputFormat::Mp3, &original, &settings(false)).unwrap();
        let final_path = plan.settle(&original, converted.clone()).await.unwrap();

        assert_eq!(final_path, original);
        assert_eq!(std::fs::read(&original).unwrap(), b"new");
        assert!(!converted.exists());
    }
}
