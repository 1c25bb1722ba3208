use crate::downloader::{DownloadRequest, ProgressReporter};
use crate::extractor::models::VideoMetadata;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Core trait for video extractors
///
/// This trait isolates the application from the specific extraction tool,
/// and lets tests substitute a scripted fake.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns a unique identifier for this extractor (e.g. "yt-dlp")
    fn id(&self) -> &'static str;

    /// Fetch title, thumbnail and available formats without downloading
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata>;

    /// Download the media described by `request` into its output directory,
    /// reporting transfer progress. Returns the path of the written file.
    async fn download(
        &self,
        request: &DownloadRequest,
        reporter: &ProgressReporter,
    ) -> Result<PathBuf>;
}
