//! Runs one download from URL to finished file

use crate::converter::{ConversionPlan, Converter};
use crate::downloader::progress::{ProgressReporter, ProgressStatus};
use crate::downloader::request::{validate_url, DownloadRequest};
use crate::extractor::Extractor;
use crate::utils::error::{GrabError, Result};
use crate::utils::tools::Tool;
use crate::utils::AppSettings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drives a [`DownloadRequest`] through download and optional conversion,
/// reporting every stage through a [`ProgressReporter`].
pub struct DownloadCoordinator {
    extractor: Arc<dyn Extractor>,
    converter: Option<Arc<dyn Converter>>,
    settings: AppSettings,
}

impl DownloadCoordinator {
    /// `converter` is `None` when ffmpeg is unavailable; downloads that
    /// need converting then fail with `ToolNotFound`.
    pub fn new(
        extractor: Arc<dyn Extractor>,
        converter: Option<Arc<dyn Converter>>,
        settings: AppSettings,
    ) -> Self {
        Self {
            extractor,
            converter,
            settings,
        }
    }

    /// Run the download to completion.
    ///
    /// Ends with exactly one terminal event (`Done` or `Failed`) unless the
    /// reporter's token is cancelled, in which case the in-flight work is
    /// dropped, nothing more is emitted and `Cancelled` is returned.
    pub async fn run(&self, request: &DownloadRequest, reporter: &ProgressReporter) -> Result<PathBuf> {
        info!(
            "Starting download {} ({} / {}) -> {}",
            request.id(),
            request.format(),
            request.quality(),
            request.output_dir().display()
        );

        let cancel = reporter.cancel_token().clone();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GrabError::Cancelled),
            result = self.execute(request, reporter) => result,
        };

        if reporter.is_cancelled() {
            info!("Download {} cancelled", request.id());
            return Err(GrabError::Cancelled);
        }

        match outcome {
            Ok(path) => {
                reporter
                    .emit(ProgressStatus::Done { path: path.clone() })
                    .await;
                let elapsed = chrono::Utc::now() - request.created_at();
                info!(
                    "Download {} finished in {}s: {}",
                    request.id(),
                    elapsed.num_seconds(),
                    path.display()
                );
                Ok(path)
            }
            Err(err) => {
                error!("Download {} failed: {}", request.id(), err);
                reporter
                    .emit(ProgressStatus::Failed { error: err.clone() })
                    .await;
                Err(err)
            }
        }
    }

    async fn execute(&self, request: &DownloadRequest, reporter: &ProgressReporter) -> Result<PathBuf> {
        validate_url(request.url())?;
        reporter.emit(ProgressStatus::Fetching).await;

        tokio::fs::create_dir_all(request.output_dir())
            .await
            .map_err(GrabError::disk)?;

        let downloaded = self.extractor.download(request, reporter).await?;
        let size = verify_size(&downloaded, reporter.reported_total(), self.settings.size_tolerance).await?;
        reporter.finish_transfer(size);

        let Some(plan) = ConversionPlan::for_download(request.format(), &downloaded, &self.settings) else {
            return Ok(downloaded);
        };

        let converter = self
            .converter
            .as_ref()
            .ok_or_else(|| GrabError::ToolNotFound(Tool::Ffmpeg.name().to_string()))?;

        reporter.emit(ProgressStatus::Converting).await;
        debug!("Converting {} with plan {:?}", downloaded.display(), plan);
        let converted = converter.convert(&downloaded, &plan.target).await?;
        plan.settle(&downloaded, converted).await
    }
}

/// Whether `actual` is within `tolerance` (relative) of `expected`
pub fn size_within_tolerance(actual: u64, expected: u64, tolerance: f64) -> bool {
    if expected == 0 {
        return actual == 0;
    }
    let diff = actual.abs_diff(expected) as f64;
    diff / expected as f64 <= tolerance
}

/// Compare the written file with the size yt-dlp reported.
/// A mismatch is only logged: muxing changes sizes legitimately.
async fn verify_size(path: &Path, reported: Option<u64>, tolerance: f64) -> Result<u64> {
    let actual = tokio::fs::metadata(path).await.map_err(GrabError::disk)?.len();

    match reported {
        Some(expected) if !size_within_tolerance(actual, expected, tolerance) => {
            warn!(
                "Size mismatch for {}: wrote {} bytes, expected about {}",
                path.display(),
                actual,
                expected
            );
        }
        Some(expected) => debug!("Size check passed: {} of {} bytes", actual, expected),
        None => debug!("No reported size for {}, skipping check", path.display()),
    }

    Ok(actual)
}
