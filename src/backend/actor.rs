use super::messages::{BackendCommand, BackendEvent};
use crate::converter::{Converter, FfmpegConverter};
use crate::downloader::{DownloadCoordinator, DownloadRequest, ProgressReporter};
use crate::extractor::{Extractor, YtDlpExtractor};
use crate::thumbnail::ThumbnailFetcher;
use crate::utils::{AppSettings, GrabError, Tool, ToolReport};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Buffered progress events per download
const PROGRESS_BUFFER: usize = 64;

struct ActiveJob {
    id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveJob {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Owns the extractor, thumbnail fetcher and coordinator, and runs at most
/// one download at a time on behalf of the UI.
pub struct BackendActor {
    receiver: mpsc::Receiver<BackendCommand>,
    sender: mpsc::Sender<BackendEvent>,

    // Components
    extractor: Arc<dyn Extractor>,
    thumbnails: Option<Arc<ThumbnailFetcher>>,
    coordinator: Arc<DownloadCoordinator>,
    ffmpeg_available: bool,

    active: Option<ActiveJob>,
}

impl BackendActor {
    /// Detect external tools and build the real components
    pub async fn new(
        settings: AppSettings,
        receiver: mpsc::Receiver<BackendCommand>,
        sender: mpsc::Sender<BackendEvent>,
    ) -> Self {
        let detect_settings = settings.clone();
        let report = tokio::task::spawn_blocking(move || ToolReport::detect(&detect_settings))
            .await
            .unwrap_or_else(|e| {
                error!("Tool detection panicked: {}", e);
                ToolReport::default()
            });

        for warning in report.warnings() {
            warn!("{}", warning);
        }
        let _ = sender.send(BackendEvent::ToolsChecked(report.clone())).await;

        let extractor: Arc<dyn Extractor> = Arc::new(YtDlpExtractor::with_binaries(
            report.ytdlp.clone(),
            report.ffmpeg.clone(),
        ));
        let converter = report
            .ffmpeg
            .clone()
            .map(|path| Arc::new(FfmpegConverter::new(path)) as Arc<dyn Converter>);

        let thumbnails = match ThumbnailFetcher::new(&settings) {
            Ok(fetcher) => Some(Arc::new(fetcher)),
            Err(e) => {
                warn!("Thumbnails disabled: {}", e);
                None
            }
        };

        Self::with_components(receiver, sender, extractor, converter, thumbnails, settings)
    }

    /// Build an actor around already constructed components
    pub fn with_components(
        receiver: mpsc::Receiver<BackendCommand>,
        sender: mpsc::Sender<BackendEvent>,
        extractor: Arc<dyn Extractor>,
        converter: Option<Arc<dyn Converter>>,
        thumbnails: Option<Arc<ThumbnailFetcher>>,
        settings: AppSettings,
    ) -> Self {
        let ffmpeg_available = converter.is_some();
        let coordinator = Arc::new(DownloadCoordinator::new(
            extractor.clone(),
            converter,
            settings,
        ));

        Self {
            receiver,
            sender,
            extractor,
            thumbnails,
            coordinator,
            ffmpeg_available,
            active: None,
        }
    }

    pub async fn run(mut self) {
        info!("BackendActor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                BackendCommand::FetchMetadata { url } => self.handle_fetch_metadata(url),
                BackendCommand::StartDownload(request) => {
                    self.handle_start_download(request).await;
                }
                BackendCommand::CancelDownload => self.handle_cancel().await,
                BackendCommand::Shutdown => {
                    info!("BackendActor shutting down");
                    break;
                }
            }
        }

        if let Some(job) = self.active.take() {
            job.cancel.cancel();
        }
    }

    /// Metadata and thumbnail lookups run in their own task so the actor
    /// stays free to handle a Cancel meanwhile.
    fn handle_fetch_metadata(&self, url: String) {
        let extractor = self.extractor.clone();
        let thumbnails = self.thumbnails.clone();
        let sender = self.sender.clone();

        tokio::spawn(async move {
            let result = extractor.fetch_metadata(&url).await;
            let thumbnail_url = result.as_ref().ok().and_then(|m| m.thumbnail.clone());

            if sender
                .send(BackendEvent::MetadataFetched {
                    url: url.clone(),
                    result,
                })
                .await
                .is_err()
            {
                return;
            }

            if let (Some(fetcher), Some(thumbnail_url)) = (thumbnails, thumbnail_url) {
                let result = fetcher.fetch(&thumbnail_url).await;
                if let Err(e) = &result {
                    warn!("Thumbnail unavailable: {}", e);
                }
                let _ = sender.send(BackendEvent::ThumbnailLoaded { url, result }).await;
            }
        });
    }

    async fn handle_start_download(&mut self, request: DownloadRequest) {
        let job_id = request.id();

        if self.active.as_ref().is_some_and(ActiveJob::is_running) {
            debug!("Rejecting download {}: another one is active", job_id);
            let _ = self
                .sender
                .send(BackendEvent::DownloadRejected {
                    job_id,
                    error: GrabError::Busy,
                })
                .await;
            return;
        }

        if !self.ffmpeg_available {
            let _ = self
                .sender
                .send(BackendEvent::DownloadRejected {
                    job_id,
                    error: GrabError::ToolNotFound(Tool::Ffmpeg.name().to_string()),
                })
                .await;
            return;
        }

        let cancel = CancellationToken::new();
        let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_BUFFER);
        let reporter = ProgressReporter::new(job_id, progress_tx, cancel.clone());
        let coordinator = self.coordinator.clone();
        let sender = self.sender.clone();
        let forward_cancel = cancel.clone();

        let _ = sender.send(BackendEvent::DownloadStarted { job_id }).await;

        let handle = tokio::spawn(async move {
            let run = async move {
                // The reporter is dropped when the run ends, closing the channel
                let _ = coordinator.run(&request, &reporter).await;
            };
            let forward = async move {
                while let Some(event) = progress_rx.recv().await {
                    if forward_cancel.is_cancelled() {
                        break;
                    }
                    let sent = tokio::select! {
                        biased;
                        _ = forward_cancel.cancelled() => false,
                        sent = sender.send(BackendEvent::Progress(event)) => sent.is_ok(),
                    };
                    if !sent {
                        break;
                    }
                }
            };
            tokio::join!(run, forward);
        });

        self.active = Some(ActiveJob {
            id: job_id,
            cancel,
            handle,
        });
    }

    async fn handle_cancel(&mut self) {
        match self.active.take() {
            Some(job) if job.is_running() => {
                info!("Cancelling download {}", job.id);
                job.cancel.cancel();
                let _ = self
                    .sender
                    .send(BackendEvent::DownloadCancelled { job_id: job.id })
                    .await;
            }
            _ => debug!("Cancel requested with no active download"),
        }
    }
}
