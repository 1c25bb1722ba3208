//! Main GUI application

use crate::backend::{self, BackendCommand, BackendEvent, BackendHandle};
use crate::downloader::{
    validate_url, DownloadRequest, OutputFormat, ProgressEvent, ProgressStatus, Quality,
};
use crate::extractor::VideoMetadata;
use crate::gui::{clipboard, views};
use crate::utils::{AppSettings, GrabError, Tool, ToolReport};
use iced::widget::image;
use iced::{Application, Command, Element, Subscription, Theme};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Preview of the URL the user asked about
#[derive(Debug, Clone)]
pub enum PreviewState {
    Empty,
    Loading {
        url: String,
    },
    Loaded {
        url: String,
        metadata: VideoMetadata,
        thumbnail: Option<image::Handle>,
    },
    Failed {
        url: String,
        error: GrabError,
    },
}

impl PreviewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PreviewState::Loading { .. })
    }
}

/// The single download this window manages
#[derive(Debug, Clone)]
pub enum DownloadState {
    Idle,
    Running {
        job_id: Uuid,
        latest: Option<ProgressEvent>,
    },
    Finished {
        path: PathBuf,
    },
    Failed {
        error: GrabError,
    },
}

impl DownloadState {
    pub fn is_running(&self) -> bool {
        matches!(self, DownloadState::Running { .. })
    }

    fn job_id(&self) -> Option<Uuid> {
        match self {
            DownloadState::Running { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }
}

/// Main application state
pub struct ReelgrabApp {
    settings: AppSettings,
    backend: Option<BackendHandle>,
    tools: Option<ToolReport>,

    // UI State
    pub(crate) url_input: String,
    pub(crate) url_error: Option<String>,
    pub(crate) preview: PreviewState,
    pub(crate) format: OutputFormat,
    pub(crate) quality: Quality,
    pub(crate) output_dir: String,
    pub(crate) download: DownloadState,
    pub(crate) status_message: String,
    pub(crate) error_banner: Option<String>,
    pub(crate) warnings: Vec<String>,
}

/// Application messages
#[derive(Debug, Clone)]
pub enum Message {
    // Input events
    UrlInputChanged(String),
    PasteFromClipboard,
    ClearUrlInput,
    LoadPreview,

    // Choices
    FormatSelected(OutputFormat),
    QualitySelected(Quality),
    OutputDirChanged(String),
    BrowseOutputDir,
    OutputDirPicked(Option<PathBuf>),

    // Download control
    DownloadPressed,
    CancelPressed,
    OpenFolder,

    // Banners
    DismissError,
    DismissWarning(usize),

    Backend(BackendEvent),
}

impl Application for ReelgrabApp {
    type Executor = iced::executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = AppSettings;

    fn new(settings: Self::Flags) -> (Self, Command<Message>) {
        let app = Self {
            url_input: String::new(),
            url_error: None,
            preview: PreviewState::Empty,
            format: settings.format,
            quality: settings.quality,
            output_dir: settings.download_location.display().to_string(),
            download: DownloadState::Idle,
            status_message: "Ready".to_string(),
            error_banner: None,
            warnings: Vec::new(),
            backend: None,
            tools: None,
            settings,
        };
        (app, Command::none())
    }

    fn title(&self) -> String {
        String::from("Reelgrab - Video Downloader")
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::UrlInputChanged(url) => {
                self.url_input = url;
                self.url_error = None;
                Command::none()
            }

            Message::PasteFromClipboard => {
                match clipboard::paste_text() {
                    Ok(content) => {
                        self.url_input = content;
                        self.url_error = None;
                        self.status_message = "URL pasted from clipboard".to_string();
                    }
                    Err(e) => {
                        self.status_message = format!("Failed to paste from clipboard: {}", e);
                    }
                }
                Command::none()
            }

            Message::ClearUrlInput => {
                self.url_input.clear();
                self.url_error = None;
                self.preview = PreviewState::Empty;
                Command::none()
            }

            Message::LoadPreview => {
                self.load_preview();
                Command::none()
            }

            Message::FormatSelected(format) => {
                self.format = format;
                Command::none()
            }

            Message::QualitySelected(quality) => {
                self.quality = quality;
                Command::none()
            }

            Message::OutputDirChanged(dir) => {
                self.output_dir = dir;
                Command::none()
            }

            Message::BrowseOutputDir => {
                let start = PathBuf::from(&self.output_dir);
                Command::perform(
                    async move {
                        rfd::AsyncFileDialog::new()
                            .set_directory(start)
                            .pick_folder()
                            .await
                            .map(|handle| handle.path().to_path_buf())
                    },
                    Message::OutputDirPicked,
                )
            }

            Message::OutputDirPicked(Some(path)) => {
                self.output_dir = path.display().to_string();
                Command::none()
            }
            Message::OutputDirPicked(None) => Command::none(),

            Message::DownloadPressed => {
                self.start_download();
                Command::none()
            }

            Message::CancelPressed => {
                if self.download.is_running() {
                    self.send(BackendCommand::CancelDownload);
                    self.status_message = "Cancelling...".to_string();
                }
                Command::none()
            }

            Message::OpenFolder => {
                let folder = match &self.download {
                    DownloadState::Finished { path } => path.parent().map(PathBuf::from),
                    _ => None,
                }
                .unwrap_or_else(|| PathBuf::from(&self.output_dir));
                if let Err(e) = open::that(&folder) {
                    warn!("Failed to open folder {}: {}", folder.display(), e);
                    self.status_message = format!("Could not open {}", folder.display());
                }
                Command::none()
            }

            Message::DismissError => {
                self.error_banner = None;
                Command::none()
            }

            Message::DismissWarning(index) => {
                if index < self.warnings.len() {
                    self.warnings.remove(index);
                }
                Command::none()
            }

            Message::Backend(event) => {
                self.handle_backend_event(event);
                Command::none()
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        views::main_view(self)
    }

    fn subscription(&self) -> Subscription<Message> {
        backend::connect(self.settings.clone()).map(Message::Backend)
    }

    fn theme(&self) -> Self::Theme {
        Theme::Light
    }
}

impl ReelgrabApp {
    /// Whether the Download button should be clickable
    pub fn can_download(&self) -> bool {
        !self.download.is_running() && !self.url_input.trim().is_empty() && self.backend.is_some()
    }

    fn send(&mut self, command: BackendCommand) -> bool {
        let sent = self
            .backend
            .as_ref()
            .map(|handle| handle.send(command))
            .unwrap_or(false);
        if !sent {
            self.error_banner = Some("The download service is not running. Restart the app".to_string());
        }
        sent
    }

    fn load_preview(&mut self) {
        let url = self.url_input.trim().to_string();
        if let Err(e) = validate_url(&url) {
            self.url_error = Some(e.user_message());
            return;
        }

        debug!("Requesting preview for {}", url);
        if self.send(BackendCommand::FetchMetadata { url: url.clone() }) {
            self.preview = PreviewState::Loading { url };
            self.status_message = "Fetching video information...".to_string();
        }
    }

    fn start_download(&mut self) {
        if self.download.is_running() {
            self.error_banner = Some(GrabError::Busy.user_message());
            return;
        }

        let url = self.url_input.trim().to_string();
        if let Err(e) = validate_url(&url) {
            self.url_error = Some(e.user_message());
            return;
        }

        // MP4 merging and MP3 conversion both need ffmpeg
        if self.tools.as_ref().is_some_and(|t| t.ffmpeg.is_none()) {
            self.error_banner = Some(format!(
                "{}. Install FFmpeg to download {} files",
                GrabError::ToolNotFound(Tool::Ffmpeg.name().to_string()).user_message(),
                self.format
            ));
            return;
        }

        let output_dir = self.output_dir.trim();
        if output_dir.is_empty() {
            self.error_banner = Some("Choose an output folder first".to_string());
            return;
        }

        let request = DownloadRequest::new(url, self.format, self.quality, output_dir);
        let job_id = request.id();
        info!("Requesting download {} of {}", job_id, request.url());

        if self.send(BackendCommand::StartDownload(request)) {
            self.error_banner = None;
            self.download = DownloadState::Running {
                job_id,
                latest: None,
            };
            self.status_message = "Starting download...".to_string();
        }
    }

    fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Ready(handle) => {
                debug!("Backend ready");
                self.backend = Some(handle);
            }

            BackendEvent::ToolsChecked(report) => {
                self.warnings = report.warnings();
                self.tools = Some(report);
            }

            BackendEvent::MetadataFetched { url, result } => {
                // Only the most recent preview request counts
                if !matches!(&self.preview, PreviewState::Loading { url: pending } if *pending == url) {
                    debug!("Ignoring stale metadata for {}", url);
                    return;
                }
                match result {
                    Ok(metadata) => {
                        if !metadata.quality_options().contains(&self.quality) {
                            self.quality = Quality::Best;
                        }
                        self.status_message = format!("Found: {}", metadata.title);
                        self.preview = PreviewState::Loaded {
                            url,
                            metadata,
                            thumbnail: None,
                        };
                    }
                    Err(error) => {
                        if matches!(error, GrabError::InvalidUrl(_)) {
                            self.url_error = Some(error.user_message());
                        }
                        self.status_message = error.to_string();
                        self.preview = PreviewState::Failed { url, error };
                    }
                }
            }

            BackendEvent::ThumbnailLoaded { url, result } => {
                if let PreviewState::Loaded {
                    url: current,
                    thumbnail,
                    ..
                } = &mut self.preview
                {
                    if *current == url {
                        if let Ok(thumb) = result {
                            *thumbnail = Some(image::Handle::from_pixels(
                                thumb.width,
                                thumb.height,
                                thumb.rgba,
                            ));
                        }
                    }
                }
            }

            BackendEvent::DownloadStarted { job_id } => {
                if self.download.job_id() == Some(job_id) {
                    self.status_message = "Download started".to_string();
                }
            }

            BackendEvent::DownloadRejected { job_id, error } => {
                if self.download.job_id() == Some(job_id) {
                    self.download = DownloadState::Idle;
                }
                self.error_banner = Some(error.user_message());
                self.status_message = error.to_string();
            }

            BackendEvent::Progress(progress) => self.apply_progress(progress),

            BackendEvent::DownloadCancelled { job_id } => {
                if self.download.job_id() == Some(job_id) {
                    self.download = DownloadState::Idle;
                    self.status_message = "Download cancelled".to_string();
                }
            }
        }
    }

    fn apply_progress(&mut self, progress: ProgressEvent) {
        if self.download.job_id() != Some(progress.job_id) {
            debug!("Ignoring progress for inactive job {}", progress.job_id);
            return;
        }

        match &progress.status {
            ProgressStatus::Done { path } => {
                self.status_message = format!("Saved to {}", path.display());
                self.download = DownloadState::Finished { path: path.clone() };
            }
            ProgressStatus::Failed { error } => {
                self.error_banner = Some(error.user_message());
                self.status_message = error.to_string();
                self.download = DownloadState::Failed {
                    error: error.clone(),
                };
            }
            _ => {
                if let DownloadState::Running { latest, .. } = &mut self.download {
                    *latest = Some(progress);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn dispatch(app: &mut ReelgrabApp, message: Message) {
        let _ = app.update(message);
    }

    fn app_with_backend(ffmpeg: bool) -> (ReelgrabApp, mpsc::Receiver<BackendCommand>) {
        let (tx, rx) = mpsc::channel(8);
        let (mut app, _) = ReelgrabApp::new(AppSettings::default());
        dispatch(&mut app, Message::Backend(BackendEvent::Ready(BackendHandle::new(tx))));
        dispatch(&mut app, Message::Backend(BackendEvent::ToolsChecked(ToolReport {
            ytdlp: Some(PathBuf::from("/usr/bin/yt-dlp")),
            ffmpeg: ffmpeg.then(|| PathBuf::from("/usr/bin/ffmpeg")),
            node_available: true,
        })));
        (app, rx)
    }

    fn started_job(rx: &mut mpsc::Receiver<BackendCommand>) -> Uuid {
        match rx.try_recv() {
            Ok(BackendCommand::StartDownload(request)) => request.id(),
            other => panic!("expected StartDownload, got {:?}", other),
        }
    }

    fn progress(job_id: Uuid, status: ProgressStatus) -> Message {
        Message::Backend(BackendEvent::Progress(ProgressEvent {
            job_id,
            downloaded_bytes: 10,
            total_bytes: Some(100),
            speed: None,
            status,
        }))
    }

    #[test]
    fn test_download_refused_without_ffmpeg() {
        let (mut app, mut rx) = app_with_backend(false);
        app.url_input = "https://example.com/watch?v=1".to_string();
        app.format = OutputFormat::Mp3;

        dispatch(&mut app, Message::DownloadPressed);

        assert!(rx.try_recv().is_err());
        assert!(!app.download.is_running());
        assert!(app.error_banner.as_deref().unwrap_or("").contains("ffmpeg"));
        assert!(app.warnings.iter().any(|w| w.contains("FFmpeg")));
    }

    #[test]
    fn test_invalid_url_never_reaches_backend() {
        let (mut app, mut rx) = app_with_backend(true);
        app.url_input = "not a url".to_string();

        dispatch(&mut app, Message::DownloadPressed);
        dispatch(&mut app, Message::LoadPreview);

        assert!(rx.try_recv().is_err());
        assert!(app.url_error.is_some());
    }

    #[test]
    fn test_progress_for_other_jobs_is_ignored() {
        let (mut app, mut rx) = app_with_backend(true);
        app.url_input = "https://example.com/watch?v=1".to_string();
        dispatch(&mut app, Message::DownloadPressed);
        let job_id = started_job(&mut rx);

        dispatch(&mut app, progress(Uuid::new_v4(), ProgressStatus::Downloading));
        assert!(matches!(app.download, DownloadState::Running { latest: None, .. }));

        dispatch(&mut app, progress(job_id, ProgressStatus::Downloading));
        assert!(matches!(app.download, DownloadState::Running { latest: Some(_), .. }));

        dispatch(&mut app, progress(
            job_id,
            ProgressStatus::Done {
                path: PathBuf::from("/tmp/out/video.mp4"),
            },
        ));
        assert!(matches!(app.download, DownloadState::Finished { .. }));
    }

    #[test]
    fn test_cancelled_job_ignores_late_progress() {
        let (mut app, mut rx) = app_with_backend(true);
        app.url_input = "https://example.com/watch?v=1".to_string();
        dispatch(&mut app, Message::DownloadPressed);
        let job_id = started_job(&mut rx);

        dispatch(&mut app, Message::CancelPressed);
        assert!(matches!(rx.try_recv(), Ok(BackendCommand::CancelDownload)));
        dispatch(&mut app, Message::Backend(BackendEvent::DownloadCancelled { job_id }));
        dispatch(&mut app, progress(job_id, ProgressStatus::Converting));

        assert!(matches!(app.download, DownloadState::Idle));
    }

    #[test]
    fn test_failure_returns_to_usable_state() {
        let (mut app, mut rx) = app_with_backend(true);
        app.url_input = "https://example.com/watch?v=1".to_string();
        dispatch(&mut app, Message::DownloadPressed);
        let job_id = started_job(&mut rx);

        dispatch(&mut app, progress(
            job_id,
            ProgressStatus::Failed {
                error: GrabError::NetworkFailure("reset".to_string()),
            },
        ));

        assert!(app.error_banner.is_some());
        assert!(app.can_download());
        dispatch(&mut app, Message::DismissError);
        assert!(app.error_banner.is_none());
    }

    #[test]
    fn test_stale_metadata_is_dropped() {
        let (mut app, mut rx) = app_with_backend(true);
        app.url_input = "https://example.com/a".to_string();
        dispatch(&mut app, Message::LoadPreview);
        assert!(matches!(rx.try_recv(), Ok(BackendCommand::FetchMetadata { .. })));

        dispatch(&mut app, Message::Backend(BackendEvent::MetadataFetched {
            url: "https://example.com/old".to_string(),
            result: Err(GrabError::NetworkFailure("x".to_string())),
        }));
        assert!(app.preview.is_loading());

        dispatch(&mut app, Message::Backend(BackendEvent::MetadataFetched {
            url: "https://example.com/a".to_string(),
            result: Err(GrabError::InvalidUrl("Unsupported URL".to_string())),
        }));
        assert!(matches!(app.preview, PreviewState::Failed { .. }));
        assert!(app.url_error.is_some());
    }
}
