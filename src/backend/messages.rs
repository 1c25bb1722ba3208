use crate::downloader::{DownloadRequest, ProgressEvent};
use crate::extractor::VideoMetadata;
use crate::thumbnail::Thumbnail;
use crate::utils::{GrabError, ToolReport};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Commands sent from GUI to Backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    /// Look up title, thumbnail and formats for a URL
    FetchMetadata { url: String },
    StartDownload(DownloadRequest),
    /// Cancel the active download, if any
    CancelDownload,
    // System
    Shutdown,
}

/// Events sent from Backend to GUI
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// The actor is running and accepts commands through this handle
    Ready(BackendHandle),
    ToolsChecked(ToolReport),

    // Preview
    MetadataFetched {
        url: String,
        result: Result<VideoMetadata, GrabError>,
    },
    ThumbnailLoaded {
        url: String,
        result: Result<Thumbnail, GrabError>,
    },

    // Download life-cycle
    DownloadStarted { job_id: Uuid },
    DownloadRejected { job_id: Uuid, error: GrabError },
    Progress(ProgressEvent),
    DownloadCancelled { job_id: Uuid },
}

/// Cloneable sender the UI keeps to talk to the actor
#[derive(Debug, Clone)]
pub struct BackendHandle {
    sender: mpsc::Sender<BackendCommand>,
}

impl BackendHandle {
    pub fn new(sender: mpsc::Sender<BackendCommand>) -> Self {
        Self { sender }
    }

    /// Queue a command without waiting. Returns false if the actor is gone
    /// or its inbox is full.
    pub fn send(&self, command: BackendCommand) -> bool {
        match self.sender.try_send(command) {
            Ok(()) => true,
            Err(e) => {
                warn!("Backend command dropped: {}", e);
                false
            }
        }
    }
}
