//! Progress tracking for downloads

use crate::utils::error::GrabError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lifecycle stage of a download
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressStatus {
    Fetching,
    Downloading,
    Converting,
    Done { path: PathBuf },
    Failed { error: GrabError },
}

impl ProgressStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressStatus::Fetching => "Fetching",
            ProgressStatus::Downloading => "Downloading",
            ProgressStatus::Converting => "Converting",
            ProgressStatus::Done { .. } => "Completed",
            ProgressStatus::Failed { .. } => "Failed",
        }
    }
}

/// One progress update for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub job_id: Uuid,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub speed: Option<f64>, // bytes per second
    pub status: ProgressStatus,
}

impl ProgressEvent {
    /// Get progress fraction (0.0 to 1.0)
    pub fn fraction(&self) -> f32 {
        match (&self.status, self.total_bytes) {
            (ProgressStatus::Done { .. }, _) => 1.0,
            (_, Some(total)) if total > 0 => {
                (self.downloaded_bytes as f64 / total as f64).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }

    /// Remaining time at the current speed
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total_bytes?;
        let speed = self.speed.filter(|s| s.is_finite() && *s > 0.0)?;
        if self.downloaded_bytes >= total {
            return Some(Duration::from_secs(0));
        }
        let remaining = total - self.downloaded_bytes;
        // A crawling speed can push the estimate past what Duration holds
        Duration::try_from_secs_f64(remaining as f64 / speed).ok()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ProgressStatus::Done { .. } | ProgressStatus::Failed { .. }
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    downloaded: u64,
    total: Option<u64>,
}

/// Per-download handle that stamps events with the job id.
///
/// Once the job's cancellation token fires, every emit is refused, so a
/// cancelled download produces no further events.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    job_id: Uuid,
    sender: mpsc::Sender<ProgressEvent>,
    cancel: CancellationToken,
    counters: Arc<Mutex<Counters>>,
}

impl ProgressReporter {
    pub fn new(job_id: Uuid, sender: mpsc::Sender<ProgressEvent>, cancel: CancellationToken) -> Self {
        Self {
            job_id,
            sender,
            cancel,
            counters: Arc::new(Mutex::new(Counters::default())),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Send a status with the latest byte counters.
    /// Returns false when the event was dropped.
    pub async fn emit(&self, status: ProgressStatus) -> bool {
        self.emit_with_speed(status, None).await
    }

    /// Record byte counters and send a `Downloading` event
    pub async fn downloading(&self, downloaded: u64, total: Option<u64>, speed: Option<f64>) -> bool {
        if let Ok(mut counters) = self.counters.lock() {
            counters.downloaded = downloaded;
            if total.is_some() {
                counters.total = total;
            }
        }
        self.emit_with_speed(ProgressStatus::Downloading, speed).await
    }

    /// Mark the transfer complete: downloaded bytes become the final size
    pub fn finish_transfer(&self, final_size: u64) {
        if let Ok(mut counters) = self.counters.lock() {
            counters.downloaded = final_size;
            counters.total = Some(counters.total.unwrap_or(final_size).max(final_size));
        }
    }

    /// Latest reported total, if any
    pub fn reported_total(&self) -> Option<u64> {
        self.counters.lock().ok().and_then(|c| c.total)
    }

    async fn emit_with_speed(&self, status: ProgressStatus, speed: Option<f64>) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        let counters = self.counters.lock().map(|c| *c).unwrap_or_default();
        let event = ProgressEvent {
            job_id: self.job_id,
            downloaded_bytes: counters.downloaded,
            total_bytes: counters.total,
            speed,
            status,
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.sender.send(event) => sent.is_ok(),
        }
    }
}
