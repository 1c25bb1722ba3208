//! In-process stand-ins for yt-dlp and ffmpeg shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use reelgrab::converter::{ConversionTarget, Converter};
use reelgrab::downloader::{validate_url, DownloadRequest, ProgressEvent, ProgressReporter};
use reelgrab::extractor::{Extractor, FormatOption, VideoMetadata};
use reelgrab::utils::error::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Ordered record of calls made into the fakes
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

pub const FAKE_TITLE: &str = "Fake Clip";

pub struct FakeExtractor {
    pub log: CallLog,
    /// Extension of the file the download "produces"
    pub ext: &'static str,
    /// Bytes written, also reported as the total
    pub size: u64,
    /// Stop after the first progress event until cancelled
    pub hang: bool,
}

impl FakeExtractor {
    pub fn new(log: CallLog, ext: &'static str, size: u64) -> Self {
        Self {
            log,
            ext,
            size,
            hang: false,
        }
    }

    pub fn hanging(log: CallLog) -> Self {
        Self {
            hang: true,
            ..Self::new(log, "mp4", 4096)
        }
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        validate_url(url)?;
        self.log.lock().unwrap().push("metadata");
        Ok(VideoMetadata {
            id: "fake1".to_string(),
            title: FAKE_TITLE.to_string(),
            webpage_url: url.to_string(),
            thumbnail: None,
            duration: Some(12.0),
            uploader: None,
            extractor: Some("fake".to_string()),
            formats: vec![FormatOption {
                format_id: "18".to_string(),
                ext: "mp4".to_string(),
                height: Some(360),
                filesize: Some(self.size),
                vcodec: Some("avc1".to_string()),
                acodec: Some("mp4a".to_string()),
                ..Default::default()
            }],
        })
    }

    async fn download(&self, request: &DownloadRequest, reporter: &ProgressReporter) -> Result<PathBuf> {
        self.log.lock().unwrap().push("download");

        reporter
            .downloading(self.size / 2, Some(self.size), Some(1024.0))
            .await;
        if self.hang {
            futures::future::pending::<()>().await;
        }

        let path = request
            .output_dir()
            .join(format!("{}.{}", FAKE_TITLE, self.ext));
        tokio::fs::write(&path, vec![0u8; self.size as usize])
            .await
            .map_err(reelgrab::GrabError::disk)?;
        reporter.downloading(self.size, Some(self.size), None).await;
        Ok(path)
    }
}

pub struct FakeConverter {
    pub log: CallLog,
}

#[async_trait]
impl Converter for FakeConverter {
    async fn convert(&self, input: &Path, target: &ConversionTarget) -> Result<PathBuf> {
        // The input must be complete before conversion starts
        assert!(input.exists(), "converter called before the download finished");
        self.log.lock().unwrap().push("convert");

        let output = target.output_path(input);
        tokio::fs::write(&output, b"converted")
            .await
            .map_err(reelgrab::GrabError::disk)?;
        Ok(output)
    }
}

/// Collect events until the sender side closes
pub async fn drain(rx: &mut mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        events.push(event);
    }
    events
}
