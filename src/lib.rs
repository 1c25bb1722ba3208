//! Reelgrab library

pub mod app;
pub mod backend;
pub mod converter;
pub mod downloader;
pub mod extractor;
pub mod gui;
pub mod thumbnail;
pub mod utils;

// Re-export main types for easier use
pub use converter::{Converter, FfmpegConverter};
pub use downloader::{
    DownloadCoordinator, DownloadRequest, OutputFormat, ProgressEvent, ProgressReporter,
    ProgressStatus, Quality,
};
pub use extractor::{Extractor, VideoMetadata, YtDlpExtractor};
pub use gui::{Message, ReelgrabApp};
pub use utils::{AppSettings, GrabError};
