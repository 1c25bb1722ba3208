//! Video extraction through yt-dlp

pub mod models;
pub mod output;
pub mod traits;
pub mod ytdlp;

pub use models::{FormatOption, VideoMetadata};
pub use traits::Extractor;
pub use ytdlp::YtDlpExtractor;
