//! Error handling for reelgrab

use thiserror::Error;

/// Main error type for reelgrab
///
/// Every variant carries plain text so the error can be cloned into
/// backend events and shown in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrabError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Network error: {0}")]
    NetworkFailure(String),

    #[error("Disk write failed: {0}")]
    DiskWriteFailure(String),

    #[error("Conversion failed: {0}")]
    ConversionFailure(String),

    #[error("{0} not found. Please install it or set its path in settings")]
    ToolNotFound(String),

    #[error("Failed to extract video info: {0}")]
    ExtractionFailed(String),

    #[error("A download is already in progress")]
    Busy,

    #[error("Download cancelled")]
    Cancelled,
}

impl GrabError {
    /// Short text suitable for an inline error banner
    pub fn user_message(&self) -> String {
        match self {
            GrabError::InvalidUrl(_) => {
                "This doesn't appear to be a valid video URL".to_string()
            }
            GrabError::UnsupportedFormat(_) => {
                "The selected format is not available for this video".to_string()
            }
            GrabError::NetworkFailure(_) => {
                "Unable to connect. Please check your internet connection".to_string()
            }
            GrabError::DiskWriteFailure(_) => {
                "Could not write to the output folder. Check free space and permissions"
                    .to_string()
            }
            GrabError::ConversionFailure(_) => "Converting the downloaded file failed".to_string(),
            GrabError::ToolNotFound(tool) => format!("{} is required but was not found", tool),
            GrabError::ExtractionFailed(_) => {
                "Unable to process this URL. Please try a different video".to_string()
            }
            GrabError::Busy => "Wait for the current download to finish".to_string(),
            GrabError::Cancelled => "Download cancelled".to_string(),
        }
    }

    /// Map an I/O error raised while touching the output location
    pub fn disk(err: std::io::Error) -> Self {
        GrabError::DiskWriteFailure(err.to_string())
    }
}

impl From<reqwest::Error> for GrabError {
    fn from(err: reqwest::Error) -> Self {
        GrabError::NetworkFailure(err.to_string())
    }
}

impl From<serde_json::Error> for GrabError {
    fn from(err: serde_json::Error) -> Self {
        GrabError::ExtractionFailed(format!("unreadable yt-dlp output: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, GrabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = GrabError::InvalidUrl("ftp://x".to_string());
        assert_eq!(err.to_string(), "Invalid URL: ftp://x");
    }

    #[test]
    fn test_user_message_hides_detail() {
        let err = GrabError::NetworkFailure("dns error: lookup failed".to_string());
        assert!(!err.user_message().contains("dns"));
    }

    #[test]
    fn test_tool_not_found_names_tool() {
        let err = GrabError::ToolNotFound("ffmpeg".to_string());
        assert!(err.user_message().contains("ffmpeg"));
        assert!(err.to_string().starts_with("ffmpeg not found"));
    }

    #[test]
    fn test_disk_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(GrabError::disk(io), GrabError::DiskWriteFailure(_)));
    }
}
