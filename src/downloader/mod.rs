//! Download requests, progress reporting and the coordinator that runs them

pub mod coordinator;
pub mod progress;
pub mod request;

// Re-export for convenience
pub use coordinator::DownloadCoordinator;
pub use progress::{ProgressEvent, ProgressReporter, ProgressStatus};
pub use request::{validate_url, DownloadRequest, OutputFormat, Quality};
