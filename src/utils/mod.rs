//! Utility modules for errors, configuration and tool discovery

pub mod config;
pub mod error;
pub mod format;
pub mod paths;
pub mod tools;

// Re-export for convenience
pub use config::AppSettings;
pub use error::GrabError;
pub use paths::{get_downloads_dir, get_settings_path};
pub use tools::{Tool, ToolReport};
