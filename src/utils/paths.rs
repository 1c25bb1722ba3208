//! Platform directory resolution
//!
//! When launched from a desktop shell (Finder, Dock, a .desktop entry) the
//! working directory is usually "/", so every default path here is resolved
//! from platform conventions and never relative to the cwd.

use std::path::PathBuf;
use tracing::warn;

const APP_DIR_NAME: &str = if cfg!(target_os = "linux") {
    "reelgrab"
} else {
    "Reelgrab"
};

/// Returns the configuration directory
/// - macOS: ~/Library/Application Support/Reelgrab
/// - Windows: %APPDATA%\Reelgrab
/// - Linux: ~/.config/reelgrab
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Location of the optional settings file
pub fn get_settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Get the downloads directory.
///
/// Uses the platform-standard Downloads directory, falling back to
/// ~/Downloads and finally the temp directory.
pub fn get_downloads_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| {
            warn!("Could not determine Downloads directory, using temp dir");
            std::env::temp_dir()
        })
}

/// Directories next to the running executable that may hold bundled tools.
///
/// Covers a plain `bin/` folder shipped beside the binary and the macOS
/// bundle layout `App.app/Contents/Resources/bin`.
pub fn bundled_tool_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
    else {
        return dirs;
    };

    if exe_dir.ends_with("MacOS") {
        if let Some(contents) = exe_dir.parent() {
            dirs.push(contents.join("Resources").join("bin"));
        }
    }
    dirs.push(exe_dir.join("bin"));
    // Windows portable layout: ffmpeg/bin/ffmpeg.exe next to the executable
    dirs.push(exe_dir.join("ffmpeg").join("bin"));
    dirs.push(exe_dir);
    dirs
}
