//! External tool discovery
//!
//! yt-dlp and ffmpeg are looked up in this order:
//! 1. Path configured in settings
//! 2. Bundled next to the executable (or inside the .app bundle)
//! 3. System PATH
//! 4. Common installation paths (Homebrew, pip --user, ...)

use crate::utils::paths;
use crate::utils::AppSettings;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// External programs reelgrab shells out to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    YtDlp,
    Ffmpeg,
    Node,
}

impl Tool {
    /// Human readable name, also used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            Tool::YtDlp => "yt-dlp",
            Tool::Ffmpeg => "ffmpeg",
            Tool::Node => "node",
        }
    }

    /// File name of the executable on this platform
    pub fn binary_name(&self) -> String {
        if cfg!(target_os = "windows") {
            format!("{}.exe", self.name())
        } else {
            self.name().to_string()
        }
    }

    fn version_flag(&self) -> &'static str {
        match self {
            Tool::YtDlp => "--version",
            Tool::Ffmpeg => "-version",
            Tool::Node => "-v",
        }
    }

    fn common_paths(&self) -> Vec<PathBuf> {
        let name = self.binary_name();
        let mut candidates: Vec<PathBuf> = [
            // macOS Homebrew (Apple Silicon)
            "/opt/homebrew/bin",
            // macOS Homebrew (Intel) and manual installs
            "/usr/local/bin",
            "/usr/bin",
            "/snap/bin",
        ]
        .iter()
        .map(|dir| Path::new(dir).join(&name))
        .collect();

        if let Some(home) = dirs::home_dir() {
            // pip --user
            candidates.push(home.join(".local").join("bin").join(&name));
        }

        if *self == Tool::Ffmpeg && cfg!(target_os = "windows") {
            candidates.push(PathBuf::from("C:\\ffmpeg\\bin\\ffmpeg.exe"));
            candidates.push(PathBuf::from("C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe"));
        }

        candidates
    }
}

/// Find a tool, preferring an explicitly configured path
pub fn locate(tool: Tool, configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if is_executable(path) {
            debug!("Using configured {}: {}", tool.name(), path.display());
            return Some(path.to_path_buf());
        }
        warn!(
            "Configured {} path {} is not an executable file, searching instead",
            tool.name(),
            path.display()
        );
    }

    for dir in paths::bundled_tool_dirs() {
        let candidate = dir.join(tool.binary_name());
        if is_executable(&candidate) {
            info!("✓ Using bundled {}: {}", tool.name(), candidate.display());
            return Some(candidate);
        }
    }

    if let Ok(path) = which::which(tool.binary_name()) {
        info!("✓ Using system {}: {}", tool.name(), path.display());
        return Some(path);
    }

    let found = tool
        .common_paths()
        .into_iter()
        .find(|candidate| is_executable(candidate));
    match &found {
        Some(path) => info!("✓ Using {} from common path: {}", tool.name(), path.display()),
        None => warn!("✗ {} not found anywhere", tool.name()),
    }
    found
}

/// Run `<tool> <version flag>` and report whether it exited successfully
pub fn probe(tool: Tool, path: &Path) -> bool {
    Command::new(path)
        .arg(tool.version_flag())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Availability of every external tool, gathered once at startup
#[derive(Debug, Clone, Default)]
pub struct ToolReport {
    pub ytdlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
    pub node_available: bool,
}

impl ToolReport {
    pub fn detect(settings: &AppSettings) -> Self {
        let ytdlp = locate(Tool::YtDlp, settings.ytdlp_path.as_deref());
        let ffmpeg = locate(Tool::Ffmpeg, settings.ffmpeg_path.as_deref());
        let node_available = locate(Tool::Node, None)
            .map(|path| probe(Tool::Node, &path))
            .unwrap_or(false);

        Self {
            ytdlp,
            ffmpeg,
            node_available,
        }
    }

    /// Warnings to show once when the window opens
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.ytdlp.is_none() {
            warnings.push(
                "yt-dlp not found. Video extraction will fail until it is installed \
                 (pip install yt-dlp)"
                    .to_string(),
            );
        }
        if self.ffmpeg.is_none() {
            warnings.push(
                "FFmpeg not found. MP4 merging and MP3 conversion need it installed".to_string(),
            );
        }
        if !self.node_available {
            warnings.push(
                "Node.js runtime not found. Some YouTube formats may not download correctly"
                    .to_string(),
            );
        }
        warnings
    }
}

/// Check if a file is executable
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        match std::fs::metadata(path) {
            Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_binary_names() {
        let expected = if cfg!(target_os = "windows") {
            "yt-dlp.exe"
        } else {
            "yt-dlp"
        };
        assert_eq!(Tool::YtDlp.binary_name(), expected);
        assert_eq!(Tool::Ffmpeg.name(), "ffmpeg");
    }

    #[cfg(unix)]
    #[test]
    fn test_configured_path_wins() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("my-ffmpeg");
        std::fs::write(&fake, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(locate(Tool::Ffmpeg, Some(&fake)), Some(fake));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain.txt");
        std::fs::write(&plain, "data").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert!(!is_executable(&plain));
        assert!(!is_executable(dir.path()));

        let path = PathBuf::from("/bin/sh");
        if path.exists() {
            assert!(is_executable(&path));
        }
    }

    #[test]
    fn test_report_warnings() {
        let report = ToolReport::default();
        let warnings = report.warnings();
        assert_eq!(warnings.len(), 3);

        let complete = ToolReport {
            ytdlp: Some(PathBuf::from("/usr/bin/yt-dlp")),
            ffmpeg: Some(PathBuf::from("/usr/bin/ffmpeg")),
            node_available: true,
        };
        assert!(complete.warnings().is_empty());
    }
}
