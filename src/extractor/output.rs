//! Parsing of yt-dlp console output
//!
//! Downloads run with a machine readable `--progress-template` and a
//! `--print after_move:` line, both tagged with markers so they can be
//! picked out of whatever else yt-dlp writes to stdout or stderr.

use crate::utils::error::GrabError;
use std::path::PathBuf;

pub const PROGRESS_MARKER: &str = "reelgrab-progress";
pub const FILE_MARKER: &str = "reelgrab-file";

/// Value for `--progress-template`
pub fn progress_template() -> String {
    format!(
        "download:{} %(progress.downloaded_bytes)s %(progress.total_bytes)s \
         %(progress.total_bytes_estimate)s %(progress.speed)s",
        PROGRESS_MARKER
    )
}

/// Value for `--print`, emitted once the final file is in place
pub fn file_print_template() -> String {
    format!("after_move:{} %(filepath)s", FILE_MARKER)
}

/// One parsed progress line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressLine {
    pub downloaded: u64,
    pub total: Option<u64>,
    pub speed: Option<f64>,
}

fn number(field: &str) -> Option<f64> {
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse `reelgrab-progress <downloaded> <total> <estimate> <speed>`.
/// Any field may be `NA`; the downloaded count is required.
pub fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    let start = line.find(PROGRESS_MARKER)?;
    let mut fields = line[start + PROGRESS_MARKER.len()..].split_whitespace();

    let downloaded = number(fields.next()?)? as u64;
    let total = fields.next().and_then(number);
    let estimate = fields.next().and_then(number);
    let speed = fields.next().and_then(number);

    Some(ProgressLine {
        downloaded,
        total: total.or(estimate).map(|t| t as u64).filter(|t| *t > 0),
        speed,
    })
}

/// Parse `reelgrab-file <path>`
pub fn parse_file_line(line: &str) -> Option<PathBuf> {
    let start = line.find(FILE_MARKER)?;
    let path = line[start + FILE_MARKER.len()..].trim();
    if path.is_empty() || path == "NA" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Merges per-stream progress into one running total.
///
/// A "bestvideo+bestaudio" download fetches two streams in sequence and
/// yt-dlp restarts its counters for the second one.
#[derive(Debug, Default, Clone)]
pub struct ProgressAccumulator {
    completed: u64,
    last_downloaded: u64,
    last_total: Option<u64>,
}

impl ProgressAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one stream-level line and get the overall figures back
    pub fn push(&mut self, line: ProgressLine) -> ProgressLine {
        if line.downloaded < self.last_downloaded {
            // Counter went backwards: the previous stream finished
            self.completed += self
                .last_total
                .unwrap_or(self.last_downloaded)
                .max(self.last_downloaded);
        }
        self.last_downloaded = line.downloaded;
        if line.total.is_some() {
            self.last_total = line.total;
        }

        ProgressLine {
            downloaded: self.completed + line.downloaded,
            total: self.last_total.map(|t| self.completed + t),
            speed: line.speed,
        }
    }
}

/// The most useful line of yt-dlp's stderr: the last `ERROR:` line, or the
/// last non-empty line when there is none.
pub fn error_summary(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "yt-dlp exited without an error message".to_string())
}

/// Map yt-dlp's stderr onto the error taxonomy
pub fn classify_error(stderr: &str) -> GrabError {
    let summary = error_summary(stderr);
    let lower = stderr.to_lowercase();

    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        GrabError::InvalidUrl(summary)
    } else if lower.contains("requested format is not available")
        || lower.contains("no video formats found")
    {
        GrabError::UnsupportedFormat(summary)
    } else if lower.contains("no space left")
        || lower.contains("errno 28")
        || lower.contains("permission denied")
        || lower.contains("read-only file system")
        || lower.contains("unable to open for writing")
    {
        GrabError::DiskWriteFailure(summary)
    } else if lower.contains("ffmpeg") && (lower.contains("not found") || lower.contains("not installed")) {
        GrabError::ToolNotFound("ffmpeg".to_string())
    } else if lower.contains("http error")
        || lower.contains("unable to download")
        || lower.contains("timed out")
        || lower.contains("getaddrinfo")
        || lower.contains("name or service not known")
        || lower.contains("connection")
        || lower.contains("network is unreachable")
    {
        GrabError::NetworkFailure(summary)
    } else {
        GrabError::ExtractionFailed(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_progress_full() {
        let line = "reelgrab-progress 1024 4096 NA 512.5";
        assert_eq!(
            parse_progress_line(line),
            Some(ProgressLine {
                downloaded: 1024,
                total: Some(4096),
                speed: Some(512.5)
            })
        );
    }

    #[test]
    fn test_parse_progress_uses_estimate() {
        let line = "[download] reelgrab-progress 10 NA 2000.0 NA";
        let parsed = parse_progress_line(line).unwrap();
        assert_eq!(parsed.total, Some(2000));
        assert_eq!(parsed.speed, None);
    }

    #[test]
    fn test_parse_progress_rejects_other_lines() {
        assert_eq!(parse_progress_line("[download]  45.2% of 10.00MiB"), None);
        assert_eq!(parse_progress_line("reelgrab-progress NA NA NA NA"), None);
        assert_eq!(parse_progress_line("reelgrab-progress"), None);
    }

    #[test]
    fn test_parse_file_line() {
        assert_eq!(
            parse_file_line("reelgrab-file /home/me/Downloads/My Video.mp4"),
            Some(PathBuf::from("/home/me/Downloads/My Video.mp4"))
        );
        assert_eq!(parse_file_line("reelgrab-file NA"), None);
        assert_eq!(parse_file_line("[Merger] Merging formats"), None);
    }

    #[test]
    fn test_accumulator_spans_two_streams() {
        let mut acc = ProgressAccumulator::new();
        let line = |d, t| ProgressLine {
            downloaded: d,
            total: Some(t),
            speed: None,
        };

        assert_eq!(acc.push(line(50, 100)).downloaded, 50);
        assert_eq!(acc.push(line(100, 100)).downloaded, 100);
        let second = acc.push(line(5, 20));
        assert_eq!(second.downloaded, 105);
        assert_eq!(second.total, Some(120));
        assert_eq!(acc.push(line(20, 20)).downloaded, 120);
    }

    #[test]
    fn test_error_summary_prefers_error_line() {
        let stderr = "WARNING: something\nERROR: [youtube] abc: Video unavailable\n\n";
        assert_eq!(error_summary(stderr), "[youtube] abc: Video unavailable");
        assert_eq!(error_summary("just text"), "just text");
        assert!(error_summary("").contains("without an error"));
    }

    #[test]
    fn test_classify_error() {
        assert!(matches!(
            classify_error("ERROR: Unsupported URL: https://example.com/"),
            GrabError::InvalidUrl(_)
        ));
        assert!(matches!(
            classify_error("ERROR: [youtube] x: Requested format is not available"),
            GrabError::UnsupportedFormat(_)
        ));
        assert!(matches!(
            classify_error("ERROR: unable to write data: [Errno 28] No space left on device"),
            GrabError::DiskWriteFailure(_)
        ));
        assert!(matches!(
            classify_error("ERROR: Unable to download webpage: HTTP Error 503"),
            GrabError::NetworkFailure(_)
        ));
        assert_eq!(
            classify_error("ERROR: ffmpeg not found. Please install"),
            GrabError::ToolNotFound("ffmpeg".to_string())
        );
        assert!(matches!(
            classify_error("ERROR: Private video. Sign in"),
            GrabError::ExtractionFailed(_)
        ));
    }

    proptest! {
        #[test]
        fn prop_progress_roundtrip(downloaded in 0u64..1u64 << 50, total in 1u64..1u64 << 50, speed in 0.0f64..1e9) {
            let line = format!("{} {} {} NA {}", PROGRESS_MARKER, downloaded, total, speed);
            let parsed = parse_progress_line(&line).unwrap();
            prop_assert_eq!(parsed.downloaded, downloaded);
            prop_assert_eq!(parsed.total, Some(total));
            prop_assert!((parsed.speed.unwrap() - speed).abs() <= speed * 1e-9 + 1e-9);
        }

        #[test]
        fn prop_parser_never_panics(line in ".*") {
            let _ = parse_progress_line(&line);
            let _ = parse_file_line(&line);
        }
    }
}
