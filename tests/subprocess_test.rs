//! End-to-end runs against shell scripts standing in for yt-dlp and ffmpeg.

#![cfg(unix)]

use reelgrab::converter::{ConversionTarget, Converter, FfmpegConverter};
use reelgrab::downloader::{
    DownloadCoordinator, DownloadRequest, OutputFormat, ProgressEvent, ProgressReporter,
    ProgressStatus, Quality,
};
use reelgrab::extractor::{Extractor, YtDlpExtractor};
use reelgrab::utils::AppSettings;
use reelgrab::GrabError;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const METADATA_JSON: &str = r#"{"id":"abc","title":"Fake Clip","webpage_url":"https://example.com/watch?v=abc","duration":12.5,"thumbnail":null,"formats":[{"format_id":"18","ext":"mp4","height":360,"vcodec":"avc1","acodec":"mp4a","filesize":3000}]}"#;

const FAKE_YTDLP: &str = r#"#!/bin/sh
printf '%s\n' "$*" >> "@LOG@"
case "$*" in
  *--dump-json*)
    printf '%s\n' '@JSON@'
    exit 0
    ;;
esac
out=""
ext="webm"
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  if [ "$arg" = "--merge-output-format" ]; then ext="mp4"; fi
  prev="$arg"
done
file="${out%/*}/Clip.$ext"
head -c 3000 /dev/zero > "$file"
echo "[download] Destination: $file"
echo "reelgrab-progress 1500 3000 NA 1000.0"
echo "WARNING: something unimportant" >&2
echo "reelgrab-progress 3000 3000 NA 1000.0"
echo "reelgrab-file $file"
"#;

const FAILING_YTDLP: &str = r#"#!/bin/sh
echo "WARNING: falling back to generic extractor" >&2
echo "ERROR: Unsupported URL: https://example.com/not-a-video" >&2
exit 1
"#;

const FAKE_FFMPEG: &str = r#"#!/bin/sh
for last in "$@"; do :; done
printf 'converted' > "$last"
"#;

const FAILING_FFMPEG: &str = r#"#!/bin/sh
echo "Invalid data found when processing input" >&2
exit 1
"#;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

struct Tools {
    dir: TempDir,
    ytdlp: PathBuf,
    ffmpeg: PathBuf,
    log: PathBuf,
}

impl Tools {
    fn new(ytdlp_body: &str, ffmpeg_body: &str) -> Self {
        let dir = tempdir().unwrap();
        let log = dir.path().join("ytdlp-calls.log");
        let ytdlp_body = ytdlp_body
            .replace("@LOG@", &log.display().to_string())
            .replace("@JSON@", METADATA_JSON);
        let ytdlp = script(dir.path(), "yt-dlp", &ytdlp_body);
        let ffmpeg = script(dir.path(), "ffmpeg", ffmpeg_body);
        Self {
            dir,
            ytdlp,
            ffmpeg,
            log,
        }
    }

    fn extractor(&self) -> YtDlpExtractor {
        YtDlpExtractor::with_binaries(Some(self.ytdlp.clone()), Some(self.ffmpeg.clone()))
    }

    fn coordinator(&self) -> DownloadCoordinator {
        DownloadCoordinator::new(
            Arc::new(self.extractor()),
            Some(Arc::new(FfmpegConverter::new(&self.ffmpeg))),
            AppSettings::default(),
        )
    }

    fn calls(&self) -> String {
        std::fs::read_to_string(&self.log).unwrap_or_default()
    }
}

async fn run_download(tools: &Tools, out: &Path, format: OutputFormat) -> (Result<PathBuf, GrabError>, Vec<ProgressEvent>) {
    let request = DownloadRequest::new("https://example.com/watch?v=abc", format, Quality::P720, out);
    let (tx, mut rx) = mpsc::channel(64);
    let reporter = ProgressReporter::new(request.id(), tx, CancellationToken::new());

    let result = tools.coordinator().run(&request, &reporter).await;
    drop(reporter);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (result, events)
}

#[tokio::test]
async fn test_metadata_from_dump_json() {
    let tools = Tools::new(FAKE_YTDLP, FAKE_FFMPEG);

    let metadata = tools
        .extractor()
        .fetch_metadata("https://example.com/watch?v=abc")
        .await
        .unwrap();

    assert_eq!(metadata.title, "Fake Clip");
    assert!(!metadata.formats.is_empty());
    assert_eq!(metadata.duration_secs(), Some(13));
    assert!(tools.calls().contains("--dump-json"));
}

#[tokio::test]
async fn test_invalid_url_never_spawns_ytdlp() {
    let tools = Tools::new(FAKE_YTDLP, FAKE_FFMPEG);

    let err = tools.extractor().fetch_metadata("example.com/video").await.unwrap_err();

    assert!(matches!(err, GrabError::InvalidUrl(_)));
    assert!(!tools.log.exists());
}

#[tokio::test]
async fn test_ytdlp_stderr_is_classified() {
    let tools = Tools::new(FAILING_YTDLP, FAKE_FFMPEG);

    let err = tools
        .extractor()
        .fetch_metadata("https://example.com/not-a-video")
        .await
        .unwrap_err();

    match err {
        GrabError::InvalidUrl(message) => assert!(message.contains("Unsupported URL")),
        other => panic!("expected InvalidUrl, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_ytdlp_binary() {
    let extractor = YtDlpExtractor::with_binaries(Some(PathBuf::from("/nonexistent/yt-dlp")), None);
    let err = extractor
        .fetch_metadata("https://example.com/watch?v=abc")
        .await
        .unwrap_err();
    assert_eq!(err, GrabError::ToolNotFound("yt-dlp".to_string()));
}

#[tokio::test]
async fn test_mp4_download_streams_progress() {
    let tools = Tools::new(FAKE_YTDLP, FAKE_FFMPEG);
    let out = tools.dir.path().join("out");

    let (result, events) = run_download(&tools, &out, OutputFormat::Mp4).await;

    let path = result.unwrap();
    assert_eq!(path, out.join("Clip.mp4"));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 3000);

    let downloading: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.status, ProgressStatus::Downloading))
        .collect();
    assert_eq!(downloading.len(), 2);
    assert_eq!(downloading[0].downloaded_bytes, 1500);
    assert_eq!(downloading[0].total_bytes, Some(3000));
    assert!(matches!(events.last().unwrap().status, ProgressStatus::Done { .. }));

    let calls = tools.calls();
    assert!(calls.contains("bestvideo[height<=720]+bestaudio/best[height<=720]"));
    assert!(calls.contains("--merge-output-format mp4"));
}

#[tokio::test]
async fn test_mp3_download_is_converted() {
    let tools = Tools::new(FAKE_YTDLP, FAKE_FFMPEG);
    let out = tools.dir.path().join("music");

    let (result, events) = run_download(&tools, &out, OutputFormat::Mp3).await;

    let path = result.unwrap();
    assert_eq!(path, out.join("Clip.mp3"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "converted");
    assert!(!out.join("Clip.webm").exists());
    assert!(events
        .iter()
        .any(|e| matches!(e.status, ProgressStatus::Converting)));
    assert!(tools.calls().contains("bestaudio/best"));
}

#[tokio::test]
async fn test_ffmpeg_failure_is_conversion_failure() {
    let tools = Tools::new(FAKE_YTDLP, FAILING_FFMPEG);
    let input = tools.dir.path().join("input.webm");
    std::fs::write(&input, b"data").unwrap();

    let converter = FfmpegConverter::new(&tools.ffmpeg);
    let err = converter
        .convert(
            &input,
            &ConversionTarget::Mp3 {
                bitrate: "192k".to_string(),
            },
        )
        .await
        .unwrap_err();

    match err {
        GrabError::ConversionFailure(message) => assert!(message.contains("Invalid data")),
        other => panic!("expected ConversionFailure, got {:?}", other),
    }
}
