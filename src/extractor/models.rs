//! Data structures for video information

use crate::downloader::{OutputFormat, Quality};
use crate::utils::format::format_bytes;
use serde::{Deserialize, Serialize};

/// Metadata for one video, fetched once per URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub webpage_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatOption>,
}

/// One downloadable rendition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormatOption {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default)]
    pub tbr: Option<f32>, // Total bitrate
}

fn codec_present(codec: &Option<String>) -> bool {
    codec.as_deref().is_some_and(|c| !c.is_empty() && c != "none")
}

impl FormatOption {
    pub fn has_video(&self) -> bool {
        codec_present(&self.vcodec)
    }

    pub fn has_audio(&self) -> bool {
        codec_present(&self.acodec)
    }

    /// Storyboards are image strips, never media
    pub fn is_storyboard(&self) -> bool {
        self.format_id.starts_with("sb")
            || self.format_note.as_deref() == Some("storyboard")
            || self.ext == "mhtml"
    }

    /// Exact size when known, otherwise yt-dlp's estimate
    pub fn size_estimate(&self) -> Option<u64> {
        self.filesize.or_else(|| {
            self.filesize_approx
                .filter(|s| s.is_finite() && *s > 0.0)
                .map(|s| s as u64)
        })
    }

    /// Label for format lists, e.g. `720p · mp4 · avc1 · 24.1 MB`
    pub fn display_label(&self) -> String {
        let mut parts = Vec::new();
        match (self.height, self.has_video()) {
            (Some(h), true) => parts.push(format!("{}p", h)),
            (_, false) if self.has_audio() => parts.push("audio".to_string()),
            _ => {
                if let Some(res) = &self.resolution {
                    parts.push(res.clone());
                }
            }
        }
        if !self.ext.is_empty() {
            parts.push(self.ext.clone());
        }
        if self.has_video() {
            if let Some(codec) = &self.vcodec {
                parts.push(codec.split('.').next().unwrap_or(codec).to_string());
            }
        } else if let Some(codec) = &self.acodec {
            parts.push(codec.split('.').next().unwrap_or(codec).to_string());
        }
        if let Some(size) = self.size_estimate() {
            parts.push(format_bytes(size));
        }
        if parts.is_empty() {
            self.format_id.clone()
        } else {
            parts.join(" · ")
        }
    }
}

impl VideoMetadata {
    /// Media formats, storyboards excluded
    pub fn media_formats(&self) -> impl Iterator<Item = &FormatOption> {
        self.formats.iter().filter(|f| !f.is_storyboard())
    }

    pub fn video_formats(&self) -> Vec<&FormatOption> {
        self.media_formats().filter(|f| f.has_video()).collect()
    }

    pub fn audio_formats(&self) -> Vec<&FormatOption> {
        self.media_formats()
            .filter(|f| f.has_audio() && !f.has_video())
            .collect()
    }

    pub fn max_height(&self) -> Option<u32> {
        self.video_formats().iter().filter_map(|f| f.height).max()
    }

    pub fn duration_secs(&self) -> Option<u64> {
        self.duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u64)
    }

    /// Quality presets worth offering for this video
    pub fn quality_options(&self) -> Vec<Quality> {
        let Some(max) = self.max_height() else {
            return vec![Quality::Best];
        };
        Quality::ALL
            .into_iter()
            .filter(|q| q.max_height().map_or(true, |h| h <= max))
            .collect()
    }

    /// Rough size of what a download with these choices will fetch
    pub fn estimated_size(&self, format: OutputFormat, quality: Quality) -> Option<u64> {
        let best_audio = self
            .audio_formats()
            .into_iter()
            .filter_map(|f| f.size_estimate().map(|s| (f.tbr.unwrap_or(0.0), s)))
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, s)| s);

        match format {
            OutputFormat::Mp3 => best_audio,
            OutputFormat::Mp4 => {
                let limit = quality.max_height().unwrap_or(u32::MAX);
                let best_video = self
                    .video_formats()
                    .into_iter()
                    .filter(|f| f.height.map_or(true, |h| h <= limit))
                    .filter_map(|f| f.size_estimate().map(|s| (f.height.unwrap_or(0), s)))
                    .max_by_key(|(h, s)| (*h, *s))
                    .map(|(_, s)| s)?;
                Some(best_video + best_audio.unwrap_or(0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, height: u32, size: u64) -> FormatOption {
        FormatOption {
            format_id: id.to_string(),
            ext: "mp4".to_string(),
            height: Some(height),
            filesize: Some(size),
            vcodec: Some("avc1.64001F".to_string()),
            acodec: Some("none".to_string()),
            ..Default::default()
        }
    }

    fn audio(id: &str, tbr: f32, size: u64) -> FormatOption {
        FormatOption {
            format_id: id.to_string(),
            ext: "m4a".to_string(),
            filesize: Some(size),
            vcodec: Some("none".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            tbr: Some(tbr),
            ..Default::default()
        }
    }

    fn metadata(formats: Vec<FormatOption>) -> VideoMetadata {
        VideoMetadata {
            id: "abc".to_string(),
            title: "Sample".to_string(),
            webpage_url: "https://example.com/watch?v=abc".to_string(),
            thumbnail: None,
            duration: Some(61.4),
            uploader: None,
            extractor: None,
            formats,
        }
    }

    #[test]
    fn test_storyboards_are_excluded() {
        let mut sb = video("sb0", 90, 1);
        sb.format_note = Some("storyboard".to_string());
        let meta = metadata(vec![sb, video("137", 1080, 10)]);
        assert_eq!(meta.video_formats().len(), 1);
    }

    #[test]
    fn test_quality_options_follow_max_height() {
        let meta = metadata(vec![video("136", 720, 5), audio("140", 128.0, 1)]);
        assert_eq!(
            meta.quality_options(),
            vec![Quality::Best, Quality::P720, Quality::P480]
        );

        let audio_only = metadata(vec![audio("140", 128.0, 1)]);
        assert_eq!(audio_only.quality_options(), vec![Quality::Best]);
    }

    #[test]
    fn test_estimated_size() {
        let meta = metadata(vec![
            video("137", 1080, 100),
            video("136", 720, 50),
            audio("139", 48.0, 3),
            audio("140", 128.0, 8),
        ]);
        assert_eq!(meta.estimated_size(OutputFormat::Mp4, Quality::Best), Some(108));
        assert_eq!(meta.estimated_size(OutputFormat::Mp4, Quality::P720), Some(58));
        assert_eq!(meta.estimated_size(OutputFormat::Mp3, Quality::P720), Some(8));
        assert_eq!(meta.estimated_size(OutputFormat::Mp4, Quality::P480), None);
    }

    #[test]
    fn test_size_estimate_uses_approx() {
        let mut f = video("1", 360, 0);
        f.filesize = None;
        f.filesize_approx = Some(2048.7);
        assert_eq!(f.size_estimate(), Some(2048));
    }

    #[test]
    fn test_display_label() {
        assert_eq!(video("137", 1080, 1024 * 1024).display_label(), "1080p · mp4 · avc1 · 1.0 MB");
        assert!(audio("140", 128.0, 2048).display_label().starts_with("audio · m4a · mp4a"));
    }

    #[test]
    fn test_duration_rounding() {
        assert_eq!(metadata(vec![]).duration_secs(), Some(61));
    }
}
