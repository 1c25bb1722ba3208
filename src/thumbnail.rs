//! Thumbnail download and decoding for the preview pane

use crate::utils::error::{GrabError, Result};
use crate::utils::AppSettings;
use futures::StreamExt;
use image::imageops::FilterType;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Refuse thumbnails larger than this
const MAX_THUMBNAIL_BYTES: usize = 8 * 1024 * 1024;

/// Decoded preview image, RGBA8 row-major
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

pub struct ThumbnailFetcher {
    client: reqwest::Client,
    max_width: u32,
    max_height: u32,
}

impl ThumbnailFetcher {
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.thumbnail_timeout_secs.max(1)))
            .user_agent(concat!("reelgrab/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(
            client,
            settings.thumbnail_width,
            settings.thumbnail_height,
        ))
    }

    pub fn with_client(client: reqwest::Client, max_width: u32, max_height: u32) -> Self {
        Self {
            client,
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }

    /// GET the image and decode it, scaled to fit the preview box
    pub async fn fetch(&self, url: &str) -> Result<Thumbnail> {
        debug!("Fetching thumbnail {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Thumbnail request returned {}", status);
            return Err(GrabError::NetworkFailure(format!(
                "thumbnail request returned HTTP {}",
                status
            )));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > MAX_THUMBNAIL_BYTES {
                return Err(GrabError::NetworkFailure(
                    "thumbnail exceeds the size limit".to_string(),
                ));
            }
            body.extend_from_slice(&chunk);
        }

        let (max_width, max_height) = (self.max_width, self.max_height);
        tokio::task::spawn_blocking(move || decode(&body, max_width, max_height))
            .await
            .map_err(|e| GrabError::UnsupportedFormat(format!("thumbnail decoder stopped: {}", e)))?
    }
}

/// Decode image bytes and shrink them to fit `max_width` x `max_height`,
/// keeping the aspect ratio. Smaller images are left as they are.
pub fn decode(bytes: &[u8], max_width: u32, max_height: u32) -> Result<Thumbnail> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| GrabError::UnsupportedFormat(format!("unreadable thumbnail: {}", e)))?;

    let image = if image.width() > max_width || image.height() > max_height {
        image.resize(max_width, max_height, FilterType::Triangle)
    } else {
        image
    };

    let rgba = image.to_rgba8();
    Ok(Thumbnail {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
