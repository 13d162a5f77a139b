//! Lot image resolution
//!
//! Two storage strategies exist across the auction houses: a local image
//! directory per lot, or a single remote URL stored on the row. Either way
//! a failed lookup means "no image", never an error.

use std::path::Path;
use std::time::Duration;

/// Lot photos are stored as JPEG files
const IMAGE_EXT: &str = "jpg";

/// Bounded wait for remote image fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// List image files in a lot's image directory, sorted by filename.
/// Missing or empty directory yields an empty list.
pub async fn list_local_images(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut images = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(IMAGE_EXT))
            .unwrap_or(false);
        if is_image && path.is_file() {
            images.push(path.to_string_lossy().to_string());
        }
    }

    images.sort();
    images
}

/// HTTP client for URL-backed lot images
pub struct ImageClient {
    client: reqwest::Client,
}

impl ImageClient {
    /// Every client carries the bounded-wait timeout; construction fails
    /// rather than fall back to a timeout-less client.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// Fetch remote image bytes. Non-success status or transport failure
    /// is "image unavailable".
    pub async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let response = self.client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            tracing::debug!("Image fetch {} returned {}", url, response.status());
            return None;
        }
        response.bytes().await.ok().map(|bytes| bytes.to_vec())
    }
}
