//! Job inputs and results.
//!
//! ```json
//! POST /download
//! { "url": "https://www.youtube.com/watch?v=abc", "quality": "720", "filename": "clip1" }
//!
//! 200 OK
//! { "filename": "clip1.mp4", "size_mb": 12.34, "duration": 61, "title": "Clip", "format": "MP4" }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::MediaInfo;

/// Sequence for generated stems, so two jobs in the same millisecond never
/// share an output file.
static GENERATED_SEQ: AtomicU64 = AtomicU64::new(0);

/// A metadata-only lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoQuery {
    pub url: String,
}

/// A download request. `filename` is the output stem; the engine picks the extension.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadJob {
    pub url: String,
    #[serde(default = "default_quality", deserialize_with = "trimmed")]
    pub quality: String,
    #[serde(default)]
    pub filename: Option<String>,
}

fn default_quality() -> String {
    "720".to_string()
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

impl DownloadJob {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            quality: default_quality(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Output stem: the requested filename, or `video_<epoch-millis>_<seq>`.
    /// An empty filename counts as absent.
    pub fn resolve_filename(&self) -> String {
        match self.filename.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => format!(
                "video_{}_{}",
                chrono::Utc::now().timestamp_millis(),
                GENERATED_SEQ.fetch_add(1, Ordering::Relaxed)
            ),
        }
    }
}

/// Normalized subset of what the engine reports about a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaSummary {
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub filesize: Option<u64>,
    pub uploader: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(rename = "url")]
    pub source_url: Option<String>,
}

impl From<MediaInfo> for MediaSummary {
    fn from(info: MediaInfo) -> Self {
        Self {
            title: info.title,
            duration: info.duration,
            filesize: info.filesize.or(info.filesize_approx),
            uploader: info.uploader,
            thumbnail: info.thumbnail,
            source_url: info.url.or(info.webpage_url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadResult {
    pub filename: String,
    pub size_mb: f64,
    pub duration: Option<f64>,
    pub title: Option<String>,
    pub format: String,
}
