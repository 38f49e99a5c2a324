//! Extraction/download engine boundary
//!
//! The engine does the actual network fetch, format selection and muxing.
//! Calls are blocking and may take minutes; callers must run them off the
//! async request path (see [`crate::executor`]).
//!
//! ## Key Components
//!
//! - [`MediaEngine`] - the collaborator contract
//! - [`EngineOptions`] - per-call knobs (timeouts, retries, format, output template)
//! - [`YtDlpEngine`] - implementation driving the `yt-dlp` executable
//! - [`format::selection_expression`] - ordered format fallback chain

pub mod format;
mod ytdlp;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub use ytdlp::YtDlpEngine;

/// Socket timeout for metadata-only lookups.
pub const INFO_SOCKET_TIMEOUT: Duration = Duration::from_secs(15);
/// Socket timeout while downloading.
pub const DOWNLOAD_SOCKET_TIMEOUT: Duration = Duration::from_secs(30);
/// Network and fragment retry budget handed to the engine.
pub const DOWNLOAD_RETRIES: u32 = 5;
/// Container all downloaded streams are merged into.
pub const MERGE_OUTPUT_FORMAT: &str = "mp4";

/// Opaque engine failure. The text is classified later by [`crate::classify`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Metadata reported by the engine. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize_approx: Option<u64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
}

/// Sizes come back as integers or floats depending on the extractor.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
    }))
}

/// Options for a single engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub quiet: bool,
    pub check_certificate: bool,
    /// Metadata only, no file written.
    pub skip_download: bool,
    pub socket_timeout: Duration,
    pub retries: u32,
    pub fragment_retries: u32,
    pub format: Option<String>,
    pub output_template: Option<PathBuf>,
    pub no_playlist: bool,
    /// Evaluated by the engine before any bytes are fetched.
    pub match_filter: Option<String>,
    pub merge_output_format: Option<String>,
}

impl EngineOptions {
    /// Metadata-only lookup.
    pub fn metadata() -> Self {
        Self {
            quiet: true,
            check_certificate: false,
            skip_download: true,
            socket_timeout: INFO_SOCKET_TIMEOUT,
            retries: 0,
            fragment_retries: 0,
            format: None,
            output_template: None,
            no_playlist: false,
            match_filter: None,
            merge_output_format: None,
        }
    }

    /// Full download into `output_template`. A `max_duration_secs` of 0
    /// disables the duration pre-filter.
    pub fn download(format: String, output_template: PathBuf, max_duration_secs: u64) -> Self {
        Self {
            quiet: true,
            check_certificate: false,
            skip_download: false,
            socket_timeout: DOWNLOAD_SOCKET_TIMEOUT,
            retries: DOWNLOAD_RETRIES,
            fragment_retries: DOWNLOAD_RETRIES,
            format: Some(format),
            output_template: Some(output_template),
            no_playlist: true,
            match_filter: (max_duration_secs > 0)
                .then(|| format!("duration <= {max_duration_secs}")),
            merge_output_format: Some(MERGE_OUTPUT_FORMAT.to_string()),
        }
    }
}

/// Extraction/download engine.
///
/// Implementations block the calling thread for the whole call.
pub trait MediaEngine: Send + Sync {
    /// Engine build/version string for health reporting.
    fn version(&self) -> Result<String, EngineError>;

    /// Look up `url`, and download it unless `options.skip_download` is set.
    ///
    /// A download must leave exactly one media file named after
    /// `options.output_template`.
    fn extract(&self, url: &str, options: &EngineOptions) -> Result<MediaInfo, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_options() {
        let opts = EngineOptions::download("best".into(), PathBuf::from("/d/x.%(ext)s"), 600);
        assert!(!opts.skip_download);
        assert!(opts.no_playlist);
        assert!(!opts.check_certificate);
        assert_eq!(opts.socket_timeout, Duration::from_secs(30));
        assert_eq!(opts.retries, 5);
        assert_eq!(opts.fragment_retries, 5);
        assert_eq!(opts.match_filter.as_deref(), Some("duration <= 600"));
        assert_eq!(opts.merge_output_format.as_deref(), Some("mp4"));
    }

    #[test]
    fn test_zero_duration_disables_filter() {
        let opts = EngineOptions::download("best".into(), PathBuf::from("/d/x.%(ext)s"), 0);
        assert!(opts.match_filter.is_none());
    }

    #[test]
    fn test_metadata_options() {
        let opts = EngineOptions::metadata();
        assert!(opts.skip_download);
        assert_eq!(opts.socket_timeout, Duration::from_secs(15));
        assert!(opts.output_template.is_none());
    }

    #[test]
    fn test_media_info_lenient_sizes() {
        let info: MediaInfo = serde_json::from_str(
            r#"{"title": "t", "duration": 12.5, "filesize": null, "filesize_approx": 1048576.4, "extra": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(info.title.as_deref(), Some("t"));
        assert_eq!(info.duration, Some(12.5));
        assert_eq!(info.filesize, None);
        assert_eq!(info.filesize_approx, Some(1048576));
    }
}
