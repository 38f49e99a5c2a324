//! Response bodies for the HTTP API.
//!
//! Request bodies and job results live in [`crate::models`]; this module
//! only holds what is specific to the HTTP surface.
//!
//! Error body (`message` carries the `CODE:detail` string):
//!
//! ```json
//! { "code": "SERVER_BUSY", "message": "SERVER_BUSY:Too many concurrent downloads. Try again later." }
//! ```

use serde::{Deserialize, Serialize};

use crate::observability::MetricsSnapshot;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Engine version string
    pub version: String,
    pub service_version: String,
    pub active_downloads: usize,
    pub max_concurrent: usize,
    /// Free space on the download volume, -1 if unreadable
    pub disk_free_mb: i64,
    pub stats: MetricsSnapshot,
}
