//! Diagnostic counters reported by the health probe

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct Metrics {
    downloads_completed: AtomicU64,
    downloads_failed: AtomicU64,
    admissions_denied: AtomicU64,
    info_lookups: AtomicU64,
    files_swept: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn download_completed(&self) {
        self.downloads_completed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_completed", "Metric incremented");
    }

    pub fn download_failed(&self) {
        self.downloads_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_failed", "Metric incremented");
    }

    pub fn admission_denied(&self) {
        self.admissions_denied.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "admissions_denied", "Metric incremented");
    }

    pub fn info_lookup(&self) {
        self.info_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files_swept(&self, count: u64) {
        self.files_swept.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            downloads_completed: self.downloads_completed.load(Ordering::Relaxed),
            downloads_failed: self.downloads_failed.load(Ordering::Relaxed),
            admissions_denied: self.admissions_denied.load(Ordering::Relaxed),
            info_lookups: self.info_lookups.load(Ordering::Relaxed),
            files_swept: self.files_swept.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub downloads_completed: u64,
    pub downloads_failed: u64,
    pub admissions_denied: u64,
    pub info_lookups: u64,
    pub files_swept: u64,
}
