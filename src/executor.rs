//! Job executor
//!
//! Runs engine calls on the blocking pool so a slow engine never stalls the
//! async request path. Downloads hold an admission slot for their whole
//! lifetime; metadata lookups are cheap and deliberately not admission-gated.
//!
//! ## Download flow
//!
//! 1. Acquire a slot (bounded wait, `SERVER_BUSY` on timeout)
//! 2. Resolve the output stem (`filename` or `video_<epoch-millis>`)
//! 3. Hand the engine the format chain, output template and duration filter
//! 4. Locate the produced file by stem prefix
//! 5. Enforce empty/oversize policy, deleting offending files
//! 6. Release the slot, on every path

use std::sync::Arc;

use tracing::{info, warn};

use crate::admission::AdmissionController;
use crate::classify::classify;
use crate::engine::{EngineOptions, MediaEngine, format};
use crate::error::JobError;
use crate::models::{DownloadJob, DownloadResult, InfoQuery, MediaSummary};
use crate::observability::Metrics;
use crate::storage::{StorageDir, bytes_to_mb};

/// Container reported when the produced file has no extension.
const DEFAULT_FORMAT: &str = "MP4";

/// Policy limits applied to every download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobLimits {
    /// 0 disables the duration filter.
    pub max_duration_secs: u64,
    pub max_file_size_mb: u64,
}

pub struct JobExecutor {
    engine: Arc<dyn MediaEngine>,
    admission: Arc<AdmissionController>,
    storage: StorageDir,
    limits: JobLimits,
    metrics: Arc<Metrics>,
}

impl JobExecutor {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        admission: Arc<AdmissionController>,
        storage: StorageDir,
        limits: JobLimits,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            engine,
            admission,
            storage,
            limits,
            metrics,
        }
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn limits(&self) -> JobLimits {
        self.limits
    }

    /// Metadata-only lookup. Not admission-gated.
    pub async fn lookup_info(&self, query: InfoQuery) -> Result<MediaSummary, JobError> {
        self.metrics.info_lookup();

        let engine = Arc::clone(&self.engine);
        let url = query.url;
        let result = tokio::task::spawn_blocking(move || {
            engine.extract(&url, &EngineOptions::metadata())
        })
        .await
        .map_err(|e| JobError::Internal(format!("info lookup task failed: {e}")))?;

        result
            .map(MediaSummary::from)
            .map_err(|e| classify(&e.0, self.limits.max_duration_secs))
    }

    /// Admission-gated download.
    pub async fn download(&self, job: DownloadJob) -> Result<DownloadResult, JobError> {
        let permit = match self.admission.acquire().await {
            Ok(permit) => permit,
            Err(denied) => {
                self.metrics.admission_denied();
                return Err(denied.into());
            }
        };

        let engine = Arc::clone(&self.engine);
        let storage = self.storage.clone();
        let limits = self.limits;
        let url = job.url.clone();

        // The permit travels with the blocking work: a caller that goes away
        // mid-download must not free the slot while the engine still runs.
        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            run_download(engine.as_ref(), &storage, limits, &job)
        })
        .await
        .map_err(|e| JobError::Internal(format!("download task failed: {e}")))
        .and_then(|result| result);

        match &outcome {
            Ok(result) => {
                self.metrics.download_completed();
                info!(
                    url = %url,
                    filename = %result.filename,
                    size_mb = result.size_mb,
                    "Download completed"
                );
            }
            Err(e) => {
                self.metrics.download_failed();
                warn!(url = %url, code = e.code(), error = %e, "Download failed");
            }
        }

        outcome
    }
}

/// Blocking download pipeline. Must run off the async runtime.
pub fn run_download(
    engine: &dyn MediaEngine,
    storage: &StorageDir,
    limits: JobLimits,
    job: &DownloadJob,
) -> Result<DownloadResult, JobError> {
    let stem = job.resolve_filename();
    info!(url = %job.url, filename = %stem, quality = %job.quality, "Starting download");

    let options = EngineOptions::download(
        format::selection_expression(&job.quality),
        storage.output_template(&stem),
        limits.max_duration_secs,
    );

    let info = engine
        .extract(&job.url, &options)
        .map_err(|e| classify(&e.0, limits.max_duration_secs))?;

    let path = storage.find_output(&stem)?.ok_or(JobError::OutputNotFound)?;

    let size_bytes = std::fs::metadata(&path)?.len();
    if size_bytes == 0 {
        storage.discard(&path);
        return Err(JobError::EmptyFile);
    }

    let size_mb = bytes_to_mb(size_bytes);
    if size_mb > limits.max_file_size_mb as f64 {
        storage.discard(&path);
        return Err(JobError::FileTooLarge { size_mb });
    }

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| stem.clone());

    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string());

    Ok(DownloadResult {
        filename,
        size_mb: (size_mb * 100.0).round() / 100.0,
        duration: info.duration,
        title: info.title,
        format,
    })
}
