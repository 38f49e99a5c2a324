use std::sync::Arc;
use std::time::Duration;

use crate::admission::{ADMISSION_WAIT, AdmissionController};
use crate::config::Config;
use crate::engine::MediaEngine;
use crate::executor::JobExecutor;
use crate::observability::Metrics;
use crate::storage::StorageDir;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub executor: Arc<JobExecutor>,
    pub storage: StorageDir,
    pub metrics: Arc<Metrics>,
    pub engine_version: Arc<str>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<dyn MediaEngine>, engine_version: String) -> Self {
        Self::with_admission_wait(config, engine, engine_version, ADMISSION_WAIT)
    }

    /// Same as [`AppState::new`] with a custom admission wait.
    pub fn with_admission_wait(
        config: Config,
        engine: Arc<dyn MediaEngine>,
        engine_version: String,
        admission_wait: Duration,
    ) -> Self {
        let storage = StorageDir::new(&config.storage.download_dir);
        let metrics = Arc::new(Metrics::new());
        let admission = Arc::new(AdmissionController::with_max_wait(
            config.limits.max_concurrent,
            admission_wait,
        ));

        let executor = JobExecutor::new(
            engine,
            admission,
            storage.clone(),
            config.job_limits(),
            Arc::clone(&metrics),
        );

        Self {
            config: Arc::new(config),
            executor: Arc::new(executor),
            storage,
            metrics,
            engine_version: engine_version.into(),
        }
    }
}
