use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use super::{error::ApiError, models::HealthResponse, state::AppState, validation};
use crate::models::{DownloadJob, InfoQuery};

/// Metadata lookup (POST /info)
///
/// Asks the engine for metadata only. Not admission-gated; engine failures
/// are classified and returned as 400.
pub async fn get_info(
    State(state): State<AppState>,
    payload: Result<Json<InfoQuery>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(query) = payload?;
    validation::validate_info_query(&query)?;

    let summary = state.executor.lookup_info(query).await?;

    Ok((StatusCode::OK, Json(summary)))
}

/// Download job (POST /download)
///
/// ## Flow:
/// 1. Validate the payload (url, quality label, filename stem)
/// 2. Wait up to the admission window for a slot, 429 if none frees up
/// 3. Run the engine, locate the produced file, enforce size policy
/// 4. Return the file name and size relative to the download directory
pub async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadJob>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(job) = payload?;
    validation::validate_download_job(&job)?;

    info!(url = %job.url, quality = %job.quality, "Download requested");
    let result = state.executor.download(job).await?;

    Ok((StatusCode::OK, Json(result)))
}

/// Health check endpoint (GET /health)
///
/// Always 200 while the process can answer. An unreadable download volume
/// shows up as `disk_free_mb: -1` rather than a failure.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let admission = state.executor.admission();

    let response = HealthResponse {
        status: "ok".to_string(),
        version: state.engine_version.to_string(),
        service_version: env!("CARGO_PKG_VERSION").to_string(),
        active_downloads: admission.active(),
        max_concurrent: admission.max_concurrent(),
        disk_free_mb: state.storage.free_space_mb(),
        stats: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}
