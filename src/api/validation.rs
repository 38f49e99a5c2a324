use thiserror::Error;

use crate::models::{DownloadJob, InfoQuery};

const MAX_FILENAME_LEN: usize = 128;
const MAX_URL_LEN: usize = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("url is required")]
    MissingUrl,
    #[error("url must be an http/https url")]
    InvalidUrl,
    #[error("url exceeds {MAX_URL_LEN} characters")]
    UrlTooLong,
    #[error("quality must be a positive integer, got '{0}'")]
    InvalidQuality(String),
    #[error("filename '{0}' must be a plain name without path separators")]
    InvalidFilename(String),
    #[error("filename exceeds {MAX_FILENAME_LEN} characters")]
    FilenameTooLong,
}

pub fn validate_info_query(query: &InfoQuery) -> Result<(), RequestValidationError> {
    validate_url(&query.url)
}

pub fn validate_download_job(job: &DownloadJob) -> Result<(), RequestValidationError> {
    validate_url(&job.url)?;

    // Interpolated into the format expression, so digits only.
    let quality = job.quality.as_str();
    if quality.is_empty()
        || !quality.chars().all(|c| c.is_ascii_digit())
        || quality.parse::<u32>().map_or(true, |q| q == 0)
    {
        return Err(RequestValidationError::InvalidQuality(job.quality.clone()));
    }

    // An empty filename means "generate one".
    if let Some(filename) = job.filename.as_deref().filter(|name| !name.is_empty()) {
        validate_filename(filename)?;
    }

    Ok(())
}

fn validate_url(url: &str) -> Result<(), RequestValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(RequestValidationError::MissingUrl);
    }
    if url.len() > MAX_URL_LEN {
        return Err(RequestValidationError::UrlTooLong);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(RequestValidationError::InvalidUrl);
    }
    Ok(())
}

/// The filename becomes part of an on-disk path, so it has to stay inside
/// the download directory.
fn validate_filename(filename: &str) -> Result<(), RequestValidationError> {
    if filename.len() > MAX_FILENAME_LEN {
        return Err(RequestValidationError::FilenameTooLong);
    }

    let invalid = filename.starts_with('.')
        || filename.contains(['/', '\\', '\0'])
        || filename.contains("%(");

    if invalid {
        return Err(RequestValidationError::InvalidFilename(filename.to_string()));
    }

    Ok(())
}
