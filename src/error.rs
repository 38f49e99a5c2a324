//! Job failure taxonomy.
//!
//! Every failure inside a job ends up as a [`JobError`]. The variants carry
//! structured payloads; the `CODE:detail` string callers see is produced by
//! the `Display` impl and only rendered at the HTTP boundary.

use thiserror::Error;

/// Content restrictions reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    PrivateOrLogin,
    Copyright,
    AgeRestricted,
    Unavailable,
    LiveStream,
    NotPremiered,
    MembersOnly,
    UnsupportedUrl,
}

impl Restriction {
    pub fn message(&self) -> &'static str {
        match self {
            Restriction::PrivateOrLogin => "This video is private or requires login",
            Restriction::Copyright => "This video is blocked due to copyright",
            Restriction::AgeRestricted => "This video is age-restricted",
            Restriction::Unavailable => "This video is unavailable",
            Restriction::LiveStream => "Cannot download live streams",
            Restriction::NotPremiered => "This video has not premiered yet",
            Restriction::MembersOnly => "This video is for channel members only",
            Restriction::UnsupportedUrl => "Unsupported URL or no video found",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Restriction::PrivateOrLogin => "PRIVATE_VIDEO",
            Restriction::Copyright => "COPYRIGHT_BLOCKED",
            Restriction::AgeRestricted => "AGE_RESTRICTED",
            Restriction::Unavailable => "UNAVAILABLE",
            Restriction::LiveStream => "LIVE_STREAM",
            Restriction::NotPremiered => "NOT_PREMIERED",
            Restriction::MembersOnly => "MEMBERS_ONLY",
            Restriction::UnsupportedUrl => "UNSUPPORTED_URL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    /// No admission slot became free within the wait window.
    #[error("SERVER_BUSY:Too many concurrent downloads. Try again later.")]
    ServerBusy,

    /// Rejected by the duration filter. `limit_minutes` is absent when the
    /// engine did not say which filter rejected the item.
    #[error("DURATION_TOO_LONG:{}", duration_detail(.limit_minutes))]
    DurationTooLong { limit_minutes: Option<u64> },

    #[error("FILE_TOO_LARGE:{size_mb:.1}MB")]
    FileTooLarge { size_mb: f64 },

    #[error("EMPTY_FILE:Downloaded file is empty")]
    EmptyFile,

    #[error("OUTPUT_NOT_FOUND:Download completed but output file not found")]
    OutputNotFound,

    #[error("{}", .0.message())]
    Restricted(Restriction),

    /// Engine failure text the classifier did not recognise, passed through as is.
    #[error("{0}")]
    Engine(String),

    #[error("{0}")]
    Io(String),

    /// The offloaded job task itself failed (panicked or was torn down).
    #[error("INTERNAL_ERROR:{0}")]
    Internal(String),
}

fn duration_detail(limit_minutes: &Option<u64>) -> String {
    match limit_minutes {
        Some(minutes) => format!("over {minutes} minutes"),
        None => "exceeds limit".to_string(),
    }
}

impl JobError {
    pub fn code(&self) -> &'static str {
        match self {
            JobError::ServerBusy => "SERVER_BUSY",
            JobError::DurationTooLong { .. } => "DURATION_TOO_LONG",
            JobError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            JobError::EmptyFile => "EMPTY_FILE",
            JobError::OutputNotFound => "OUTPUT_NOT_FOUND",
            JobError::Restricted(restriction) => restriction.code(),
            JobError::Engine(_) => "ENGINE_ERROR",
            JobError::Io(_) => "IO_ERROR",
            JobError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller may retry the same request after backing off.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::ServerBusy)
    }
}

impl From<std::io::Error> for JobError {
    fn from(value: std::io::Error) -> Self {
        JobError::Io(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_strings() {
        assert_eq!(
            JobError::ServerBusy.to_string(),
            "SERVER_BUSY:Too many concurrent downloads. Try again later."
        );
        assert_eq!(
            JobError::FileTooLarge { size_mb: 123.456 }.to_string(),
            "FILE_TOO_LARGE:123.5MB"
        );
        assert_eq!(
            JobError::DurationTooLong { limit_minutes: Some(10) }.to_string(),
            "DURATION_TOO_LONG:over 10 minutes"
        );
        assert_eq!(
            JobError::DurationTooLong { limit_minutes: None }.to_string(),
            "DURATION_TOO_LONG:exceeds limit"
        );
        assert_eq!(
            JobError::Restricted(Restriction::LiveStream).to_string(),
            "Cannot download live streams"
        );
    }

    #[test]
    fn test_only_server_busy_is_retryable() {
        assert!(JobError::ServerBusy.is_retryable());
        assert!(!JobError::EmptyFile.is_retryable());
        assert!(!JobError::Engine("boom".into()).is_retryable());
    }
}
