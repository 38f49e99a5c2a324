use super::models::Config;
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("max_concurrent must be at least 1")]
    InvalidMaxConcurrent,

    #[error("max_concurrent = {value} exceeds the limit of {max}")]
    MaxConcurrentTooHigh { value: usize, max: usize },

    #[error("max_file_size_mb must be at least 1")]
    InvalidMaxFileSize,

    #[error("Retention setting must be positive: {field} = {value}")]
    InvalidRetention { field: String, value: u64 },

    #[error("download_dir must not be empty")]
    EmptyDownloadDir,

    #[error("engine binary must not be empty")]
    EmptyEngineBinary,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_limits(config)?;
    validate_storage(config)?;
    validate_engine(config)?;
    Ok(())
}

fn validate_limits(config: &Config) -> Result<(), ValidationError> {
    if config.limits.max_concurrent == 0 {
        return Err(ValidationError::InvalidMaxConcurrent);
    }

    if config.limits.max_concurrent > Semaphore::MAX_PERMITS {
        return Err(ValidationError::MaxConcurrentTooHigh {
            value: config.limits.max_concurrent,
            max: Semaphore::MAX_PERMITS,
        });
    }

    if config.limits.max_file_size_mb == 0 {
        return Err(ValidationError::InvalidMaxFileSize);
    }

    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.download_dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDownloadDir);
    }

    if config.storage.retention_secs == 0 {
        return Err(ValidationError::InvalidRetention {
            field: "retention_secs".to_string(),
            value: 0,
        });
    }

    if config.storage.sweep_interval_secs == 0 {
        return Err(ValidationError::InvalidRetention {
            field: "sweep_interval_secs".to_string(),
            value: 0,
        });
    }

    Ok(())
}

fn validate_engine(config: &Config) -> Result<(), ValidationError> {
    if config.engine.binary.as_os_str().is_empty() {
        return Err(ValidationError::EmptyEngineBinary);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency() {
        let mut config = Config::default();
        config.limits.max_concurrent = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidMaxConcurrent)));
    }

    #[test]
    fn test_max_concurrent_above_semaphore_limit() {
        let mut config = Config::default();
        config.limits.max_concurrent = usize::MAX / 2;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::MaxConcurrentTooHigh { value, .. }) if value == usize::MAX / 2
        ));

        config.limits.max_concurrent = Semaphore::MAX_PERMITS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_file_size() {
        let mut config = Config::default();
        config.limits.max_file_size_mb = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidMaxFileSize)));
    }

    #[test]
    fn test_zero_duration_is_allowed() {
        let mut config = Config::default();
        config.limits.max_duration_secs = 0;

        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_retention() {
        let mut config = Config::default();
        config.storage.retention_secs = 0;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidRetention { .. })
        ));
    }

    #[test]
    fn test_empty_download_dir() {
        let mut config = Config::default();
        config.storage.download_dir = PathBuf::new();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::EmptyDownloadDir)));
    }
}
