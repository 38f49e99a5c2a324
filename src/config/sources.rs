use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "MEDIAGATE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/mediagate.toml";
const ENV_PREFIX: &str = "MEDIAGATE";
const ENV_SEPARATOR: &str = "__";

/// Flat environment names accepted for container deployments, mapped onto
/// config keys. These win over every other source.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("DOWNLOAD_DIR", "storage.download_dir"),
    ("MAX_CONCURRENT_DOWNLOADS", "limits.max_concurrent"),
    ("MAX_DURATION_SECONDS", "limits.max_duration_secs"),
    ("MAX_FILE_SIZE_MB", "limits.max_file_size_mb"),
];

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. `MEDIAGATE__SECTION__KEY` environment variables
/// 5. Flat legacy variables (`DOWNLOAD_DIR`, `MAX_CONCURRENT_DOWNLOADS`, ...)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_with_env(config_path, |key| env::var(key).ok())
}

/// Load configuration from a specific path and the process environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    load_with_env(config_path, |key| env::var(key).ok())
}

/// Load with an injectable lookup for the flat legacy variables.
pub fn load_with_env<F>(config_path: PathBuf, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // MEDIAGATE__LIMITS__MAX_CONCURRENT -> limits.max_concurrent
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    for (var, key) in LEGACY_ENV_KEYS {
        builder = builder.set_override_option(*key, lookup(var))?;
    }

    let config = builder.build()?;
    config.try_deserialize()
}
