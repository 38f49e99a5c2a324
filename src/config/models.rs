use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Managed output directory and its retention policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Files older than this are deleted by the sweeper
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl StorageConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("/downloads")
}

fn default_retention_secs() -> u64 {
    600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Job limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Admission slots for concurrent downloads
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// 0 disables the duration filter
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_duration_secs: default_max_duration_secs(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

fn default_max_concurrent() -> usize {
    5
}

fn default_max_duration_secs() -> u64 {
    600
}

fn default_max_file_size_mb() -> u64 {
    100
}

/// Extraction engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Path or name of the yt-dlp executable
    #[serde(default = "default_engine_binary")]
    pub binary: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: default_engine_binary(),
        }
    }
}

fn default_engine_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.storage.download_dir, PathBuf::from("/downloads"));
        assert_eq!(config.storage.retention(), Duration::from_secs(600));
        assert_eq!(config.storage.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.limits.max_concurrent, 5);
        assert_eq!(config.limits.max_duration_secs, 600);
        assert_eq!(config.limits.max_file_size_mb, 100);
        assert_eq!(config.engine.binary, PathBuf::from("yt-dlp"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[limits]
max_concurrent = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.limits.max_concurrent, 2);
        assert_eq!(config.limits.max_file_size_mb, 100);
        assert_eq!(config.storage.retention_secs, 600);
    }
}
