use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use std::{num::NonZeroUsize, path::Path};
use storage_api::storage_manager::StorageManagerConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse configuration file {path}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub locking: LockingConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub buffer_pages: NonZeroUsize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockingConfig {
    pub acquire_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: 200,
            poll_interval_ms: 20,
        }
    }
}

/// Shape of the demo workload run by the binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    pub workers: usize,
    pub transactions_per_worker: usize,
    pub rows_per_transaction: usize,
    /// Extra attempts for a transaction aborted by a deadlock or a lock timeout.
    pub max_retries: u32,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            transactions_per_worker: 25,
            rows_per_transaction: 3,
            max_retries: 10,
        }
    }
}

impl EngineConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        let cfg: EngineConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseToml {
            path: path.clone(),
            source: e,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Parameters of the storage manager built from this configuration.
    pub fn storage_manager_config(&self) -> StorageManagerConfig {
        StorageManagerConfig {
            cache_pages: self.storage.buffer_pages.get(),
            lock_timeout: Duration::from_millis(self.locking.acquire_timeout_ms),
            lock_poll_interval: Duration::from_millis(self.locking.poll_interval_ms),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // buffer_pages is already NonZeroUsize, so "0" can't happen.
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "storage.data_dir must not be empty".to_string(),
            });
        }
        if self.locking.poll_interval_ms > self.locking.acquire_timeout_ms {
            return Err(ConfigError::Invalid {
                message: format!(
                    "locking.poll_interval_ms ({}) must not exceed locking.acquire_timeout_ms ({})",
                    self.locking.poll_interval_ms, self.locking.acquire_timeout_ms
                ),
            });
        }
        if self.workload.workers == 0 {
            return Err(ConfigError::Invalid {
                message: "workload.workers must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
