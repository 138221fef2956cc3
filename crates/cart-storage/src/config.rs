//! Cart storage configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `QUICKBASKET_STORAGE_DIR` - Directory for file-backed storage (default: .quickbasket)
//! - `QUICKBASKET_QUOTA_BYTES` - Storage size limit in bytes (default: 5242880)
//! - `QUICKBASKET_DEBOUNCE_MS` - Delay for debounced saves in milliseconds (default: 250)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::backend::BackendError;
use crate::file::FileBackend;
use crate::scheduler::DEFAULT_DEBOUNCE;

/// 5 MiB, the per-origin limit most browsers apply to local storage.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

const DEFAULT_STORAGE_DIR: &str = ".quickbasket";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartStoreConfig {
    /// Directory holding file-backed entries
    pub storage_dir: PathBuf,
    /// Maximum total size of stored entries
    pub quota_bytes: u64,
    /// Default delay for debounced saves
    pub debounce: Duration,
}

impl Default for CartStoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl CartStoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage_dir = lookup("QUICKBASKET_STORAGE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map_or(defaults.storage_dir, PathBuf::from);
        let quota_bytes = parse_var(&lookup, "QUICKBASKET_QUOTA_BYTES")?
            .unwrap_or(defaults.quota_bytes);
        let debounce = parse_var(&lookup, "QUICKBASKET_DEBOUNCE_MS")?
            .map_or(defaults.debounce, Duration::from_millis);

        Ok(Self {
            storage_dir,
            quota_bytes,
            debounce,
        })
    }

    /// Open a [`FileBackend`] at the configured directory with the configured quota.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unavailable`] if the directory cannot be created.
    pub fn open_file_backend(&self) -> Result<FileBackend, BackendError> {
        Ok(FileBackend::open(&self.storage_dir)?.with_quota(self.quota_bytes))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional numeric variable.
fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<u64>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}
