//! Key-value storage backends.
//!
//! The cart layer only needs three synchronous string operations from its
//! backend, mirroring an origin-scoped browser storage area: get, set and
//! remove. Backends use `&self` for every method and rely on interior
//! mutability, so a single backend can be shared between a [`CartStore`] and
//! its debounce timer task.
//!
//! [`CartStore`]: crate::CartStore

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Errors returned by a [`StorageBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend cannot be used at all (missing, disabled by policy, ...).
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// The write would exceed the backend's size limit.
    #[error("storage quota exceeded: {requested} bytes requested, {quota} allowed")]
    QuotaExceeded {
        /// Total bytes the backend would hold after the write.
        requested: u64,
        /// Configured limit in bytes.
        quota: u64,
    },

    /// The stored value exists but is not valid UTF-8 text.
    #[error("stored value for {0:?} is not valid UTF-8")]
    Undecodable(String),

    /// The key cannot be represented by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Returns `true` if the failure was caused by the size limit.
    #[must_use]
    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Synchronous string key-value storage.
///
/// Properties required from implementations:
/// - `get` of a missing key is `Ok(None)`, not an error
/// - `remove` of a missing key is `Ok(())`
/// - a failed `set` leaves the previous value in place
pub trait StorageBackend: Send + Sync + Debug {
    /// Retrieve a value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Insert or replace a value.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::QuotaExceeded`] when the write would exceed the
    /// size limit, or another variant for any other failure.
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Remove a value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

/// In-process backend with an optional byte quota.
///
/// Usage is measured as the UTF-8 length of every key plus its value, the
/// same accounting a browser applies to an origin's storage area. The
/// backend can be switched off at runtime to simulate storage disabled by
/// user or browser policy.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<u64>,
    available: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend with no size limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: None,
            available: AtomicBool::new(true),
        }
    }

    /// Create an empty backend limited to `bytes`.
    #[must_use]
    pub fn with_quota(bytes: u64) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::new()
        }
    }

    /// Enable or disable the backend.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Bytes currently used by keys and values.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        usage(&self.lock(), None)
    }

    /// Whether `key` currently holds a value, bypassing availability.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Current value of `key`, bypassing availability.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> Result<(), BackendError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("storage disabled".to_owned()))
        }
    }
}

fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

fn usage(entries: &HashMap<String, String>, skip: Option<&str>) -> u64 {
    entries
        .iter()
        .filter(|(key, _)| Some(key.as_str()) != skip)
        .map(|(key, value)| entry_size(key, value))
        .sum()
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.ensure_available()?;
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.ensure_available()?;
        let mut entries = self.lock();

        if let Some(quota) = self.quota {
            let requested = usage(&entries, Some(key)) + entry_size(key, value);
            if requested > quota {
                return Err(BackendError::QuotaExceeded { requested, quota });
            }
        }

        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.ensure_available()?;
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_remove() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);

        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));

        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
        backend.remove("k").unwrap();
    }

    #[test]
    fn test_quota_counts_keys_and_values() {
        let backend = MemoryBackend::with_quota(10);
        backend.set("ab", "cdef").unwrap();
        assert_eq!(backend.used_bytes(), 6);

        let err = backend.set("gh", "ijk").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(!backend.contains_key("gh"));
    }

    #[test]
    fn test_quota_replacement_does_not_double_count() {
        let backend = MemoryBackend::with_quota(10);
        backend.set("ab", "cdefgh").unwrap();
        backend.set("ab", "12345678").unwrap();
        assert_eq!(backend.peek("ab").as_deref(), Some("12345678"));
    }

    #[test]
    fn test_disabled_backend_fails_everything() {
        let backend = MemoryBackend::new();
        backend.set("k", "v").unwrap();
        backend.set_available(false);

        assert!(matches!(backend.get("k"), Err(BackendError::Unavailable(_))));
        assert!(matches!(
            backend.set("k", "w"),
            Err(BackendError::Unavailable(_))
        ));
        assert!(matches!(
            backend.remove("k"),
            Err(BackendError::Unavailable(_))
        ));
        assert_eq!(backend.peek("k").as_deref(), Some("v"));
    }
}
