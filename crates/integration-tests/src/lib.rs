//! Integration tests for QuickBasket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p quickbasket-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_round_trip` - save/load/clear behavior and normalization
//! - `cart_debounce` - write coalescing under a paused clock
//! - `cart_migration` - legacy key migration
//! - `cart_faults` - quota, write and availability failures
//! - `cart_file_storage` - persistence across process restarts
//!
//! This crate also provides [`RecordingBackend`], a backend wrapper that
//! counts writes and can inject failures.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use quickbasket_cart_storage::{BackendError, MemoryBackend, StorageBackend};

/// Failure to inject into the next matching write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail with [`BackendError::QuotaExceeded`].
    Quota,
    /// Fail with a generic I/O error.
    Io,
}

impl Fault {
    fn into_error(self) -> BackendError {
        match self {
            Self::Quota => BackendError::QuotaExceeded {
                requested: u64::MAX,
                quota: 0,
            },
            Self::Io => BackendError::Io(std::io::Error::other("injected write failure")),
        }
    }
}

/// [`MemoryBackend`] wrapper that records writes and injects faults.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    writes: Mutex<HashMap<String, usize>>,
    faults: Mutex<HashMap<String, Vec<Fault>>>,
}

impl RecordingBackend {
    /// Create an empty, fault-free backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped backend.
    #[must_use]
    pub const fn inner(&self) -> &MemoryBackend {
        &self.inner
    }

    /// Successful writes to `key` so far.
    #[must_use]
    pub fn writes_to(&self, key: &str) -> usize {
        lock(&self.writes).get(key).copied().unwrap_or(0)
    }

    /// Fail the next write to `key` with `fault`.
    ///
    /// Faults queue up: each write consumes one.
    pub fn fail_next_write(&self, key: &str, fault: Fault) {
        lock(&self.faults)
            .entry(key.to_owned())
            .or_default()
            .push(fault);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StorageBackend for RecordingBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let fault = {
            let mut faults = lock(&self.faults);
            faults
                .get_mut(key)
                .filter(|queue| !queue.is_empty())
                .map(|queue| queue.remove(0))
        };
        if let Some(fault) = fault {
            return Err(fault.into_error());
        }

        self.inner.set(key, value)?;
        *lock(&self.writes).entry(key.to_owned()).or_default() += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.inner.remove(key)
    }
}
