//! Read-only snapshot of stored cart state.

use serde::Serialize;
use tracing::debug;

use crate::CART_KEY;
use crate::backend::StorageBackend;
use crate::envelope::decode;
use crate::probe::is_available;

/// Storage state as seen by [`storage_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    /// Whether the backend passed the availability probe.
    pub available: bool,
    /// Primary key name.
    pub key: &'static str,
    /// Stored schema version, if any.
    pub version: Option<String>,
    /// Length of the stored `items` array, before normalization.
    pub items: usize,
    /// UTF-8 size of the stored payload.
    pub bytes: usize,
}

impl StorageInfo {
    const fn unavailable() -> Self {
        Self {
            available: false,
            key: CART_KEY,
            version: None,
            items: 0,
            bytes: 0,
        }
    }
}

/// Snapshot the primary key without migrating or rewriting anything.
pub fn storage_info<B: StorageBackend + ?Sized>(backend: &B) -> StorageInfo {
    if !is_available(backend) {
        return StorageInfo::unavailable();
    }

    let raw = match backend.get(CART_KEY) {
        Ok(raw) => raw.unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "Cannot read cart for diagnostics");
            String::new()
        }
    };

    let (version, items) = decode(&raw)
        .map(|stored| (stored.version, stored.items.len()))
        .unwrap_or_default();

    StorageInfo {
        available: true,
        key: CART_KEY,
        version,
        items,
        bytes: raw.len(),
    }
}
