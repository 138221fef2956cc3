//! Migration of carts written under deprecated keys.
//!
//! Older builds stored the cart under `shopping_cart`, either as a bare array
//! of items or as `{ "items": [...] }`. The first legacy key holding a value
//! is normalized, rewritten as a current envelope under
//! [`CART_KEY`](crate::CART_KEY), and then removed. If the rewrite fails the
//! legacy value is left untouched so a later load can retry.

use serde_json::Value;
use tracing::{debug, info};

use crate::backend::{BackendError, StorageBackend};
use crate::error::{Result, StoreError};
use crate::probe::is_available;
use crate::scheduler::write_items;

/// Deprecated keys, checked in order.
pub const LEGACY_KEYS: &[&str] = &["shopping_cart"];

/// What a successful migration moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    /// The legacy key that was migrated and removed.
    pub from_key: &'static str,
    /// Items written under the current key.
    pub migrated: usize,
    /// Legacy records dropped by normalization.
    pub dropped: usize,
}

/// Migrate the first legacy key that holds a value.
///
/// Returns `Ok(None)` when no legacy key has data.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the backend fails the probe, or the
/// backend error if reading, rewriting or removing fails.
pub fn migrate_from_legacy<B: StorageBackend + ?Sized>(backend: &B) -> Result<Option<Migration>> {
    if !is_available(backend) {
        return Err(StoreError::Unavailable);
    }

    for &key in LEGACY_KEYS {
        let raw = match backend.get(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => continue,
            // Unreadable bytes are migrated like any other garbage payload.
            Err(BackendError::Undecodable(_)) => {
                debug!(key, "Legacy payload is not valid text");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        let sanitized = quickbasket_core::sanitize_items_with_report(&legacy_records(key, &raw));
        let migration = Migration {
            from_key: key,
            migrated: sanitized.items.len(),
            dropped: sanitized.dropped(),
        };

        write_items(backend, sanitized.items)?;
        backend.remove(key)?;

        info!(
            from = key,
            migrated = migration.migrated,
            dropped = migration.dropped,
            "Migrated legacy cart"
        );
        return Ok(Some(migration));
    }

    Ok(None)
}

/// Extract raw item records from either legacy shape.
///
/// Unparsable payloads and unrecognized shapes yield no records, so they are
/// migrated as an empty cart.
fn legacy_records(key: &str, raw: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut fields)) => match fields.remove("items") {
            Some(Value::Array(items)) => items,
            _ => {
                debug!(key, "Legacy object has no items array");
                Vec::new()
            }
        },
        Ok(_) => {
            debug!(key, "Legacy payload has an unrecognized shape");
            Vec::new()
        }
        Err(e) => {
            debug!(key, error = %e, "Legacy payload is not valid JSON");
            Vec::new()
        }
    }
}
