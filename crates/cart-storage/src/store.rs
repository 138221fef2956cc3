//! The public cart persistence facade.
//!
//! Every operation resolves to a `bool`, an item list, or a snapshot. Failures
//! are logged and folded into those return values; nothing here returns an
//! error or panics on bad stored data.

use std::sync::Arc;
use std::time::Duration;

use quickbasket_core::CartItem;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::CART_KEY;
use crate::backend::{BackendError, StorageBackend};
use crate::config::CartStoreConfig;
use crate::diagnostics::{StorageInfo, storage_info};
use crate::envelope::{StoredEnvelope, decode};
use crate::error::{Result, StoreError};
use crate::migrate;
use crate::probe;
use crate::scheduler::{DEFAULT_DEBOUNCE, Debouncer, save_items};

/// Durable cart storage over a [`StorageBackend`].
///
/// Each store owns its own debounce timer, so independent stores never
/// cancel each other's pending saves. Stores sharing one backend still race
/// with last-writer-wins semantics, exactly as two browser tabs would.
///
/// # Example
///
/// ```
/// use quickbasket_cart_storage::{CartStore, MemoryBackend};
/// use serde_json::json;
///
/// let store = CartStore::new(MemoryBackend::new());
/// assert!(store.save_cart(&[json!({"name": "Apple", "price": 9.995, "quantity": 2.7})]));
///
/// let items = store.load_cart();
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].price().to_string(), "10.00");
/// assert_eq!(items[0].quantity().get(), 2);
/// ```
#[derive(Debug)]
pub struct CartStore<B: StorageBackend + 'static> {
    backend: Arc<B>,
    debounce: Duration,
    timer: Debouncer,
}

impl<B: StorageBackend + 'static> CartStore<B> {
    /// Create a store with the default debounce delay.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    /// Create a store over a backend that is also used elsewhere.
    #[must_use]
    pub fn from_shared(backend: Arc<B>) -> Self {
        Self {
            backend,
            debounce: DEFAULT_DEBOUNCE,
            timer: Debouncer::new(),
        }
    }

    /// Create a store using the configured debounce delay.
    #[must_use]
    pub fn with_config(backend: B, config: &CartStoreConfig) -> Self {
        Self::new(backend).with_debounce(config.debounce)
    }

    /// Override the default debounce delay.
    #[must_use]
    pub const fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// The underlying backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether the backend is usable right now.
    pub fn is_available(&self) -> bool {
        probe::is_available(self.backend.as_ref())
    }

    /// Normalize and persist `items` immediately.
    ///
    /// Returns `false` if the backend is unavailable, the write fails, or the
    /// cart exceeded the storage quota (in which case an empty cart is stored).
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn save_cart<T: Serialize>(&self, items: &[T]) -> bool {
        match save_items(self.backend.as_ref(), &to_raw(items)) {
            Ok(report) => {
                debug!(saved = report.saved, dropped = report.dropped, "Cart saved");
                true
            }
            Err(StoreError::Unavailable) => {
                debug!("Storage unavailable, cart not saved");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to save cart");
                false
            }
        }
    }

    /// Save `items` after the default delay, superseding any pending save.
    pub fn debounced_save<T: Serialize>(&self, items: &[T]) {
        self.debounced_save_after(items, self.debounce);
    }

    /// Save `items` after `delay`, superseding any pending save.
    ///
    /// Only the most recent call in a burst is ever written. `items` is
    /// captured at call time.
    pub fn debounced_save_after<T: Serialize>(&self, items: &[T], delay: Duration) {
        let raw = to_raw(items);
        let backend = Arc::clone(&self.backend);
        self.timer.schedule(delay, move || {
            if let Err(e) = save_items(backend.as_ref(), &raw) {
                warn!(error = %e, "Debounced cart save failed");
            }
        });
    }

    /// Whether a debounced save is waiting to fire.
    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.timer.is_pending()
    }

    /// Load the stored cart, migrating from a legacy key if needed.
    ///
    /// The result is always re-normalized; an unavailable backend or an
    /// unreadable cart yields an empty list.
    #[instrument(skip_all)]
    pub fn load_cart(&self) -> Vec<CartItem> {
        match self.try_load() {
            Ok(items) => items,
            Err(e) => {
                debug!(error = %e, "Cart not loaded");
                Vec::new()
            }
        }
    }

    /// Delete the stored cart.
    ///
    /// Returns `false` only if the backend is unavailable or the delete fails.
    #[instrument(skip_all)]
    pub fn clear_cart(&self) -> bool {
        if !self.is_available() {
            return false;
        }

        match self.backend.remove(CART_KEY) {
            Ok(()) => {
                info!("Cart cleared");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear cart");
                false
            }
        }
    }

    /// Move a cart stored under a legacy key to the current key.
    ///
    /// Returns `true` if a legacy cart was found and rewritten.
    #[instrument(skip_all)]
    pub fn migrate_from_legacy(&self) -> bool {
        match migrate::migrate_from_legacy(self.backend.as_ref()) {
            Ok(migration) => migration.is_some(),
            Err(e) => {
                warn!(error = %e, "Legacy cart migration failed");
                false
            }
        }
    }

    /// Read-only snapshot of the stored cart.
    pub fn storage_info(&self) -> StorageInfo {
        storage_info(self.backend.as_ref())
    }

    fn try_load(&self) -> Result<Vec<CartItem>> {
        if !self.is_available() {
            return Err(StoreError::Unavailable);
        }

        let stored = match self.read_primary()? {
            Some(stored) => Some(stored),
            None if self.migrate_from_legacy() => self.read_primary()?,
            None => None,
        };

        let Some(stored) = stored else {
            return Ok(Vec::new());
        };

        let sanitized = stored.sanitize();
        if sanitized.dropped() > 0 {
            debug!(
                dropped = sanitized.dropped(),
                rejected = ?sanitized.rejected,
                "Dropped invalid stored items"
            );
        }
        Ok(sanitized.items)
    }

    /// The decoded primary envelope; `None` if absent or undecodable.
    fn read_primary(&self) -> Result<Option<StoredEnvelope>> {
        let raw = match self.backend.get(CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(BackendError::Undecodable(_)) => {
                debug!("Stored cart is not valid text");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match decode(&raw) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                debug!(error = %e, "Stored cart is unusable");
                Ok(None)
            }
        }
    }
}

/// Serialize caller items to raw records for the normalizer.
///
/// Items that fail to serialize become `null` and are dropped by
/// normalization like any other invalid record.
fn to_raw<T: Serialize>(items: &[T]) -> Vec<Value> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::migrate::LEGACY_KEYS;

    fn store() -> CartStore<MemoryBackend> {
        CartStore::new(MemoryBackend::new())
    }

    #[test]
    fn test_typed_items_round_trip() {
        let store = store();
        let items = quickbasket_core::sanitize_items(&[
            json!({"id": "sku-1", "name": "Apple", "price": 1.5, "quantity": 3}),
            json!({"name": "Pear", "price": 2, "quantity": 1, "image": "pear.png"}),
        ]);

        assert!(store.save_cart(&items));
        assert_eq!(store.load_cart(), items);
    }

    #[test]
    fn test_corrupt_primary_loads_empty() {
        let store = store();
        store.backend().set(CART_KEY, "{broken").unwrap();
        assert!(store.load_cart().is_empty());

        store.backend().set(CART_KEY, r#"{"items":"nope"}"#).unwrap();
        assert!(store.load_cart().is_empty());
    }

    #[test]
    fn test_hand_edited_items_are_renormalized() {
        let store = store();
        store
            .backend()
            .set(
                CART_KEY,
                r#"{"type":"quickbasket-cart","version":"2.0","updatedAt":1,"items":[
                    {"name":" Plum ","price":"1.239","quantity":"4.9"},
                    {"name":"Free","price":0,"quantity":1}
                ]}"#,
            )
            .unwrap();

        let items = store.load_cart();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "Plum");
        assert_eq!(items[0].price().to_string(), "1.24");
        assert_eq!(items[0].quantity().get(), 4);
    }

    #[test]
    fn test_corrupt_primary_falls_back_to_legacy() {
        let store = store();
        store.backend().set(CART_KEY, "garbage").unwrap();
        store
            .backend()
            .set(LEGACY_KEYS[0], r#"[{"name":"Fig","price":3,"quantity":1}]"#)
            .unwrap();

        let items = store.load_cart();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "Fig");
        assert!(!store.backend().contains_key(LEGACY_KEYS[0]));
    }

    #[test]
    fn test_valid_primary_ignores_legacy() {
        let store = store();
        assert!(store.save_cart(&[json!({"name": "Apple", "price": 1, "quantity": 1})]));
        store
            .backend()
            .set(LEGACY_KEYS[0], r#"[{"name":"Old","price":1,"quantity":1}]"#)
            .unwrap();

        let items = store.load_cart();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "Apple");
        assert!(store.backend().contains_key(LEGACY_KEYS[0]));
    }

    #[test]
    fn test_unavailable_backend_degrades() {
        let store = store();
        assert!(store.save_cart(&[json!({"name": "Apple", "price": 1, "quantity": 1})]));
        store.backend().set_available(false);

        assert!(!store.is_available());
        assert!(!store.save_cart(&[json!({"name": "Pear", "price": 1, "quantity": 1})]));
        assert!(store.load_cart().is_empty());
        assert!(!store.clear_cart());
        assert!(!store.migrate_from_legacy());
        assert!(!store.storage_info().available);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = store();
        assert!(store.clear_cart());
        assert!(store.save_cart(&[json!({"name": "Apple", "price": 1, "quantity": 1})]));
        assert!(store.clear_cart());
        assert!(store.load_cart().is_empty());
        assert!(!store.backend().contains_key(CART_KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_stores_keep_separate_timers() {
        let first = store();
        let second = store();

        first.debounced_save(&[json!({"name": "Apple", "price": 1, "quantity": 1})]);
        second.debounced_save(&[json!({"name": "Pear", "price": 1, "quantity": 1})]);
        assert!(first.has_pending_save());
        assert!(second.has_pending_save());

        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(first.load_cart()[0].name(), "Apple");
        assert_eq!(second.load_cart()[0].name(), "Pear");
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_save_uses_configured_delay() {
        let store = store().with_debounce(Duration::from_millis(100));
        store.debounced_save(&[json!({"name": "Apple", "price": 1, "quantity": 1})]);
        assert!(store.has_pending_save());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!store.backend().contains_key(CART_KEY));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!store.has_pending_save());
        assert_eq!(store.load_cart().len(), 1);
    }
}
