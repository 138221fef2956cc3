//! Immediate and debounced cart writes.
//!
//! [`save_items`] is the single write path: probe, normalize, encode, write.
//! [`Debouncer`] collapses a burst of save requests into one delayed call so
//! that rapid cart edits produce a single write.
//!
//! # Debounce states
//!
//! ```text
//! Idle --schedule--> Pending --delay elapses--> Idle (runs the save)
//!                    Pending --schedule--> Pending (previous timer aborted)
//! ```
//!
//! At most one timer exists per [`Debouncer`].

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use quickbasket_core::{CartItem, sanitize_items_with_report};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::CART_KEY;
use crate::backend::StorageBackend;
use crate::envelope::Envelope;
use crate::error::{Result, StoreError};
use crate::probe::is_available;

/// Default delay for debounced saves.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// What an immediate save persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Items written.
    pub saved: usize,
    /// Records dropped by normalization.
    pub dropped: usize,
}

/// Encode `items` into a fresh envelope and write it under [`CART_KEY`].
pub(crate) fn write_items<B: StorageBackend + ?Sized>(
    backend: &B,
    items: Vec<CartItem>,
) -> Result<()> {
    let payload = Envelope::new(items).to_json()?;
    backend.set(CART_KEY, &payload)?;
    Ok(())
}

/// Normalize `raw` and persist it.
///
/// On a quota failure the stored cart is replaced by an empty envelope before
/// the error is returned, so a cart too large to store never lingers in a
/// stale state.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the probe fails,
/// [`StoreError::QuotaExceeded`] after the degrade path ran, or the encode or
/// write error otherwise.
pub fn save_items<B: StorageBackend + ?Sized>(backend: &B, raw: &[Value]) -> Result<SaveReport> {
    if !is_available(backend) {
        return Err(StoreError::Unavailable);
    }

    let sanitized = sanitize_items_with_report(raw);
    if sanitized.dropped() > 0 {
        debug!(
            dropped = sanitized.dropped(),
            rejected = ?sanitized.rejected,
            "Dropped invalid cart items"
        );
    }
    let report = SaveReport {
        saved: sanitized.items.len(),
        dropped: sanitized.dropped(),
    };

    match write_items(backend, sanitized.items) {
        Ok(()) => Ok(report),
        Err(err @ StoreError::QuotaExceeded(_)) => {
            warn!(error = %err, "Cart exceeds storage quota, storing an empty cart");
            degrade_to_empty(backend);
            Err(err)
        }
        Err(err) => Err(err),
    }
}

fn degrade_to_empty<B: StorageBackend + ?Sized>(backend: &B) {
    let result = backend
        .remove(CART_KEY)
        .map_err(StoreError::from)
        .and_then(|()| write_items(backend, Vec::new()));

    if let Err(e) = result {
        warn!(error = %e, "Failed to store empty cart after quota error");
    }
}

/// Single-slot delayed task runner.
///
/// Scheduling aborts any pending task and starts a new timer. Tasks run on the
/// ambient tokio runtime; outside a runtime they run immediately.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create an idle debouncer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless another task is scheduled first.
    ///
    /// Returns `true` if a timer was started, `false` if `task` ran
    /// synchronously because no tokio runtime is active.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let Ok(handle) = Handle::try_current() else {
            drop(pending);
            warn!("No async runtime for debounced save, saving immediately");
            task();
            return false;
        };

        *pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        }));
        true
    }

    /// Whether a timer is waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::envelope::decode;

    #[test]
    fn test_save_reports_dropped() {
        let backend = MemoryBackend::new();
        let report = save_items(
            &backend,
            &[
                json!({"name": "Apple", "price": 1, "quantity": 1}),
                json!({"name": "Bad", "price": 0, "quantity": 1}),
            ],
        )
        .unwrap();

        assert_eq!(report, SaveReport { saved: 1, dropped: 1 });
        let stored = decode(&backend.peek(CART_KEY).unwrap()).unwrap();
        assert_eq!(stored.items.len(), 1);
    }

    #[test]
    fn test_quota_degrades_to_empty_envelope() {
        let backend = MemoryBackend::with_quota(160);
        let big: Vec<Value> = (0..20)
            .map(|i| json!({"name": format!("Item {i}"), "price": 1, "quantity": 1}))
            .collect();

        let err = save_items(&backend, &big).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded(_)));

        let stored = decode(&backend.peek(CART_KEY).unwrap()).unwrap();
        assert!(stored.items.is_empty());
    }

    #[test]
    fn test_unavailable() {
        let backend = MemoryBackend::new();
        backend.set_available(false);
        assert!(matches!(
            save_items(&backend, &[]),
            Err(StoreError::Unavailable)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_runs_only_last_task() {
        let debouncer = Debouncer::new();
        let last = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        for i in 1..=3 {
            let last = Arc::clone(&last);
            let runs = Arc::clone(&runs);
            assert!(debouncer.schedule(Duration::from_millis(100), move || {
                last.store(i, Ordering::SeqCst);
                runs.fetch_add(1, Ordering::SeqCst);
            }));
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        assert!(debouncer.is_pending());
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_debouncer_without_runtime_runs_inline() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        assert!(!debouncer.schedule(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }
}
