//! Backend availability probe.

use tracing::debug;

use crate::backend::StorageBackend;

/// Sentinel key written and removed by [`is_available`].
pub const PROBE_KEY: &str = "__storage_test__";

/// Returns `true` if a trivial write-then-delete against `backend` succeeds.
///
/// Any failure (backend disabled, read-only, full) counts as unavailable.
pub fn is_available<B: StorageBackend + ?Sized>(backend: &B) -> bool {
    match backend
        .set(PROBE_KEY, "1")
        .and_then(|()| backend.remove(PROBE_KEY))
    {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Storage probe failed");
            false
        }
    }
}
