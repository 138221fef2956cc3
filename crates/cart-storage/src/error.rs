//! Error type for cart persistence steps.
//!
//! These errors never leave the crate through [`CartStore`]: the facade
//! matches on them, logs, and reports a plain `bool` or an empty cart. They
//! are public so embedders driving the individual steps can inspect them.
//!
//! [`CartStore`]: crate::CartStore

use thiserror::Error;

use crate::backend::BackendError;
use crate::envelope::DecodeError;

/// Failure of an internal persistence step.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed the availability probe.
    #[error("storage unavailable")]
    Unavailable,

    /// The stored payload could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The envelope could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The write exceeded the backend's size limit.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(#[source] BackendError),

    /// Any other backend failure.
    #[error("write failed: {0}")]
    Write(#[source] BackendError),
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::QuotaExceeded { .. } => Self::QuotaExceeded(err),
            BackendError::Unavailable(_) => Self::Unavailable,
            other => Self::Write(other),
        }
    }
}

/// Result type alias for [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
