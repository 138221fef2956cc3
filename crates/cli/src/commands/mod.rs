//! Command implementations and shared plumbing.

use std::path::PathBuf;

use quickbasket_cart_storage::{BackendError, CartStore, CartStoreConfig, ConfigError, FileBackend};
use quickbasket_core::{ItemRejection, PriceError, QuantityError};
use thiserror::Error;

pub mod cart;
pub mod storage;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage directory could not be opened.
    #[error("Storage error: {0}")]
    Backend(#[from] BackendError),

    /// Price argument is invalid.
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    /// Quantity argument is invalid.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    /// Item arguments are invalid.
    #[error("Invalid item: {0}")]
    InvalidItem(#[from] ItemRejection),

    /// No line with the given name.
    #[error("No item named {0:?} in the cart")]
    NotFound(String),

    /// The store reported a failed write.
    #[error("Failed to save cart (storage unavailable or full)")]
    SaveFailed,

    /// The store reported a failed delete.
    #[error("Failed to clear cart (storage unavailable)")]
    ClearFailed,

    /// Output could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Open a file-backed store from environment configuration.
///
/// `dir` overrides the configured storage directory.
pub fn open_store(dir: Option<PathBuf>) -> Result<CartStore<FileBackend>, CommandError> {
    let mut config = CartStoreConfig::from_env()?;
    if let Some(dir) = dir {
        config.storage_dir = dir;
    }

    tracing::debug!(dir = %config.storage_dir.display(), "Opening cart storage");
    let backend = config.open_file_backend()?;
    Ok(CartStore::with_config(backend, &config))
}
