//! QuickBasket Cart Storage - Durable shopping-cart persistence.
//!
//! Stores a cart under a single key as a versioned JSON envelope, validates
//! everything read back, coalesces bursts of writes, and migrates carts
//! written under deprecated keys.
//!
//! # Architecture
//!
//! Leaf-first:
//!
//! - [`backend`] / [`file`] - the key-value storage seam ([`StorageBackend`])
//!   with in-memory and directory-backed implementations
//! - [`probe`] - write-then-delete availability check
//! - [`envelope`] - envelope encoding and loose decoding
//! - [`migrate`] - legacy key migration
//! - [`scheduler`] - immediate saves, quota degrade, and the debounce timer
//! - [`diagnostics`] - read-only storage snapshot
//! - [`store`] - the [`CartStore`] facade composing all of the above
//!
//! Item validation itself lives in `quickbasket-core`.
//!
//! # Limitations
//!
//! Two stores sharing a backend (two processes on one directory, or two
//! tabs on one origin) are not coordinated: their writes race and the last
//! writer wins.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod file;
pub mod migrate;
pub mod probe;
pub mod scheduler;
pub mod store;

/// Key the current cart envelope is stored under.
pub const CART_KEY: &str = "quickbasket_cart";

pub use backend::{BackendError, MemoryBackend, StorageBackend};
pub use config::{CartStoreConfig, ConfigError};
pub use diagnostics::StorageInfo;
pub use envelope::{DecodeError, ENVELOPE_TYPE, Envelope, SCHEMA_VERSION, StoredEnvelope};
pub use error::StoreError;
pub use file::FileBackend;
pub use migrate::{LEGACY_KEYS, Migration};
pub use scheduler::{DEFAULT_DEBOUNCE, Debouncer, SaveReport};
pub use store::CartStore;
