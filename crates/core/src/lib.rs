//! QuickBasket Core - Shared cart types.
//!
//! This crate provides the types every QuickBasket component agrees on:
//! - `cart-storage` - Durable cart persistence (envelope, migration, debounce)
//! - `cli` - Command-line tools for inspecting and editing a stored cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for prices and quantities, the [`CartItem`]
//!   line type, and the item normalizer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
