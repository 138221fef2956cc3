//! Core types for QuickBasket.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod cart;
pub mod price;
pub mod quantity;

pub use cart::{
    CartItem, ItemRejection, Normalized, Sanitized, cart_subtotal, normalize_item,
    sanitize_items, sanitize_items_with_report,
};
pub use price::{PriceError, UnitPrice};
pub use quantity::{Quantity, QuantityError};
