//! Cart line items and the item normalizer.
//!
//! Anything read back from storage, or handed to the persistence layer by a
//! caller, is an untyped JSON record until it passes through
//! [`normalize_item`]. The normalizer is the only way to obtain a
//! [`CartItem`] from raw data, so every item a caller sees has a trimmed
//! non-empty name, a positive two-place price, and a positive whole quantity.
//!
//! ## Coercion
//!
//! `price` and `quantity` are coerced loosely: JSON numbers are taken as-is,
//! strings are trimmed and parsed (an empty string counts as `0`), and
//! booleans count as `1` or `0`. `null`, arrays and objects are rejected.

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::price::{PriceError, UnitPrice};
use super::quantity::{Quantity, QuantityError};

/// Why a raw record was rejected by [`normalize_item`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemRejection {
    /// The record is not a JSON object.
    #[error("item is not an object")]
    NotAnObject,
    /// `name` is absent or not a string.
    #[error("item name is missing or not a string")]
    MissingName,
    /// `name` is empty after trimming.
    #[error("item name is empty")]
    EmptyName,
    /// `price` cannot be coerced to a finite number.
    #[error("item price is not a number")]
    InvalidPrice,
    /// `price` is zero or negative, or rounds to zero.
    #[error("item price must be greater than zero")]
    NonPositivePrice,
    /// `price` is larger than the largest representable amount.
    #[error("item price is too large")]
    PriceOutOfRange,
    /// `quantity` cannot be coerced to a finite number.
    #[error("item quantity is not a number")]
    InvalidQuantity,
    /// `quantity` is zero or negative, or truncates to zero.
    #[error("item quantity must be at least 1")]
    NonPositiveQuantity,
    /// `quantity` is larger than the supported maximum.
    #[error("item quantity is too large")]
    QuantityOutOfRange,
}

impl From<PriceError> for ItemRejection {
    fn from(err: PriceError) -> Self {
        match err {
            PriceError::NotANumber(_) => Self::InvalidPrice,
            PriceError::NonPositive => Self::NonPositivePrice,
            PriceError::OutOfRange => Self::PriceOutOfRange,
        }
    }
}

impl From<QuantityError> for ItemRejection {
    fn from(err: QuantityError) -> Self {
        match err {
            QuantityError::NotFinite => Self::InvalidQuantity,
            QuantityError::NonPositive => Self::NonPositiveQuantity,
            QuantityError::OutOfRange { .. } => Self::QuantityOutOfRange,
        }
    }
}

/// One cart line.
///
/// `name` doubles as the merge key for callers that combine repeated adds of
/// the same product; uniqueness is not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    id: Value,
    name: String,
    image: String,
    price: UnitPrice,
    quantity: Quantity,
}

impl CartItem {
    /// Create an item with no id and no image.
    ///
    /// # Errors
    ///
    /// Returns [`ItemRejection::EmptyName`] if `name` is blank.
    pub fn new(
        name: &str,
        price: UnitPrice,
        quantity: Quantity,
    ) -> Result<Self, ItemRejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ItemRejection::EmptyName);
        }

        Ok(Self {
            id: Value::Null,
            name: name.to_owned(),
            image: String::new(),
            price,
            quantity,
        })
    }

    /// Set the caller-supplied identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Replace the unit price.
    #[must_use]
    pub const fn with_price(mut self, price: UnitPrice) -> Self {
        self.price = price;
        self
    }

    /// Replace the quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    /// Opaque caller-supplied identifier (`null` when absent).
    #[must_use]
    pub const fn id(&self) -> &Value {
        &self.id
    }

    /// Trimmed, non-empty display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image reference; may be empty.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Unit price.
    #[must_use]
    pub const fn price(&self) -> UnitPrice {
        self.price
    }

    /// Line quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Unit price times quantity, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price
            .amount()
            .saturating_mul(Decimal::from(self.quantity.get()))
    }
}

// Deserializing goes through the normalizer so a `CartItem` can never be
// built from unchecked data.
impl<'de> Deserialize<'de> for CartItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        match normalize_item(&raw) {
            Normalized::Valid(item) => Ok(item),
            Normalized::Rejected(reason) => Err(serde::de::Error::custom(reason)),
        }
    }
}

/// Outcome of normalizing one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// The record was valid (possibly after coercion).
    Valid(CartItem),
    /// The record must be dropped.
    Rejected(ItemRejection),
}

impl Normalized {
    /// The item, if valid.
    #[must_use]
    pub fn into_item(self) -> Option<CartItem> {
        match self {
            Self::Valid(item) => Some(item),
            Self::Rejected(_) => None,
        }
    }

    /// Returns `true` for [`Normalized::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Validate and coerce one raw record.
///
/// Rules are applied in order: object check, name, price, quantity. The first
/// failing rule determines the rejection reason.
#[must_use]
pub fn normalize_item(raw: &Value) -> Normalized {
    match try_normalize(raw) {
        Ok(item) => Normalized::Valid(item),
        Err(reason) => Normalized::Rejected(reason),
    }
}

fn try_normalize(raw: &Value) -> Result<CartItem, ItemRejection> {
    let fields = raw.as_object().ok_or(ItemRejection::NotAnObject)?;

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .ok_or(ItemRejection::MissingName)?;

    let price_text = fields
        .get("price")
        .and_then(numeric_text)
        .ok_or(ItemRejection::InvalidPrice)?;
    let price = UnitPrice::parse(&price_text)?;

    let quantity_value = fields
        .get("quantity")
        .and_then(numeric_text)
        .and_then(|text| text.parse::<f64>().ok())
        .ok_or(ItemRejection::InvalidQuantity)?;
    let quantity = Quantity::from_f64(quantity_value)?;

    let image = fields
        .get("image")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let id = fields.get("id").cloned().unwrap_or(Value::Null);

    Ok(CartItem::new(name, price, quantity)?
        .with_image(image)
        .with_id(id))
}

/// Decimal text for a loosely-numeric JSON value, or `None` if the value
/// cannot be coerced at all.
fn numeric_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(Cow::Borrowed("0"))
            } else {
                Some(Cow::Borrowed(trimmed))
            }
        }
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "1" } else { "0" })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Result of [`sanitize_items_with_report`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sanitized {
    /// Items that passed normalization, in input order.
    pub items: Vec<CartItem>,
    /// Input index and reason for every dropped record.
    pub rejected: Vec<(usize, ItemRejection)>,
}

impl Sanitized {
    /// Number of records dropped.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.rejected.len()
    }
}

/// Normalize every record, silently dropping the invalid ones.
#[must_use]
pub fn sanitize_items(raw: &[Value]) -> Vec<CartItem> {
    raw.iter()
        .filter_map(|value| normalize_item(value).into_item())
        .collect()
}

/// Normalize every record and report which ones were dropped and why.
#[must_use]
pub fn sanitize_items_with_report(raw: &[Value]) -> Sanitized {
    let mut sanitized = Sanitized::default();
    for (index, value) in raw.iter().enumerate() {
        match normalize_item(value) {
            Normalized::Valid(item) => sanitized.items.push(item),
            Normalized::Rejected(reason) => sanitized.rejected.push((index, reason)),
        }
    }
    sanitized
}

/// Sum of line totals, saturating at [`Decimal::MAX`].
#[must_use]
pub fn cart_subtotal(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(CartItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}
