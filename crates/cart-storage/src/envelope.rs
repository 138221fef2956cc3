//! Versioned envelope around the persisted item list.
//!
//! # Format
//!
//! ```json
//! {
//!   "type": "quickbasket-cart",
//!   "version": "2.0",
//!   "updatedAt": 1760000000000,
//!   "items": [
//!     { "id": null, "name": "Mango", "image": "", "price": 20.0, "quantity": 1 }
//!   ]
//! }
//! ```
//!
//! Decoding is loose: only an `items` array is required. The
//! `type` and `version` fields are surfaced but not acted on; a future schema
//! bump can branch on [`StoredEnvelope::version`].

use chrono::Utc;
use quickbasket_core::{CartItem, Sanitized, sanitize_items_with_report};
use serde::Serialize;
use serde_json::Value;

/// Discriminator written to the `type` field.
pub const ENVELOPE_TYPE: &str = "quickbasket-cart";

/// Schema version written by this crate.
pub const SCHEMA_VERSION: &str = "2.0";

/// Errors produced when a stored payload cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload is JSON but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// The object has no `items` array.
    #[error("payload has no items array")]
    MissingItems,
}

/// The unit written to storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Always [`ENVELOPE_TYPE`].
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Always [`SCHEMA_VERSION`].
    pub version: &'static str,
    /// Write time in milliseconds since the Unix epoch.
    pub updated_at: i64,
    /// Normalized items in insertion order.
    pub items: Vec<CartItem>,
}

impl Envelope {
    /// Wrap `items`, stamped with the current time.
    #[must_use]
    pub fn new(items: Vec<CartItem>) -> Self {
        Self::at(items, Utc::now().timestamp_millis())
    }

    /// Wrap `items` with an explicit timestamp.
    #[must_use]
    pub const fn at(items: Vec<CartItem>, updated_at: i64) -> Self {
        Self {
            kind: ENVELOPE_TYPE,
            version: SCHEMA_VERSION,
            updated_at,
            items,
        }
    }

    /// Serialize to the persisted JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if an item id cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// An envelope read back from storage, items not yet normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEnvelope {
    /// The `type` field, if it is a string.
    pub kind: Option<String>,
    /// The `version` field, if it is a non-empty string.
    pub version: Option<String>,
    /// The `updatedAt` field, if it is an integer.
    pub updated_at: Option<i64>,
    /// Raw item records.
    pub items: Vec<Value>,
}

impl StoredEnvelope {
    /// Normalize the stored items, keeping the rejection report.
    #[must_use]
    pub fn sanitize(&self) -> Sanitized {
        sanitize_items_with_report(&self.items)
    }
}

/// Parse a stored payload.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the payload is not JSON, not an object, or
/// lacks an `items` array.
pub fn decode(raw: &str) -> Result<StoredEnvelope, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let Some(Value::Array(items)) = fields.remove("items") else {
        return Err(DecodeError::MissingItems);
    };

    Ok(StoredEnvelope {
        kind: fields
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned),
        version: fields
            .get("version")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_owned),
        updated_at: fields.get("updatedAt").and_then(Value::as_i64),
        items,
    })
}
