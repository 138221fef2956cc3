//! Type-safe unit price using decimal arithmetic.
//!
//! Cart prices are stored in monetary units (not cents) and always carry
//! exactly two decimal places. Rounding uses half-away-from-zero so that a
//! value like `9.995` becomes `10.00` instead of drifting down through binary
//! floating point.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`UnitPrice`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a finite decimal number.
    #[error("price is not a finite number: {0:?}")]
    NotANumber(String),
    /// The amount is zero or negative (before or after rounding).
    #[error("price must be greater than zero")]
    NonPositive,
    /// The amount is finite but beyond the largest representable decimal.
    #[error("price exceeds the largest supported amount")]
    OutOfRange,
}

/// A positive price rounded to two decimal places.
///
/// ## Examples
///
/// ```
/// use quickbasket_core::UnitPrice;
/// use rust_decimal::Decimal;
///
/// let price = UnitPrice::parse("9.995").unwrap();
/// assert_eq!(price.amount(), Decimal::new(1000, 2));
/// assert_eq!(price.to_string(), "10.00");
///
/// assert!(UnitPrice::parse("0").is_err());
/// assert!(UnitPrice::parse("0.001").is_err()); // rounds to zero
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitPrice(Decimal);

impl UnitPrice {
    /// Number of decimal places every price is stored with.
    pub const SCALE: u32 = 2;

    /// Round `amount` to two places and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NonPositive`] if the amount is `<= 0` before or
    /// after rounding.
    pub fn from_decimal(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NonPositive);
        }

        let mut rounded =
            amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded <= Decimal::ZERO {
            return Err(PriceError::NonPositive);
        }
        rounded.rescale(Self::SCALE);

        Ok(Self(rounded))
    }

    /// Parse a price from its decimal text, accepting plain (`"12.5"`) and
    /// scientific (`"1.25e1"`) notation.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] for text that is not a finite
    /// number, [`PriceError::OutOfRange`] for finite amounts too large for a
    /// [`Decimal`], and [`PriceError::NonPositive`] as in
    /// [`Self::from_decimal`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let text = s.trim();
        match Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)) {
            Ok(amount) => Self::from_decimal(amount),
            Err(_) => Err(classify_unparsable(text)),
        }
    }

    /// The rounded amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

/// Why `text` did not parse as a [`Decimal`].
///
/// Finite numbers outside the decimal range are either too large, or so
/// small they round to zero.
fn classify_unparsable(text: &str) -> PriceError {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 1.0 => PriceError::OutOfRange,
        Ok(value) if value.is_finite() => PriceError::NonPositive,
        _ => PriceError::NotANumber(text.to_owned()),
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for UnitPrice {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for UnitPrice {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(amount)
    }
}

impl From<UnitPrice> for Decimal {
    fn from(price: UnitPrice) -> Self {
        price.0
    }
}

// Persisted as a plain JSON number, not a string.
impl Serialize for UnitPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for UnitPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}
