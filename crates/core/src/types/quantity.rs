//! Whole-number line quantity.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// The input is NaN or infinite.
    #[error("quantity is not a finite number")]
    NotFinite,
    /// The input is zero or negative, or truncates to zero.
    #[error("quantity must be at least 1")]
    NonPositive,
    /// The input does not fit in a `u64`.
    #[error("quantity must be at most {max}")]
    OutOfRange {
        /// Largest accepted quantity.
        max: u64,
    },
}

/// A positive integer quantity.
///
/// Fractional inputs are truncated toward zero rather than rejected, so
/// `2.7` becomes `2`. Inputs that truncate to `0` are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(1);

    /// Create a quantity from a whole number.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NonPositive`] for `0`.
    pub const fn new(value: u64) -> Result<Self, QuantityError> {
        if value == 0 {
            return Err(QuantityError::NonPositive);
        }
        Ok(Self(value))
    }

    /// Create a quantity from a loosely-typed number, truncating fractions.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite, is `<= 0`, truncates to
    /// zero, or is `2^64` or larger.
    pub fn from_f64(value: f64) -> Result<Self, QuantityError> {
        if !value.is_finite() {
            return Err(QuantityError::NotFinite);
        }
        if value <= 0.0 {
            return Err(QuantityError::NonPositive);
        }

        // `u64::MAX as f64` rounds up to 2^64, the first unrepresentable value.
        #[allow(clippy::cast_precision_loss)]
        let limit = u64::MAX as f64;
        let whole = value.trunc();
        if whole >= limit {
            return Err(QuantityError::OutOfRange { max: u64::MAX });
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = whole as u64;
        Self::new(whole)
    }

    /// The underlying count.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Add two quantities, saturating at `u64::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u64 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_fractions() {
        assert_eq!(Quantity::from_f64(2.7).unwrap().get(), 2);
        assert_eq!(Quantity::from_f64(1.0).unwrap().get(), 1);
    }

    #[test]
    fn test_rejects_zero_after_truncation() {
        assert_eq!(Quantity::from_f64(0.5), Err(QuantityError::NonPositive));
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(Quantity::from_f64(0.0), Err(QuantityError::NonPositive));
        assert_eq!(Quantity::from_f64(-3.0), Err(QuantityError::NonPositive));
        assert_eq!(Quantity::new(0), Err(QuantityError::NonPositive));
    }

    #[test]
    fn test_rejects_non_finite() {
        assert_eq!(Quantity::from_f64(f64::NAN), Err(QuantityError::NotFinite));
        assert_eq!(
            Quantity::from_f64(f64::INFINITY),
            Err(QuantityError::NotFinite)
        );
    }

    #[test]
    fn test_accepts_quantities_beyond_u32() {
        assert_eq!(
            Quantity::from_f64(5_000_000_000.0).unwrap().get(),
            5_000_000_000
        );
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            Quantity::from_f64(1e20),
            Err(QuantityError::OutOfRange { .. })
        ));
        assert!(matches!(
            Quantity::from_f64(18_446_744_073_709_551_616.0),
            Err(QuantityError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_saturating_add() {
        let max = Quantity::new(u64::MAX).unwrap();
        assert_eq!(max.saturating_add(Quantity::ONE), max);
    }

    #[test]
    fn test_serde() {
        let q = Quantity::new(3).unwrap();
        assert_eq!(serde_json::to_string(&q).unwrap(), "3");
        let parsed: Quantity = serde_json::from_str("3.9").unwrap();
        assert_eq!(parsed, q);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }
}
