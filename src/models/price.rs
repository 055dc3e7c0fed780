//! Validated price values.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;

use crate::error::ValidationError;

/// A finite, non-negative price.
///
/// The only way to obtain one is through `TryFrom`, so any `Price` in the
/// system has already passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Returns the underlying decimal value.
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value < Decimal::ZERO {
            return Err(ValidationError::Negative(value.to_string()));
        }
        // Normalise -0 so that it compares and prints as plain zero.
        if value.is_zero() {
            return Ok(Self::ZERO);
        }
        Ok(Self(value))
    }
}

impl TryFrom<f64> for Price {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_nan() {
            return Err(ValidationError::NotANumber);
        }
        if value.is_infinite() {
            return Err(ValidationError::Infinite(value));
        }
        if value < 0.0 {
            return Err(ValidationError::Negative(value.to_string()));
        }
        let decimal = Decimal::from_f64(value).ok_or(ValidationError::Unrepresentable(value))?;
        Self::try_from(decimal)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
