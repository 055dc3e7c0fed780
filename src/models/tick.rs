use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::Price;

/// One accepted price observation for a symbol.
///
/// `previous_price` is the price accepted immediately before this one for
/// the same symbol and is `None` only for the first tick a subject ever
/// sees for that symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTick {
    symbol: String,
    price: Price,
    previous_price: Option<Price>,
    timestamp: DateTime<Utc>,
}

impl PriceTick {
    /// Builds a tick stamped with the current wall-clock time.
    #[must_use]
    pub fn new(symbol: impl Into<String>, price: Price, previous_price: Option<Price>) -> Self {
        Self::at(symbol, price, previous_price, Utc::now())
    }

    /// Builds a tick with an explicit timestamp.
    #[must_use]
    pub fn at(
        symbol: impl Into<String>,
        price: Price,
        previous_price: Option<Price>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            previous_price,
            timestamp,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn price(&self) -> Decimal {
        self.price.value()
    }

    pub fn previous_price(&self) -> Option<Decimal> {
        self.previous_price.map(Price::value)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Absolute change from the previous price, if there was one.
    pub fn change(&self) -> Option<Decimal> {
        let previous = self.previous_price?;
        self.price.value().checked_sub(previous.value())
    }

    /// Fractional change from the previous price (`0.01` is one percent).
    ///
    /// Undefined, and therefore `None`, when there is no previous price or
    /// the previous price was zero.
    pub fn change_ratio(&self) -> Option<Decimal> {
        let previous = self.previous_price.filter(|p| !p.is_zero())?;
        self.change()?.checked_div(previous.value())
    }
}
