//! Significant-change alerts and the threshold that triggers them.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PriceTick;
use crate::error::ValidationError;

/// Default alert threshold (2%).
const DEFAULT_THRESHOLD: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Direction of a significant price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PriceIncrease,
    PriceDecrease,
}

impl AlertType {
    /// Returns the upper-case label used in alert messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::PriceIncrease => "PRICE_INCREASE",
            AlertType::PriceDecrease => "PRICE_DECREASE",
        }
    }
}

/// Minimum absolute fractional change that produces an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Threshold(Decimal);

impl Threshold {
    /// Creates a threshold from a fraction (`0.02` means 2%).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeThreshold`] for negative values.
    pub fn new(ratio: Decimal) -> Result<Self, ValidationError> {
        if ratio < Decimal::ZERO {
            return Err(ValidationError::NegativeThreshold(ratio.to_string()));
        }
        Ok(Self(ratio))
    }

    #[must_use]
    pub fn ratio(self) -> Decimal {
        self.0
    }

    /// Returns true when a move of `change` away from a positive `baseline`
    /// reaches the threshold, i.e. `|change| >= threshold * baseline`.
    ///
    /// Multiplying instead of dividing keeps the comparison exact when the
    /// ratio itself would not fit in a decimal.
    #[must_use]
    pub fn is_crossed_by(self, change: Decimal, baseline: Decimal) -> bool {
        match self.0.checked_mul(baseline) {
            Some(minimum) => change.abs() >= minimum,
            // threshold * baseline exceeds any representable change.
            None => false,
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

/// A price move between two consecutive ticks that reached the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAlert {
    symbol: String,
    alert_type: AlertType,
    percent_change: Decimal,
    old_price: Decimal,
    new_price: Decimal,
    timestamp: DateTime<Utc>,
}

impl PriceAlert {
    /// Derives the alert for `tick`, if any.
    ///
    /// No alert is produced without a positive previous price, for an
    /// unchanged price, or when the move stays below `threshold`.
    #[must_use]
    pub fn evaluate(tick: &PriceTick, threshold: Threshold) -> Option<Self> {
        let old_price = tick.previous_price().filter(|p| !p.is_zero())?;
        let change = tick.change()?;
        if change.is_zero() || !threshold.is_crossed_by(change, old_price) {
            return None;
        }

        let (alert_type, saturated) = if change > Decimal::ZERO {
            (AlertType::PriceIncrease, Decimal::MAX)
        } else {
            (AlertType::PriceDecrease, Decimal::MIN)
        };
        // Moves off a tiny baseline can exceed the decimal range in percent.
        let percent_change = tick
            .change_ratio()
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(saturated);

        Some(Self {
            symbol: tick.symbol().to_string(),
            alert_type,
            percent_change,
            old_price,
            new_price: tick.price(),
            timestamp: tick.timestamp(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn alert_type(&self) -> AlertType {
        self.alert_type
    }

    /// Signed change in percent (`-4.374` for a 4.374% drop).
    pub fn percent_change(&self) -> Decimal {
        self.percent_change
    }

    pub fn old_price(&self) -> Decimal {
        self.old_price
    }

    pub fn new_price(&self) -> Decimal {
        self.new_price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Human-readable summary, e.g.
    /// `PRICE_DECREASE! BTC fell 4.37% ($50000.00 -> $47813.00)`.
    pub fn message(&self) -> String {
        let direction = match self.alert_type {
            AlertType::PriceIncrease => "rose",
            AlertType::PriceDecrease => "fell",
        };
        format!(
            "{}! {} {} {:.2}% (${:.2} -> ${:.2})",
            self.alert_type.as_str(),
            self.symbol.to_uppercase(),
            direction,
            self.percent_change.abs().round_dp(2),
            self.old_price.round_dp(2),
            self.new_price.round_dp(2),
        )
    }
}

impl fmt::Display for PriceAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Price;
    use rust_decimal_macros::dec;

    fn tick(old: Option<Decimal>, new: Decimal) -> PriceTick {
        PriceTick::new(
            "BTC",
            Price::try_from(new).unwrap(),
            old.map(|p| Price::try_from(p).unwrap()),
        )
    }

    #[test]
    fn default_threshold_is_two_percent() {
        assert_eq!(Threshold::default().ratio(), dec!(0.02));
    }

    #[test]
    fn negative_threshold_rejected() {
        assert!(matches!(
            Threshold::new(dec!(-0.01)),
            Err(ValidationError::NegativeThreshold(_))
        ));
    }

    #[test]
    fn drop_past_threshold_alerts() {
        let alert = PriceAlert::evaluate(&tick(Some(dec!(50000.00)), dec!(47813.00)), Threshold::default())
            .expect("alert expected");
        assert_eq!(alert.alert_type(), AlertType::PriceDecrease);
        assert_eq!(alert.percent_change(), dec!(-4.374));
        assert_eq!(alert.old_price(), dec!(50000.00));
        assert_eq!(alert.new_price(), dec!(47813.00));
    }

    #[test]
    fn rise_past_threshold_alerts() {
        let alert = PriceAlert::evaluate(&tick(Some(dec!(100)), dec!(103)), Threshold::default())
            .expect("alert expected");
        assert_eq!(alert.alert_type(), AlertType::PriceIncrease);
        assert_eq!(alert.percent_change(), dec!(3));
    }

    #[test]
    fn small_move_does_not_alert() {
        let t = tick(Some(dec!(47813.00)), dec!(47900.00));
        assert!(PriceAlert::evaluate(&t, Threshold::default()).is_none());
    }

    #[test]
    fn exactly_at_threshold_alerts() {
        let t = tick(Some(dec!(50000)), dec!(51000));
        let alert = PriceAlert::evaluate(&t, Threshold::default()).unwrap();
        assert_eq!(alert.percent_change(), dec!(2));
    }

    #[test]
    fn no_baseline_never_alerts() {
        assert!(PriceAlert::evaluate(&tick(None, dec!(1000000)), Threshold::default()).is_none());
    }

    #[test]
    fn zero_baseline_never_alerts() {
        assert!(PriceAlert::evaluate(&tick(Some(dec!(0)), dec!(10)), Threshold::default()).is_none());
    }

    #[test]
    fn equal_prices_never_alert_even_with_zero_threshold() {
        let threshold = Threshold::new(Decimal::ZERO).unwrap();
        assert!(PriceAlert::evaluate(&tick(Some(dec!(10)), dec!(10)), threshold).is_none());
    }

    #[test]
    fn tiny_baseline_saturates_percent_change() {
        let baseline = Decimal::new(1, 28);
        for new in [dec!(1), dec!(1000000000000)] {
            let alert = PriceAlert::evaluate(&tick(Some(baseline), new), Threshold::default())
                .expect("huge rise must alert");
            assert_eq!(alert.alert_type(), AlertType::PriceIncrease);
            assert_eq!(alert.percent_change(), Decimal::MAX);
            assert_eq!(alert.old_price(), baseline);
        }
    }

    #[test]
    fn tiny_baseline_drop_to_zero_alerts() {
        let alert = PriceAlert::evaluate(&tick(Some(Decimal::new(1, 28)), dec!(0)), Threshold::default())
            .unwrap();
        assert_eq!(alert.alert_type(), AlertType::PriceDecrease);
        assert_eq!(alert.percent_change(), dec!(-100));
    }

    #[test]
    fn huge_threshold_never_crossed() {
        let threshold = Threshold::new(Decimal::MAX).unwrap();
        assert!(!threshold.is_crossed_by(Decimal::MAX, dec!(2)));
        assert!(PriceAlert::evaluate(&tick(Some(dec!(2)), dec!(1000)), threshold).is_none());
    }

    #[test]
    fn alert_copies_tick_timestamp() {
        let t = tick(Some(dec!(100)), dec!(90));
        let alert = PriceAlert::evaluate(&t, Threshold::default()).unwrap();
        assert_eq!(alert.timestamp(), t.timestamp());
        assert_eq!(alert.symbol(), "BTC");
    }

    #[test]
    fn message_describes_move() {
        let alert = PriceAlert::evaluate(&tick(Some(dec!(50000.00)), dec!(47813.00)), Threshold::default())
            .unwrap();
        assert_eq!(
            alert.message(),
            "PRICE_DECREASE! BTC fell 4.37% ($50000.00 -> $47813.00)"
        );
        assert_eq!(alert.to_string(), alert.message());
    }

    #[test]
    fn alert_type_wire_name() {
        let json = serde_json::to_string(&AlertType::PriceIncrease).unwrap();
        assert_eq!(json, "\"price_increase\"");
    }
}
