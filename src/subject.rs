//! The price subject: latest price per symbol plus an observer registry.
//!
//! [`PriceSubject::set_price`] is the central operation. It validates the
//! input, records the new price, builds a [`PriceTick`] and (when the move
//! crosses the threshold) a [`PriceAlert`], then awaits every registered
//! observer in registration order.
//!
//! State is keyed per symbol, so updates for different symbols may run
//! concurrently. A second update for a symbol whose fan-out is still in
//! progress, whether nested from inside an observer or issued by another
//! task, is rejected with [`PricewatchError::Reentrant`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::Result;
use crate::config::AppConfig;
use crate::error::PricewatchError;
use crate::models::{Price, PriceAlert, PriceTick, Threshold};
use crate::observer::{Observer, ObserverRegistry};

/// Observable price tracker.
#[derive(Default)]
pub struct PriceSubject {
    prices: Mutex<HashMap<String, Price>>,
    observers: ObserverRegistry,
    threshold: Threshold,
    in_flight: Mutex<HashSet<String>>,
}

impl PriceSubject {
    /// Creates a subject with the default 2% alert threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_threshold(threshold: Threshold) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_threshold(config.alerts.threshold)
    }

    /// Adds `observer` to the end of the notification order. Registering an
    /// instance that is already present has no effect.
    pub fn register(&self, observer: Arc<dyn Observer>) {
        let name = observer.name().to_string();
        if self.observers.register(observer) {
            debug!(observer = %name, count = self.observers.len(), "Registered observer");
        }
    }

    /// Removes `observer`; unknown observers are ignored.
    pub fn unregister(&self, observer: &Arc<dyn Observer>) {
        if self.observers.unregister(observer) {
            debug!(
                observer = observer.name(),
                count = self.observers.len(),
                "Unregistered observer"
            );
        }
    }

    pub fn is_registered(&self, observer: &Arc<dyn Observer>) -> bool {
        self.observers.contains(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Returns the last accepted price for `symbol`.
    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        lock(&self.prices).get(symbol).map(|p| p.value())
    }

    /// Returns every symbol with a known price, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = lock(&self.prices).keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Accepts a new price for `symbol` and notifies every observer.
    ///
    /// Returns the alert delivered alongside the tick, if one was raised.
    /// Observer failures are logged and never returned here.
    ///
    /// # Errors
    ///
    /// Returns [`PricewatchError::Validation`] for a negative, NaN or
    /// infinite price and [`PricewatchError::Reentrant`] when a fan-out for
    /// `symbol` is already running. In both cases nothing is stored and no
    /// observer is called.
    pub async fn set_price<P>(&self, symbol: &str, price: P) -> Result<Option<PriceAlert>>
    where
        P: TryInto<Price>,
        PricewatchError: From<P::Error>,
    {
        let price: Price = price.try_into()?;
        let _guard = self.begin_fan_out(symbol)?;

        let previous = lock(&self.prices).insert(symbol.to_string(), price);
        let tick = PriceTick::new(symbol, price, previous);
        let alert = PriceAlert::evaluate(&tick, self.threshold);

        debug!(
            symbol,
            price = %tick.price(),
            previous = ?tick.previous_price(),
            "Accepted price"
        );
        if let Some(ref alert) = alert {
            info!(
                symbol,
                alert_type = alert.alert_type().as_str(),
                percent_change = %alert.percent_change().round_dp(2),
                old_price = %alert.old_price(),
                new_price = %alert.new_price(),
                "Price alert"
            );
        }

        let report = self.observers.notify(self, &tick, alert.as_ref()).await;
        debug!(
            symbol,
            delivered = report.delivered,
            failed = report.failed,
            "Fan-out complete"
        );

        Ok(alert)
    }

    fn begin_fan_out(&self, symbol: &str) -> Result<FanOutGuard<'_>> {
        if !lock(&self.in_flight).insert(symbol.to_string()) {
            return Err(PricewatchError::Reentrant {
                symbol: symbol.to_string(),
            });
        }
        Ok(FanOutGuard {
            in_flight: &self.in_flight,
            symbol: symbol.to_string(),
        })
    }
}

/// Marks a symbol as being fanned out until dropped, including when the
/// `set_price` future is cancelled mid-notification.
struct FanOutGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    symbol: String,
}

impl Drop for FanOutGuard<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.symbol);
    }
}

/// Every critical section leaves its map consistent, so a poisoned lock is
/// still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
