//! Application configuration loaded from environment variables.
//!
//! Every variable is optional; empty values count as unset:
//! - `PRICEWATCH_ALERT_THRESHOLD` — fractional alert threshold (default `0.02`)
//! - `PRICEWATCH_SYMBOLS` — comma separated symbols to simulate (default `BTC`)
//! - `PRICEWATCH_START_PRICE` — starting price of the simulation (default `50000`)
//! - `PRICEWATCH_INTERVAL_MS` — pause between simulated updates (default `1000`)
//! - `PRICEWATCH_UPDATES` — number of simulated updates (default `10`)

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::models::{Price, Threshold};

const DEFAULT_SYMBOLS: &str = "BTC";
const DEFAULT_START_PRICE: Decimal = Decimal::from_parts(50000, 0, 0, false, 0);
const DEFAULT_INTERVAL_MS: u64 = 1000;
const DEFAULT_UPDATES: usize = 10;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub alerts: AlertConfig,
    pub simulation: SimulationConfig,
}

/// Settings for alert derivation.
#[derive(Debug)]
pub struct AlertConfig {
    pub threshold: Threshold,
}

/// Settings for the simulated price feed driven by the demo binary.
#[derive(Debug)]
pub struct SimulationConfig {
    pub symbols: Vec<String>,
    pub start_price: Price,
    pub interval: Duration,
    pub updates: usize,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`PricewatchError::Config`](crate::PricewatchError::Config) if a
/// variable cannot be parsed, the threshold or start price is negative, or
/// the symbol list contains no symbols.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let threshold: Decimal = parse_var("PRICEWATCH_ALERT_THRESHOLD", Threshold::default().ratio())?;
    let threshold = Threshold::new(threshold).map_err(|e| {
        crate::PricewatchError::Config(format!("PRICEWATCH_ALERT_THRESHOLD: {e}"))
    })?;

    let symbols = parse_symbols(
        &non_empty_var("PRICEWATCH_SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string()),
    );
    if symbols.is_empty() {
        return Err(crate::PricewatchError::Config(
            "PRICEWATCH_SYMBOLS contains no symbols".to_string(),
        ));
    }

    let start_price: Decimal = parse_var("PRICEWATCH_START_PRICE", DEFAULT_START_PRICE)?;
    let start_price = Price::try_from(start_price).map_err(|e| {
        crate::PricewatchError::Config(format!("PRICEWATCH_START_PRICE: {e}"))
    })?;

    let interval_ms: u64 = parse_var("PRICEWATCH_INTERVAL_MS", DEFAULT_INTERVAL_MS)?;
    let updates: usize = parse_var("PRICEWATCH_UPDATES", DEFAULT_UPDATES)?;

    Ok(AppConfig {
        alerts: AlertConfig { threshold },
        simulation: SimulationConfig {
            symbols,
            start_price,
            interval: Duration::from_millis(interval_ms),
            updates,
        },
    })
}

/// Splits a comma separated list, dropping blanks.
fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parses `name` if set, otherwise returns `default`.
fn parse_var<T>(name: &str, default: T) -> crate::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match non_empty_var(name) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            crate::PricewatchError::Config(format!("{name}: cannot parse {raw:?}: {e}"))
        }),
        None => Ok(default),
    }
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
