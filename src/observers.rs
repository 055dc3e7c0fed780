//! Ready-made observers.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::{PriceAlert, PriceTick};
use crate::observer::Observer;
use crate::subject::PriceSubject;

/// Prints every tick and alert to stdout, prefixed with its name.
pub struct ConsoleObserver {
    name: String,
}

impl ConsoleObserver {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Lines printed for one update.
    pub fn render(&self, tick: &PriceTick, alert: Option<&PriceAlert>) -> Vec<String> {
        let mut lines = vec![format!(
            "[{}] New {} price: ${:.2}",
            self.name,
            tick.symbol(),
            tick.price().round_dp(2)
        )];
        if let Some(alert) = alert {
            lines.push(format!("[{}] ALERT: {}", self.name, alert.message()));
        }
        lines
    }
}

#[async_trait]
impl Observer for ConsoleObserver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn update(
        &self,
        _subject: &PriceSubject,
        tick: &PriceTick,
        alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()> {
        for line in self.render(tick, alert) {
            println!("{line}");
        }
        Ok(())
    }
}

/// Emits ticks at `info` and alerts at `warn` through `tracing`.
#[derive(Default)]
pub struct TracingObserver;

#[async_trait]
impl Observer for TracingObserver {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn update(
        &self,
        _subject: &PriceSubject,
        tick: &PriceTick,
        alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()> {
        info!(
            symbol = tick.symbol(),
            price = %tick.price(),
            previous = ?tick.previous_price(),
            timestamp = %tick.timestamp(),
            "Price tick"
        );
        if let Some(alert) = alert {
            warn!(
                symbol = alert.symbol(),
                alert_type = alert.alert_type().as_str(),
                percent_change = %alert.percent_change().round_dp(2),
                "{}",
                alert.message()
            );
        }
        Ok(())
    }
}

/// One JSON line written by [`JsonLinesObserver`].
#[derive(Serialize)]
pub struct UpdateRecord<'a> {
    pub tick: &'a PriceTick,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<&'a PriceAlert>,
}

/// Prints each update as a single JSON object per line.
#[derive(Default)]
pub struct JsonLinesObserver;

impl JsonLinesObserver {
    /// Serializes one update.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(tick: &PriceTick, alert: Option<&PriceAlert>) -> serde_json::Result<String> {
        serde_json::to_string(&UpdateRecord { tick, alert })
    }
}

#[async_trait]
impl Observer for JsonLinesObserver {
    fn name(&self) -> &str {
        "json-lines"
    }

    async fn update(
        &self,
        _subject: &PriceSubject,
        tick: &PriceTick,
        alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()> {
        println!("{}", Self::encode(tick, alert)?);
        Ok(())
    }
}
