//! Price sources and the monitor loop that feeds them into a subject.
//!
//! There is no exchange connectivity here: [`RandomWalk`] produces
//! simulated prices, and [`Monitor`] polls any [`PriceSource`] on an
//! interval, pushing each sample through
//! [`PriceSubject::set_price`](crate::subject::PriceSubject::set_price).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::Result;
use crate::models::{Price, PriceAlert};
use crate::subject::PriceSubject;

/// Default maximum move per step (5%).
const DEFAULT_MAX_STEP: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Resolution of the random step: steps are multiples of 1/STEP_BUCKETS of
/// the maximum move.
const STEP_BUCKETS: u64 = 10_000;

/// Seed used when zero is supplied, since xorshift never leaves zero.
const FALLBACK_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Something that can be asked for the next price of a symbol.
#[async_trait]
pub trait PriceSource: Send {
    /// Returns the next sample for `symbol`, or `None` if the source has
    /// nothing for it this round.
    ///
    /// # Errors
    ///
    /// Returns [`PricewatchError::Source`](crate::PricewatchError::Source)
    /// when the sample cannot be produced.
    async fn next_price(&mut self, symbol: &str) -> Result<Option<Decimal>>;
}

/// Deterministic random walk: each symbol starts at `start_price` and then
/// moves by a uniform step within `±max_step` of its current value.
pub struct RandomWalk {
    start_price: Price,
    max_step: Decimal,
    prices: HashMap<String, Decimal>,
    state: u64,
}

impl RandomWalk {
    #[must_use]
    pub fn new(start_price: Price, seed: u64) -> Self {
        Self {
            start_price,
            max_step: DEFAULT_MAX_STEP,
            prices: HashMap::new(),
            state: if seed == 0 { FALLBACK_SEED } else { seed },
        }
    }

    /// Sets the maximum fractional move per step (`0.05` is 5%).
    #[must_use]
    pub fn with_max_step(mut self, max_step: Decimal) -> Self {
        self.max_step = max_step.abs();
        self
    }

    /// xorshift64
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform value in `[-1, 1]` with four decimal places.
    fn next_unit(&mut self) -> Decimal {
        let bucket = (self.next_u64() % (2 * STEP_BUCKETS + 1)) as i64 - STEP_BUCKETS as i64;
        Decimal::new(bucket, 4)
    }

    /// Moves `current` by `current * max_step * unit`, clamped to
    /// `[0, Decimal::MAX]` when the move leaves the decimal range.
    fn step(&mut self, current: Decimal) -> Decimal {
        let unit = self.next_unit();
        let bound = if unit.is_sign_negative() {
            Decimal::ZERO
        } else {
            Decimal::MAX
        };
        let next = self
            .max_step
            .checked_mul(unit)
            .and_then(|factor| current.checked_mul(factor))
            .and_then(|delta| current.checked_add(delta))
            .unwrap_or(bound);
        next.max(Decimal::ZERO).round_dp(2)
    }
}

#[async_trait]
impl PriceSource for RandomWalk {
    async fn next_price(&mut self, symbol: &str) -> Result<Option<Decimal>> {
        let next = match self.prices.get(symbol).copied() {
            Some(current) => self.step(current),
            None => self.start_price.value(),
        };
        self.prices.insert(symbol.to_string(), next);
        Ok(Some(next))
    }
}

/// Drives a [`PriceSubject`] from a [`PriceSource`].
pub struct Monitor<S> {
    subject: Arc<PriceSubject>,
    source: Arc<Mutex<S>>,
    symbols: Arc<Vec<String>>,
    task: Option<JoinHandle<()>>,
}

impl<S: PriceSource + 'static> Monitor<S> {
    pub fn new(subject: Arc<PriceSubject>, source: S, symbols: Vec<String>) -> Self {
        Self {
            subject,
            source: Arc::new(Mutex::new(source)),
            symbols: Arc::new(symbols),
            task: None,
        }
    }

    pub fn subject(&self) -> &Arc<PriceSubject> {
        &self.subject
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Polls every symbol `rounds` times back to back and returns the
    /// alerts raised along the way.
    ///
    /// # Errors
    ///
    /// Returns the first source, validation or reentrancy error of a round
    /// once that round has polled every symbol; later rounds are skipped.
    pub async fn run_for(&self, rounds: usize) -> Result<Vec<PriceAlert>> {
        let mut alerts = Vec::new();
        for _ in 0..rounds {
            alerts.extend(poll_round(&self.subject, &self.source, &self.symbols).await?);
        }
        Ok(alerts)
    }

    /// Spawns a background task polling every `interval`. Calling `start`
    /// on a running monitor does nothing.
    pub fn start(&mut self, interval: Duration) {
        if self.is_running() {
            warn!("Price monitor is already running");
            return;
        }

        let subject = Arc::clone(&self.subject);
        let source = Arc::clone(&self.source);
        let symbols = Arc::clone(&self.symbols);
        // tokio::time::interval panics on a zero period.
        let period = interval.max(Duration::from_millis(1));

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                // Per-symbol failures are already logged by poll_round.
                if let Err(err) = poll_round(&subject, &source, &symbols).await {
                    debug!(error = %err, "Price monitoring round had failures");
                }
            }
        }));
        info!(symbols = %self.symbols.join(","), ?period, "Price monitor started");
    }

    /// Cancels the background task and waits for it to finish.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        task.abort();
        match task.await {
            Err(err) if !err.is_cancelled() => {
                warn!(error = %err, "Price monitor task ended abnormally");
            }
            _ => {}
        }
        info!("Price monitor stopped");
    }
}

impl<S> Drop for Monitor<S> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll_round<S: PriceSource>(
    subject: &PriceSubject,
    source: &Mutex<S>,
    symbols: &[String],
) -> Result<Vec<PriceAlert>> {
    let mut alerts = Vec::new();
    let mut first_error = None;
    let mut source = source.lock().await;
    for symbol in symbols {
        let result = match source.next_price(symbol).await {
            Ok(Some(price)) => subject.set_price(symbol, price).await,
            Ok(None) => {
                debug!(symbol = symbol.as_str(), "No price available");
                continue;
            }
            Err(err) => Err(err),
        };
        match result {
            Ok(Some(alert)) => alerts.push(alert),
            Ok(None) => {}
            Err(err) => {
                warn!(symbol = symbol.as_str(), error = %err, "Price update failed");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(alerts),
    }
}
