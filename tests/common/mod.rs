//! Shared test observers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pricewatch::observer::Observer;
use pricewatch::subject::PriceSubject;
use pricewatch::{PriceAlert, PriceTick};

/// One update as seen by a [`RecordingObserver`].
#[derive(Debug, Clone)]
pub struct Delivery {
    pub observer: String,
    pub tick: PriceTick,
    pub alert: Option<PriceAlert>,
}

/// Log shared between observers so cross-observer ordering can be checked.
pub type DeliveryLog = Arc<Mutex<Vec<Delivery>>>;

pub fn new_log() -> DeliveryLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Appends every update it receives to a shared log.
pub struct RecordingObserver {
    name: String,
    log: DeliveryLog,
}

impl RecordingObserver {
    pub fn new(name: &str, log: &DeliveryLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: Arc::clone(log),
        })
    }
}

#[async_trait]
impl Observer for RecordingObserver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn update(
        &self,
        _subject: &PriceSubject,
        tick: &PriceTick,
        alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()> {
        // Yield so a sequential fan-out is actually exercised across awaits.
        tokio::task::yield_now().await;
        self.log.lock().unwrap().push(Delivery {
            observer: self.name.clone(),
            tick: tick.clone(),
            alert: alert.cloned(),
        });
        Ok(())
    }
}

/// Always returns an error.
pub struct FailingObserver;

#[async_trait]
impl Observer for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }

    async fn update(
        &self,
        _subject: &PriceSubject,
        tick: &PriceTick,
        _alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("cannot handle {}", tick.symbol())
    }
}

/// Always panics.
pub struct PanickingObserver;

#[async_trait]
impl Observer for PanickingObserver {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn update(
        &self,
        _subject: &PriceSubject,
        _tick: &PriceTick,
        _alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()> {
        panic!("observer blew up");
    }
}

/// Tries to push a new price for the same symbol from inside its callback
/// and records whether the nested call succeeded.
pub struct ReentrantObserver {
    pub nested_results: Mutex<Vec<Result<(), String>>>,
    pub other_symbol: Option<String>,
}

impl ReentrantObserver {
    pub fn same_symbol() -> Arc<Self> {
        Arc::new(Self {
            nested_results: Mutex::new(Vec::new()),
            other_symbol: None,
        })
    }

    pub fn other_symbol(symbol: &str) -> Arc<Self> {
        Arc::new(Self {
            nested_results: Mutex::new(Vec::new()),
            other_symbol: Some(symbol.to_string()),
        })
    }
}

#[async_trait]
impl Observer for ReentrantObserver {
    fn name(&self) -> &str {
        "reentrant"
    }

    async fn update(
        &self,
        subject: &PriceSubject,
        tick: &PriceTick,
        _alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()> {
        let symbol = self.other_symbol.as_deref().unwrap_or(tick.symbol());
        if self.other_symbol.is_some() && symbol == tick.symbol() {
            // The nested update for the other symbol itself.
            return Ok(());
        }
        let result = subject
            .set_price(symbol, tick.price())
            .await
            .map(|_| ())
            .map_err(|e| e.to_string());
        self.nested_results.lock().unwrap().push(result);
        Ok(())
    }
}

/// On its first update, swaps `leaving` out of the subject and `joining` in.
pub struct RosterChangingObserver {
    leaving: Arc<dyn Observer>,
    joining: Arc<dyn Observer>,
    done: AtomicBool,
}

impl RosterChangingObserver {
    pub fn new(leaving: Arc<dyn Observer>, joining: Arc<dyn Observer>) -> Arc<Self> {
        Arc::new(Self {
            leaving,
            joining,
            done: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Observer for RosterChangingObserver {
    fn name(&self) -> &str {
        "roster-changing"
    }

    async fn update(
        &self,
        subject: &PriceSubject,
        _tick: &PriceTick,
        _alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()> {
        if !self.done.swap(true, Ordering::SeqCst) {
            subject.unregister(&self.leaving);
            subject.register(Arc::clone(&self.joining));
        }
        Ok(())
    }
}
