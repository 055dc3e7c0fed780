//! Observer capability and the ordered registry that fans updates out.
//!
//! Delivery is sequential: every observer's [`Observer::update`] future is
//! awaited to completion, in registration order, before the next one
//! starts. A failing or panicking observer is logged and skipped; it never
//! affects its siblings or the caller of
//! [`PriceSubject::set_price`](crate::subject::PriceSubject::set_price).

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::warn;

use crate::models::{PriceAlert, PriceTick};
use crate::subject::PriceSubject;

/// Anything that wants to hear about accepted prices.
///
/// `update` is always called with a tick; `alert` is present only when the
/// move from the previous price reached the subject's threshold.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Identity used when reporting a failed update.
    fn name(&self) -> &str {
        "observer"
    }

    /// Handles one update from `subject`.
    ///
    /// # Errors
    ///
    /// Any error is logged by the fan-out and otherwise ignored.
    async fn update(
        &self,
        subject: &PriceSubject,
        tick: &PriceTick,
        alert: Option<&PriceAlert>,
    ) -> anyhow::Result<()>;
}

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Insertion-ordered set of observers, deduplicated by `Arc` identity.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `observer` unless the same instance is already registered.
    ///
    /// Returns `true` if the registry changed.
    pub fn register(&self, observer: Arc<dyn Observer>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        if observers.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Removes `observer` if present. Returns `true` if the registry changed.
    pub fn unregister(&self, observer: &Arc<dyn Observer>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|o| !same_observer(o, observer));
        observers.len() != before
    }

    pub fn contains(&self, observer: &Arc<dyn Observer>) -> bool {
        self.read().iter().any(|o| same_observer(o, observer))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the registered observers in notification order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Observer>> {
        self.read().clone()
    }

    /// Delivers one update to every observer registered when the call
    /// starts, in registration order.
    pub async fn notify(
        &self,
        subject: &PriceSubject,
        tick: &PriceTick,
        alert: Option<&PriceAlert>,
    ) -> FanOutReport {
        let mut report = FanOutReport::default();

        // Iterate over a copy so observers may (un)register without
        // deadlocking; such changes apply from the next fan-out.
        for observer in self.snapshot() {
            let outcome = AssertUnwindSafe(observer.update(subject, tick, alert))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(
                        observer = observer.name(),
                        symbol = tick.symbol(),
                        price = %tick.price(),
                        alert = alert.is_some(),
                        error = %err,
                        "Observer update failed"
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    warn!(
                        observer = observer.name(),
                        symbol = tick.symbol(),
                        price = %tick.price(),
                        alert = alert.is_some(),
                        panic = panic_message(panic.as_ref()),
                        "Observer panicked during update"
                    );
                }
            }
        }

        report
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn Observer>>> {
        self.observers.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compares the data pointers only; vtable pointers for the same type are
/// not guaranteed to be unique.
fn same_observer(a: &Arc<dyn Observer>, b: &Arc<dyn Observer>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
