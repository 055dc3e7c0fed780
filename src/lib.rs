//! Price subject with observer fan-out and threshold alerts.
//!
//! A [`PriceSubject`](subject::PriceSubject) keeps the latest price for each
//! symbol. Every accepted price becomes a [`PriceTick`](models::PriceTick)
//! delivered to the registered [`Observer`](observer::Observer)s in
//! registration order, together with a [`PriceAlert`](models::PriceAlert)
//! when the move from the previous price reaches the configured threshold.

pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod observer;
pub mod observers;
pub mod subject;

pub use error::{PricewatchError, Result, ValidationError};
pub use models::{AlertType, Price, PriceAlert, PriceTick, Threshold};
pub use observer::{FanOutReport, Observer, ObserverRegistry};
pub use subject::PriceSubject;
