//! Value objects passed from a [`PriceSubject`](crate::subject::PriceSubject)
//! to its observers.
//!
//! Everything here is immutable once built: a [`PriceTick`] for every
//! accepted price and, when the move is large enough, a [`PriceAlert`]
//! derived from the same tick.

pub mod alert;
pub mod price;
pub mod tick;

pub use alert::{AlertType, PriceAlert, Threshold};
pub use price::Price;
pub use tick::PriceTick;
