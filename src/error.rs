//! Crate-level error types.
//!
//! [`PricewatchError`] unifies every error a caller of the public API can
//! see (invalid input, reentrant updates, configuration, price sources)
//! behind a single enum so callers can match on the variant they care
//! about while still using the `?` operator for easy propagation.
//!
//! Observer failures are deliberately absent: they are logged by the
//! fan-out and never reach the caller of
//! [`PriceSubject::set_price`](crate::subject::PriceSubject::set_price).

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PricewatchError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum PricewatchError {
    /// A price or threshold was rejected before any state changed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// `set_price` was called for a symbol whose fan-out is still running.
    #[error("reentrant price update for {symbol} during notification")]
    Reentrant { symbol: String },

    /// An environment variable held a value that could not be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// A price source failed to produce a sample.
    #[error("price source error: {0}")]
    Source(String),
}

/// Lets already-validated [`Price`](crate::models::Price) values go through
/// the same generic `TryInto` path as raw numbers.
impl From<std::convert::Infallible> for PricewatchError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Reasons a numeric input is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("price must not be negative, got {0}")]
    Negative(String),

    #[error("price is not a number")]
    NotANumber,

    #[error("price must be finite, got {0}")]
    Infinite(f64),

    /// The value is finite but outside the range a decimal can hold.
    #[error("price {0} cannot be represented as a decimal")]
    Unrepresentable(f64),

    #[error("alert threshold must not be negative, got {0}")]
    NegativeThreshold(String),
}
