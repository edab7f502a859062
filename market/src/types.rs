use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instrument identifier as supplied by the upstream feed — a symbol or a
/// venue-specific token, treated as opaque by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Subscriber identifier. Account management lives outside the core; the
/// pipeline only routes on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One price observation from the feed. Consumed exactly once per arrival.
#[derive(Debug, Clone, Deserialize)]
pub struct Tick {
    pub instrument: InstrumentId,
    pub price: f64,
    /// Wall-clock milliseconds, assigned by the feed.
    pub ts_ms: u64,
    /// Day-change percent, when the feed supplies it.
    #[serde(default)]
    pub change_percent: Option<f64>,
}

impl Tick {
    /// Ingestion-boundary validation. A tick that fails here must cause no
    /// state mutation anywhere in the pipeline.
    pub fn validate(&self) -> Result<(), TickError> {
        if self.instrument.is_blank() {
            return Err(TickError::MissingInstrument);
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(TickError::InvalidPrice { price: self.price });
        }
        Ok(())
    }
}

/// A trimmed projection of a tick kept in history. Never mutated; evicted by
/// the history cap only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub ts_ms: u64,
}

#[derive(Debug, Error, PartialEq)]
pub enum TickError {
    #[error("tick has no instrument")]
    MissingInstrument,

    #[error("tick price must be positive and finite, got {price}")]
    InvalidPrice { price: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(instrument: &str, price: f64) -> Tick {
        Tick {
            instrument: InstrumentId::new(instrument),
            price,
            ts_ms: 1_000,
            change_percent: None,
        }
    }

    #[test]
    fn valid_tick_passes() {
        assert_eq!(tick("RELIANCE", 2_500.0).validate(), Ok(()));
    }

    #[test]
    fn zero_and_negative_prices_are_rejected() {
        assert_eq!(
            tick("RELIANCE", 0.0).validate(),
            Err(TickError::InvalidPrice { price: 0.0 })
        );
        assert_eq!(
            tick("RELIANCE", -4.2).validate(),
            Err(TickError::InvalidPrice { price: -4.2 })
        );
    }

    #[test]
    fn non_finite_price_is_rejected() {
        assert!(matches!(
            tick("RELIANCE", f64::NAN).validate(),
            Err(TickError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn blank_instrument_is_rejected() {
        assert_eq!(tick("", 10.0).validate(), Err(TickError::MissingInstrument));
        assert_eq!(
            tick("   ", 10.0).validate(),
            Err(TickError::MissingInstrument)
        );
    }
}
