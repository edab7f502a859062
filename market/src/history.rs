//! HistoryStore
//!
//! Bounded per-instrument price history.
//! Responsibilities:
//!   • Append one PricePoint per accepted tick, in arrival order
//!   • Enforce the retention cap by discarding the oldest points (FIFO —
//!     recency of insertion governs retention, not recency of access)
//!   • Hand out owned snapshots so evaluation never observes a write
//!     in progress
//!
//! The store owns the sequences exclusively; nothing outside this module
//! mutates them.

use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;

use crate::types::{InstrumentId, PricePoint, TickError};

/// Retention cap per instrument.
pub const DEFAULT_HISTORY_CAP: usize = 1000;

pub struct HistoryStore {
    series: Mutex<HashMap<InstrumentId, VecDeque<PricePoint>>>,
    cap: usize,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            series: Mutex::new(HashMap::new()),
            cap,
        }
    }

    /// Append a point and trim to the cap.
    ///
    /// Rejects malformed input (blank instrument, non-positive price) with a
    /// validation error and performs no mutation — callers must not retry
    /// without correcting the input. Never fails on valid input.
    pub async fn record(
        &self,
        instrument: &InstrumentId,
        price: f64,
        ts_ms: u64,
    ) -> Result<(), TickError> {
        if instrument.is_blank() {
            return Err(TickError::MissingInstrument);
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(TickError::InvalidPrice { price });
        }

        let mut series = self.series.lock().await;
        let points = series.entry(instrument.clone()).or_default();

        points.push_back(PricePoint { price, ts_ms });

        while points.len() > self.cap {
            points.pop_front();
        }

        Ok(())
    }

    /// Owned snapshot of the full retained history, oldest first.
    /// An unknown instrument reads as empty, never as an error.
    pub async fn read(&self, instrument: &InstrumentId) -> Vec<PricePoint> {
        let series = self.series.lock().await;

        series
            .get(instrument)
            .map(|points| points.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The newest `limit` points, newest first. Display-layer query surface.
    pub async fn read_last(&self, instrument: &InstrumentId, limit: usize) -> Vec<PricePoint> {
        let series = self.series.lock().await;

        series
            .get(instrument)
            .map(|points| points.iter().rev().take(limit).copied().collect())
            .unwrap_or_default()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
