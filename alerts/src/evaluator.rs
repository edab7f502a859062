//! Alert evaluation algorithms.
//!
//! Two independent detectors, both pure: same (price, history, threshold)
//! always yields the same decision, and neither touches the history it is
//! given. Any I/O (stores, dispatch, logging) lives outside this module.
//!
//! ## Trailing (DIP)
//! Compares the current price against the **maximum price in the whole
//! retained history** — a trailing-stop approximation. Firing off the
//! retained peak rather than the previous tick makes it robust to noisy
//! single-tick reversals.
//!
//! ```text
//! drop = (max_price - price) / max_price * 100
//! ```
//!
//! ## Rolling (SPIKE)
//! Compares the current price against the **minimum price inside a trailing
//! time window**, so stale historical extremes cannot suppress or delay
//! detection of intraday volatility.
//!
//! ```text
//! gain = (price - window_min) / window_min * 100
//! ```
//!
//! ## Edge cases
//! - Empty history (or an empty filtered window) yields no alert, never an
//!   error — a threshold of 0 does not change that.
//! - A non-positive max/min makes the percent undefined; evaluation is
//!   suppressed rather than dividing by zero.
//! - A threshold of 0 fires on every non-negative move.

use market::types::{InstrumentId, PricePoint};

use crate::types::{Alert, AlertKind, AlertSource};

const MS_PER_MINUTE: u64 = 60_000;

/// Trailing-stop DIP detection against the full retained history.
pub fn evaluate_trailing(
    instrument: &InstrumentId,
    price: f64,
    ts_ms: u64,
    history: &[PricePoint],
    threshold_percent: f64,
) -> Option<Alert> {
    if history.is_empty() {
        return None;
    }

    let max_price = history
        .iter()
        .map(|p| p.price)
        .fold(f64::NEG_INFINITY, f64::max);

    if max_price <= 0.0 {
        // percent undefined
        return None;
    }

    let drop = (max_price - price) / max_price * 100.0;

    if drop >= threshold_percent {
        Some(Alert {
            kind: AlertKind::Dip,
            instrument: instrument.clone(),
            percent: drop,
            price,
            ts_ms,
            source: AlertSource::Trailing,
        })
    } else {
        None
    }
}

/// Rolling-window SPIKE detection against the window minimum.
///
/// The window is `[now_ms - window_minutes, now_ms]`; a point exactly at the
/// cutoff is inside it.
pub fn evaluate_rolling(
    instrument: &InstrumentId,
    price: f64,
    now_ms: u64,
    history: &[PricePoint],
    window_minutes: u64,
    threshold_percent: f64,
) -> Option<Alert> {
    if history.is_empty() {
        return None;
    }

    let cutoff = now_ms.saturating_sub(window_minutes * MS_PER_MINUTE);

    let window_min = history
        .iter()
        .filter(|p| p.ts_ms >= cutoff)
        .map(|p| p.price)
        .fold(f64::INFINITY, f64::min);

    if !window_min.is_finite() {
        // nothing inside the window
        return None;
    }

    if window_min <= 0.0 {
        return None;
    }

    let gain = (price - window_min) / window_min * 100.0;

    if gain >= threshold_percent {
        Some(Alert {
            kind: AlertKind::Spike,
            instrument: instrument.clone(),
            percent: gain,
            price,
            ts_ms: now_ms,
            source: AlertSource::Rolling,
        })
    } else {
        None
    }
}
