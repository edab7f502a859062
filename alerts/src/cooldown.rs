//! CooldownLedger
//!
//! Time-boxed suppression of repeat alerts, keyed by
//! (subscriber, instrument, kind). While an entry is live no new alert of
//! that exact key may be dispatched, whatever its magnitude; the two kinds
//! never suppress each other.
//!
//! `try_acquire` is the check-then-arm critical section: suppression check
//! and arming happen under one lock acquisition, so two near-simultaneous
//! ticks for the same key cannot both pass the check. The lock is only ever
//! held across map operations — dispatch I/O happens elsewhere.

use std::collections::HashMap;

use tokio::sync::Mutex;

use market::types::{InstrumentId, SubscriberId};

use crate::types::AlertKind;

pub const DEFAULT_COOLDOWN_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub subscriber: SubscriberId,
    pub instrument: InstrumentId,
    pub kind: AlertKind,
}

/// Expiry timestamps per key. An entry armed at `T` for duration `d`
/// suppresses throughout `[T, T + d)` and is free again exactly at `T + d`.
#[derive(Default)]
pub struct CooldownLedger {
    entries: Mutex<HashMap<CooldownKey, u64>>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_suppressed(&self, key: &CooldownKey, now_ms: u64) -> bool {
        let entries = self.entries.lock().await;
        matches!(entries.get(key), Some(&expiry) if now_ms < expiry)
    }

    /// Install or refresh an entry unconditionally.
    pub async fn arm(&self, key: CooldownKey, now_ms: u64, duration_ms: u64) {
        let mut entries = self.entries.lock().await;
        entries.insert(key, now_ms + duration_ms);
    }

    /// Atomic check-then-arm: returns false if the key is live, otherwise
    /// arms it and returns true. This is the only correct gate on the
    /// dispatch path — calling `is_suppressed` and then `arm` separately
    /// reopens the double-dispatch window.
    pub async fn try_acquire(&self, key: CooldownKey, now_ms: u64, duration_ms: u64) -> bool {
        let mut entries = self.entries.lock().await;

        match entries.get(&key) {
            Some(&expiry) if now_ms < expiry => false,
            _ => {
                entries.insert(key, now_ms + duration_ms);
                true
            }
        }
    }

    /// Release an entry. Used when audit persistence fails after an acquire,
    /// so the failed dispatch counts as "did not happen".
    pub async fn disarm(&self, key: &CooldownKey) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
    }

    /// Drop entries whose expiry has passed. Expired entries are already
    /// inert; this only bounds memory on long-running processes.
    pub async fn purge_expired(&self, now_ms: u64) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, &mut expiry| now_ms < expiry);
        before - entries.len()
    }
}
