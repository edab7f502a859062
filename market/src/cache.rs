//! PriceCache
//!
//! Latest-observation cache for consumers outside the pipeline (the display
//! layer polls it instead of subscribing to the feed). One entry per
//! instrument, last writer wins — there is no reconciliation of out-of-order
//! ticks. Entries older than the TTL read as absent, which is how the
//! display layer distinguishes a live instrument from an offline one.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::types::InstrumentId;

/// Entries older than this read as "no data".
pub const DEFAULT_PRICE_TTL_MS: u64 = 30 * 60 * 1000;

/// Latest observation for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestPrice {
    pub price: f64,
    pub ts_ms: u64,
    pub change_percent: Option<f64>,
}

pub struct PriceCache {
    entries: Mutex<HashMap<InstrumentId, LatestPrice>>,
    ttl_ms: u64,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_PRICE_TTL_MS)
    }

    pub fn with_ttl(ttl_ms: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_ms,
        }
    }

    /// Unconditional overwrite; the previous entry is discarded whatever its
    /// timestamp was.
    pub async fn set(
        &self,
        instrument: &InstrumentId,
        price: f64,
        ts_ms: u64,
        change_percent: Option<f64>,
    ) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            instrument.clone(),
            LatestPrice {
                price,
                ts_ms,
                change_percent,
            },
        );
    }

    /// Read-only; never refreshes the TTL. An entry whose observation is at
    /// least `ttl_ms` old reads as `None`.
    pub async fn get(&self, instrument: &InstrumentId, now_ms: u64) -> Option<LatestPrice> {
        let entries = self.entries.lock().await;

        entries
            .get(instrument)
            .filter(|e| now_ms.saturating_sub(e.ts_ms) < self.ttl_ms)
            .cloned()
    }

    /// Bulk read, positionally aligned with the requested instruments.
    pub async fn get_many(
        &self,
        instruments: &[InstrumentId],
        now_ms: u64,
    ) -> Vec<Option<LatestPrice>> {
        let entries = self.entries.lock().await;

        instruments
            .iter()
            .map(|id| {
                entries
                    .get(id)
                    .filter(|e| now_ms.saturating_sub(e.ts_ms) < self.ttl_ms)
                    .cloned()
            })
            .collect()
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument() -> InstrumentId {
        InstrumentId::new("TCS")
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let cache = PriceCache::new();
        let id = instrument();

        cache.set(&id, 100.0, 2_000, Some(0.5)).await;
        // out-of-order write still overwrites
        cache.set(&id, 99.0, 1_000, None).await;

        let latest = cache.get(&id, 5_000).await.unwrap();
        assert_eq!(latest.price, 99.0);
        assert_eq!(latest.ts_ms, 1_000);
        assert_eq!(latest.change_percent, None);
    }

    #[tokio::test]
    async fn stale_entry_reads_as_absent() {
        let cache = PriceCache::with_ttl(1_000);
        let id = instrument();

        cache.set(&id, 42.0, 10_000, None).await;

        assert!(cache.get(&id, 10_999).await.is_some());
        assert!(cache.get(&id, 11_000).await.is_none());
    }

    #[tokio::test]
    async fn reads_do_not_refresh_ttl() {
        let cache = PriceCache::with_ttl(1_000);
        let id = instrument();

        cache.set(&id, 42.0, 0, None).await;

        // a read near expiry must not extend the entry's life
        assert!(cache.get(&id, 999).await.is_some());
        assert!(cache.get(&id, 1_500).await.is_none());
    }

    #[tokio::test]
    async fn get_many_aligns_with_request_order() {
        let cache = PriceCache::new();
        let a = InstrumentId::new("A");
        let b = InstrumentId::new("B");
        let c = InstrumentId::new("C");

        cache.set(&a, 1.0, 100, None).await;
        cache.set(&c, 3.0, 100, None).await;

        let out = cache.get_many(&[a, b, c], 200).await;
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_ref().unwrap().price, 1.0);
        assert!(out[1].is_none());
        assert_eq!(out[2].as_ref().unwrap().price, 3.0);
    }
}
