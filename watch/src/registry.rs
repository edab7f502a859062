//! WatchRegistry
//!
//! Maps instruments to the subscribers watching them and subscribers to
//! their alert configuration. Read-heavy from the pipeline's perspective
//! (`watchers_of`, `settings_of` on every tick); mutation comes from the
//! out-of-core subscription surface and writes through to the store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use alerts::rule::AlertRule;
use market::types::{InstrumentId, SubscriberId};

use crate::model::Watch;
use crate::store::WatchStore;

pub struct WatchRegistry<S: WatchStore> {
    by_instrument: Mutex<HashMap<InstrumentId, Vec<SubscriberId>>>,
    rules: Mutex<HashMap<SubscriberId, AlertRule>>,
    store: Arc<S>,
}

impl<S: WatchStore> WatchRegistry<S> {
    /// Initialize a fresh registry from the store.
    pub async fn new(store: Arc<S>) -> anyhow::Result<Self> {
        let registry = Self {
            by_instrument: Mutex::new(HashMap::new()),
            rules: Mutex::new(HashMap::new()),
            store,
        };

        registry.restore_from_store().await?;
        Ok(registry)
    }

    /// Load persisted subscriptions and rules and rebuild the indexes.
    async fn restore_from_store(&self) -> anyhow::Result<()> {
        let watches = self.store.load_watches().await?;
        let rules = self.store.load_rules().await?;

        let mut by_instrument = self.by_instrument.lock().await;
        let mut rule_map = self.rules.lock().await;

        for w in watches {
            by_instrument
                .entry(w.instrument)
                .or_default()
                .push(w.subscriber);
        }

        for (subscriber, rule) in rules {
            rule_map.insert(subscriber, rule);
        }

        Ok(())
    }

    /// Subscribers currently watching an instrument. Unwatched instruments
    /// read as empty.
    pub async fn watchers_of(&self, instrument: &InstrumentId) -> Vec<SubscriberId> {
        let by_instrument = self.by_instrument.lock().await;
        by_instrument.get(instrument).cloned().unwrap_or_default()
    }

    /// A subscriber's alert configuration, falling back to the documented
    /// default when none is stored. A missing rule must never fail a tick's
    /// evaluation.
    pub async fn settings_of(&self, subscriber: &SubscriberId) -> AlertRule {
        let rules = self.rules.lock().await;
        rules.get(subscriber).copied().unwrap_or_default()
    }

    /// Add a subscription: persist first, then index. Idempotent.
    pub async fn watch(
        &self,
        subscriber: SubscriberId,
        instrument: InstrumentId,
    ) -> anyhow::Result<()> {
        let w = Watch::new(subscriber.clone(), instrument.clone());
        self.store.save_watch(&w).await?;

        let mut by_instrument = self.by_instrument.lock().await;
        let watchers = by_instrument.entry(instrument).or_default();
        if !watchers.contains(&subscriber) {
            watchers.push(subscriber);
        }

        Ok(())
    }

    /// Remove a subscription: persist first, then drop from the index.
    pub async fn unwatch(
        &self,
        subscriber: &SubscriberId,
        instrument: &InstrumentId,
    ) -> anyhow::Result<()> {
        let w = Watch::new(subscriber.clone(), instrument.clone());
        self.store.delete_watch(&w).await?;

        let mut by_instrument = self.by_instrument.lock().await;
        if let Some(watchers) = by_instrument.get_mut(instrument) {
            watchers.retain(|s| s != subscriber);
            if watchers.is_empty() {
                by_instrument.remove(instrument);
            }
        }

        Ok(())
    }

    /// Store or replace a subscriber's rule.
    pub async fn set_rule(&self, subscriber: SubscriberId, rule: AlertRule) -> anyhow::Result<()> {
        self.store.save_rule(&subscriber, &rule).await?;

        let mut rules = self.rules.lock().await;
        rules.insert(subscriber, rule);

        Ok(())
    }
}
