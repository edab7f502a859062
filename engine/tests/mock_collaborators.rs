use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use alerts::rule::AlertRule;
use dispatch::audit::AuditStore;
use dispatch::types::{AlertRecord, DispatchError, Notifier};
use market::types::SubscriberId;
use watch::model::Watch;
use watch::store::WatchStore;

#[derive(Default)]
pub struct InMemoryWatchStore {
    pub watches: Arc<Mutex<HashSet<Watch>>>,
    pub rules: Arc<Mutex<HashMap<SubscriberId, AlertRule>>>,
}

#[async_trait]
impl WatchStore for InMemoryWatchStore {
    async fn load_watches(&self) -> anyhow::Result<Vec<Watch>> {
        Ok(self.watches.lock().await.iter().cloned().collect())
    }

    async fn load_rules(&self) -> anyhow::Result<Vec<(SubscriberId, AlertRule)>> {
        Ok(self
            .rules
            .lock()
            .await
            .iter()
            .map(|(s, r)| (s.clone(), *r))
            .collect())
    }

    async fn save_watch(&self, watch: &Watch) -> anyhow::Result<()> {
        self.watches.lock().await.insert(watch.clone());
        Ok(())
    }

    async fn delete_watch(&self, watch: &Watch) -> anyhow::Result<()> {
        self.watches.lock().await.remove(watch);
        Ok(())
    }

    async fn save_rule(&self, subscriber: &SubscriberId, rule: &AlertRule) -> anyhow::Result<()> {
        self.rules.lock().await.insert(subscriber.clone(), *rule);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAuditStore {
    pub rows: Arc<Mutex<Vec<AlertRecord>>>,
    pub fail_appends: AtomicBool,
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, record: &AlertRecord) -> anyhow::Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            anyhow::bail!("audit backend unavailable");
        }
        self.rows.lock().await.push(record.clone());
        Ok(())
    }

    async fn recent(
        &self,
        subscriber: &SubscriberId,
        limit: u32,
    ) -> anyhow::Result<Vec<AlertRecord>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .rev()
            .filter(|r| &r.subscriber == subscriber)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|r| r.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notified: Arc<Mutex<Vec<AlertRecord>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, record: &AlertRecord) -> Result<(), DispatchError> {
        self.notified.lock().await.push(record.clone());
        Ok(())
    }
}
