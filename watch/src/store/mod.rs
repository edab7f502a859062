pub mod sqlite_store;

use alerts::rule::AlertRule;
use market::types::SubscriberId;

use crate::model::Watch;

/// Durable backing for the watch registry. The registry holds the in-memory
/// indexes; the store only has to survive restarts.
#[async_trait::async_trait]
pub trait WatchStore: Send + Sync {
    async fn load_watches(&self) -> anyhow::Result<Vec<Watch>>;
    async fn load_rules(&self) -> anyhow::Result<Vec<(SubscriberId, AlertRule)>>;
    async fn save_watch(&self, watch: &Watch) -> anyhow::Result<()>;
    async fn delete_watch(&self, watch: &Watch) -> anyhow::Result<()>;
    async fn save_rule(&self, subscriber: &SubscriberId, rule: &AlertRule) -> anyhow::Result<()>;
}
