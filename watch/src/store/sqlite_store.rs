//! SQLiteWatchStore
//! --------------------
//! SQLite-backed implementation of the `WatchStore` trait used by the
//! watch::registry subsystem. It is responsible for durable persistence of
//! subscriptions and per-subscriber alert rules so that:
//!
//!  - watch lists survive restarts
//!  - rule changes made by the settings surface are not lost
//!  - the pipeline itself operates purely in-memory, via WatchRegistry

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use alerts::rule::AlertRule;
use market::types::{InstrumentId, SubscriberId};

use super::WatchStore;
use crate::model::Watch;

pub struct SQLiteWatchStore {
    pool: SqlitePool,
}

impl SQLiteWatchStore {
    /// Wrap an existing pool and ensure schema exists.
    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        Self::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Create a new SQLite-backed store and ensure schema exists.
    pub async fn new(path: &str) -> anyhow::Result<Self> {
        let pool = SqlitePool::connect(path).await?;
        Self::from_pool(pool).await
    }

    async fn ensure_schema(pool: &SqlitePool) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS watches (
                subscriber_id TEXT NOT NULL,
                instrument TEXT NOT NULL,
                PRIMARY KEY (subscriber_id, instrument)
            );
        "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscriber_rules (
                subscriber_id TEXT PRIMARY KEY,
                rule_json TEXT NOT NULL
            );
        "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WatchStore for SQLiteWatchStore {
    /// Load all subscriptions. Called once at startup by WatchRegistry to
    /// rebuild the instrument index.
    async fn load_watches(&self) -> anyhow::Result<Vec<Watch>> {
        let rows = sqlx::query("SELECT subscriber_id, instrument FROM watches")
            .fetch_all(&self.pool)
            .await?;

        let mut watches = Vec::with_capacity(rows.len());

        for row in rows {
            let subscriber_id: String = row.get("subscriber_id");
            let instrument: String = row.get("instrument");

            watches.push(Watch {
                subscriber: SubscriberId::new(subscriber_id),
                instrument: InstrumentId::new(instrument),
            });
        }

        Ok(watches)
    }

    /// Load all stored per-subscriber rules. Subscribers absent here fall
    /// back to the default rule at read time.
    async fn load_rules(&self) -> anyhow::Result<Vec<(SubscriberId, AlertRule)>> {
        let rows = sqlx::query("SELECT subscriber_id, rule_json FROM subscriber_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = Vec::with_capacity(rows.len());

        for row in rows {
            let subscriber_id: String = row.get("subscriber_id");

            let rule_json: String = row.get("rule_json");
            let rule: AlertRule = serde_json::from_str(&rule_json)
                .map_err(|e| anyhow::anyhow!("Invalid rule JSON '{}': {}", rule_json, e))?;

            rules.push((SubscriberId::new(subscriber_id), rule));
        }

        Ok(rules)
    }

    /// Store a subscription. Re-adding an existing watch is a no-op.
    async fn save_watch(&self, watch: &Watch) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO watches (subscriber_id, instrument)
            VALUES (?, ?)
            ON CONFLICT(subscriber_id, instrument) DO NOTHING;
        "#,
        )
        .bind(watch.subscriber.as_str())
        .bind(watch.instrument.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_watch(&self, watch: &Watch) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM watches WHERE subscriber_id = ? AND instrument = ?")
            .bind(watch.subscriber.as_str())
            .bind(watch.instrument.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store or update a subscriber's rule (upsert semantics).
    async fn save_rule(&self, subscriber: &SubscriberId, rule: &AlertRule) -> anyhow::Result<()> {
        let rule_json = serde_json::to_string(rule)?;

        sqlx::query(
            r#"
            INSERT INTO subscriber_rules (subscriber_id, rule_json)
            VALUES (?, ?)
            ON CONFLICT(subscriber_id) DO UPDATE SET
                rule_json = excluded.rule_json;
        "#,
        )
        .bind(subscriber.as_str())
        .bind(rule_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
