//! Audit persistence for dispatched alerts.
//!
//! Every alert that leaves the pipeline gets a row here *before* the
//! notifier is invoked, so a crash between the two never loses the audit
//! trail. The store also serves the activity query surface and the
//! retention pruner; long-term alert storage beyond that is out of scope.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use alerts::types::{AlertKind, AlertSource};
use market::types::{InstrumentId, SubscriberId};

use crate::types::AlertRecord;

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one record. Must be durable before it returns Ok.
    async fn append(&self, record: &AlertRecord) -> anyhow::Result<()>;

    /// Newest records for a subscriber, newest first.
    async fn recent(&self, subscriber: &SubscriberId, limit: u32)
    -> anyhow::Result<Vec<AlertRecord>>;

    /// Delete records created before the cutoff. Returns how many went.
    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64>;
}

/// SQLite-backed implementation of `AuditStore`.
pub struct SQLiteAuditStore {
    pool: SqlitePool,
}

impl SQLiteAuditStore {
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
            CREATE TABLE IF NOT EXISTS alert_audit (
                id TEXT PRIMARY KEY,
                subscriber_id TEXT NOT NULL,
                instrument TEXT NOT NULL,
                kind TEXT NOT NULL,
                percent REAL NOT NULL,
                price REAL NOT NULL,
                ts_ms INTEGER NOT NULL,
                source TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            );
        "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<AlertRecord> {
        let id_str: String = row.get("id");
        let id = Uuid::parse_str(&id_str)?;

        let kind_str: String = row.get("kind");
        let kind = AlertKind::from_str(&kind_str)?;

        let source_str: String = row.get("source");
        let source = AlertSource::from_str(&source_str)?;

        let created_at_ms: i64 = row.get("created_at_ms");
        let created_at = Utc
            .timestamp_millis_opt(created_at_ms)
            .single()
            .ok_or_else(|| anyhow::anyhow!("Invalid created_at_ms: {}", created_at_ms))?;

        Ok(AlertRecord {
            id,
            subscriber: SubscriberId::new(row.get::<String, _>("subscriber_id")),
            instrument: InstrumentId::new(row.get::<String, _>("instrument")),
            kind,
            percent: row.get("percent"),
            price: row.get("price"),
            ts_ms: row.get::<i64, _>("ts_ms") as u64,
            source,
            message: row.get("message"),
            created_at,
        })
    }
}

#[async_trait]
impl AuditStore for SQLiteAuditStore {
    async fn append(&self, record: &AlertRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO alert_audit (
                id, subscriber_id, instrument,
                kind, percent, price, ts_ms,
                source, message, created_at_ms
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
        "#,
        )
        .bind(record.id.to_string())
        .bind(record.subscriber.as_str())
        .bind(record.instrument.as_str())
        .bind(record.kind.to_string())
        .bind(record.percent)
        .bind(record.price)
        .bind(record.ts_ms as i64)
        .bind(record.source.to_string())
        .bind(&record.message)
        .bind(record.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(
        &self,
        subscriber: &SubscriberId,
        limit: u32,
    ) -> anyhow::Result<Vec<AlertRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM alert_audit
            WHERE subscriber_id = ?
            ORDER BY created_at_ms DESC
            LIMIT ?;
        "#,
        )
        .bind(subscriber.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(Self::row_to_record(row)?);
        }

        Ok(records)
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM alert_audit WHERE created_at_ms < ?")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
