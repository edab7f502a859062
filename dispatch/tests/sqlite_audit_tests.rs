use chrono::{Duration as ChronoDuration, Utc};
use sqlx::sqlite::SqlitePoolOptions;

use alerts::types::{Alert, AlertKind, AlertSource};
use dispatch::audit::{AuditStore, SQLiteAuditStore};
use dispatch::types::AlertRecord;
use market::types::{InstrumentId, SubscriberId};

/// In-memory SQLite kept on a single connection, so the schema created at
/// startup is the schema every query sees.
async fn memory_store() -> anyhow::Result<SQLiteAuditStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    SQLiteAuditStore::from_pool(pool).await
}

///
/// Test suite for SQLiteAuditStore
///
/// This suite verifies:
///   · schema creation on startup
///   · append + recent round-trip, including enum columns
///   · recent() ordering, limit, and per-subscriber filtering
///   · retention pruning by created_at
///
fn record_for(subscriber: &str, kind: AlertKind, percent: f64) -> AlertRecord {
    let source = match kind {
        AlertKind::Dip => AlertSource::Trailing,
        AlertKind::Spike => AlertSource::Rolling,
    };

    AlertRecord::new(
        Alert {
            kind,
            instrument: InstrumentId::new("NIFTYBEES"),
            percent,
            price: 250.0,
            ts_ms: 1_700_000_000_000,
            source,
        },
        SubscriberId::new(subscriber),
    )
}

#[tokio::test]
async fn append_and_recent_round_trip() -> anyhow::Result<()> {
    let store = memory_store().await?;

    let record = record_for("u1", AlertKind::Dip, 3.0);
    store.append(&record).await?;

    let loaded = store.recent(&SubscriberId::new("u1"), 10).await?;
    assert_eq!(loaded.len(), 1);

    let r = &loaded[0];
    assert_eq!(r.id, record.id);
    assert_eq!(r.kind, AlertKind::Dip);
    assert_eq!(r.source, AlertSource::Trailing);
    assert!((r.percent - 3.0).abs() < 1e-9);
    assert_eq!(r.ts_ms, 1_700_000_000_000);
    assert_eq!(r.message, record.message);

    Ok(())
}

#[tokio::test]
async fn recent_is_newest_first_and_respects_the_limit() -> anyhow::Result<()> {
    let store = memory_store().await?;

    let mut first = record_for("u1", AlertKind::Dip, 1.0);
    let mut second = record_for("u1", AlertKind::Spike, 2.0);
    let mut third = record_for("u1", AlertKind::Dip, 3.0);

    // pin creation times so ordering is unambiguous
    first.created_at = Utc::now() - ChronoDuration::minutes(3);
    second.created_at = Utc::now() - ChronoDuration::minutes(2);
    third.created_at = Utc::now() - ChronoDuration::minutes(1);

    store.append(&first).await?;
    store.append(&second).await?;
    store.append(&third).await?;

    let loaded = store.recent(&SubscriberId::new("u1"), 2).await?;
    assert_eq!(loaded.len(), 2);
    assert!((loaded[0].percent - 3.0).abs() < 1e-9);
    assert!((loaded[1].percent - 2.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn recent_filters_by_subscriber() -> anyhow::Result<()> {
    let store = memory_store().await?;

    store.append(&record_for("u1", AlertKind::Dip, 1.0)).await?;
    store
        .append(&record_for("u2", AlertKind::Spike, 2.0))
        .await?;

    let loaded = store.recent(&SubscriberId::new("u2"), 10).await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].subscriber, SubscriberId::new("u2"));

    Ok(())
}

#[tokio::test]
async fn prune_deletes_only_records_older_than_the_cutoff() -> anyhow::Result<()> {
    let store = memory_store().await?;

    let mut old = record_for("u1", AlertKind::Dip, 1.0);
    old.created_at = Utc::now() - ChronoDuration::days(40);

    let fresh = record_for("u1", AlertKind::Spike, 2.0);

    store.append(&old).await?;
    store.append(&fresh).await?;

    let pruned = store
        .prune_older_than(Utc::now() - ChronoDuration::days(30))
        .await?;

    assert_eq!(pruned, 1);

    let remaining = store.recent(&SubscriberId::new("u1"), 10).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].kind, AlertKind::Spike);

    Ok(())
}
