//! Common types and small abstraction traits used by the dispatch sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

use alerts::cooldown::CooldownKey;
use alerts::types::{Alert, AlertKind, AlertSource};
use market::types::{InstrumentId, SubscriberId};

/// An alert enriched with the subscriber it is addressed to — the unit of
/// work on the dispatch queue, and the audit row once persisted.
#[derive(Debug, Clone)]
pub struct AlertRecord {
    pub id: Uuid,
    pub subscriber: SubscriberId,
    pub instrument: InstrumentId,
    pub kind: AlertKind,
    /// Unsigned magnitude of the move, in percent.
    pub percent: f64,
    /// The price that triggered the alert.
    pub price: f64,
    /// Feed timestamp of the triggering tick.
    pub ts_ms: u64,
    /// Which algorithm fired.
    pub source: AlertSource,
    /// Rendered notification text, stored with the record.
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn new(alert: Alert, subscriber: SubscriberId) -> Self {
        let message = render_message(&alert);

        Self {
            id: Uuid::new_v4(),
            subscriber,
            instrument: alert.instrument,
            kind: alert.kind,
            percent: alert.percent,
            price: alert.price,
            ts_ms: alert.ts_ms,
            source: alert.source,
            message,
            created_at: Utc::now(),
        }
    }

    /// The cooldown key this record was dispatched under.
    pub fn cooldown_key(&self) -> CooldownKey {
        CooldownKey {
            subscriber: self.subscriber.clone(),
            instrument: self.instrument.clone(),
            kind: self.kind,
        }
    }
}

fn render_message(alert: &Alert) -> String {
    let action = match alert.kind {
        AlertKind::Dip => "price dropped",
        AlertKind::Spike => "price spiked",
    };

    format!(
        "🚨 {}: {} {:.2}% — last price {:.2}",
        alert.instrument, action, alert.percent, alert.price
    )
}

/// What happened when the sink processed one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Audited and handed to the notifier.
    Dispatched,
    /// Audited, but the notifier failed or timed out. Not retried here.
    NotifyFailed,
    /// Audit write failed; the record was dropped and its cooldown released.
    AuditFailed,
}

/// Errors surfaced by the notifier boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("notifier error: {0}")]
    Notifier(String),

    #[error("notifier timed out after {timeout_ms} ms")]
    NotifierTimeout { timeout_ms: u64 },
}

/// Convenience alias for the dispatch job queue type.
pub type DispatchSender = Sender<AlertRecord>;

/// Hand-off to the external notification channels. Which channels a
/// subscriber has enabled (and any retry policy) is the collaborator's
/// business, not the core's.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, record: &AlertRecord) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_carries_the_alert_fields_and_a_message() {
        let alert = Alert {
            kind: AlertKind::Dip,
            instrument: InstrumentId::new("RELIANCE"),
            percent: 3.0,
            price: 97.0,
            ts_ms: 42,
            source: AlertSource::Trailing,
        };

        let record = AlertRecord::new(alert, SubscriberId::new("u1"));

        assert_eq!(record.kind, AlertKind::Dip);
        assert_eq!(record.source, AlertSource::Trailing);
        assert_eq!(record.ts_ms, 42);
        assert!(record.message.contains("RELIANCE"));
        assert!(record.message.contains("3.00%"));
    }

    #[test]
    fn cooldown_key_matches_the_record() {
        let alert = Alert {
            kind: AlertKind::Spike,
            instrument: InstrumentId::new("TCS"),
            percent: 4.0,
            price: 52.0,
            ts_ms: 1,
            source: AlertSource::Rolling,
        };

        let record = AlertRecord::new(alert, SubscriberId::new("u9"));
        let key = record.cooldown_key();

        assert_eq!(key.subscriber, SubscriberId::new("u9"));
        assert_eq!(key.instrument, InstrumentId::new("TCS"));
        assert_eq!(key.kind, AlertKind::Spike);
    }
}
