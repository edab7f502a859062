//! DispatchSink
//!
//! Consumes alert records from the pipeline's job queue and, per record:
//!   1. Persists the audit row. This must succeed first — a crash after
//!      persistence but before notification never loses the audit trail.
//!   2. Hands the record to the external notifier under a bounded timeout.
//!
//! Failure contract:
//!   • Audit write fails → the record is dropped, its cooldown key is
//!     released (the dispatch "did not happen"), and the sink moves on.
//!   • Notifier fails or times out → the record stays audited; the failure
//!     is logged, never retried here.
//!
//! The sink runs as its own task so a slow notifier cannot stall tick
//! ingestion.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::Receiver;

use alerts::cooldown::CooldownLedger;

use crate::audit::AuditStore;
use crate::types::{AlertRecord, DispatchOutcome, Notifier};

pub struct DispatchSink<A, N> {
    audit: Arc<A>,
    notifier: Arc<N>,
    ledger: Arc<CooldownLedger>,
    rx: Receiver<AlertRecord>,
    notify_timeout: Duration,
}

impl<A: AuditStore, N: Notifier> DispatchSink<A, N> {
    pub fn new(
        audit: Arc<A>,
        notifier: Arc<N>,
        ledger: Arc<CooldownLedger>,
        rx: Receiver<AlertRecord>,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            audit,
            notifier,
            ledger,
            rx,
            notify_timeout,
        }
    }

    /// Main loop: drains the job queue until the pipeline side closes it.
    pub async fn run(mut self) {
        while let Some(record) = self.rx.recv().await {
            self.handle(record).await;
        }

        tracing::info!("dispatch queue closed, sink stopping");
    }

    /// Process one record: persist, then notify.
    pub async fn handle(&self, record: AlertRecord) -> DispatchOutcome {
        if let Err(e) = self.audit.append(&record).await {
            tracing::error!(
                error = %e,
                subscriber = %record.subscriber,
                instrument = %record.instrument,
                kind = %record.kind,
                "audit write failed, dropping alert and releasing cooldown"
            );

            self.ledger.disarm(&record.cooldown_key()).await;
            return DispatchOutcome::AuditFailed;
        }

        match tokio::time::timeout(self.notify_timeout, self.notifier.notify(&record)).await {
            Ok(Ok(())) => {
                tracing::info!(
                    subscriber = %record.subscriber,
                    instrument = %record.instrument,
                    kind = %record.kind,
                    percent = record.percent,
                    "alert dispatched"
                );
                DispatchOutcome::Dispatched
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    subscriber = %record.subscriber,
                    instrument = %record.instrument,
                    "notifier failed, alert remains audited"
                );
                DispatchOutcome::NotifyFailed
            }
            Err(_) => {
                tracing::warn!(
                    subscriber = %record.subscriber,
                    instrument = %record.instrument,
                    timeout_ms = self.notify_timeout.as_millis() as u64,
                    "notifier timed out, alert remains audited"
                );
                DispatchOutcome::NotifyFailed
            }
        }
    }
}
