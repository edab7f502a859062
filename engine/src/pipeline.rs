//! AlertPipeline
//!
//! This module orchestrates the tick-to-alert path.
//! Responsibilities:
//!   • Validate incoming ticks at the ingestion boundary
//!   • Keep History Store and Price Cache current for every accepted tick
//!   • Resolve watchers and run their enabled algorithms per tick
//!   • Gate every candidate through the cooldown ledger
//!   • Hand surviving alerts to the dispatch sink's job queue
//!
//! Ticks for one instrument are processed in arrival order by a dedicated
//! worker task; instruments proceed in parallel. AlertPipeline is designed
//! as an Arc-managed async service, so worker tasks may safely capture
//! `self` without lifetime issues.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::Mutex;
use tracing::Instrument;

use alerts::cooldown::{CooldownKey, CooldownLedger};
use alerts::evaluator::{evaluate_rolling, evaluate_trailing};
use common::logger::TraceId;
use dispatch::types::{AlertRecord, DispatchSender};
use market::cache::{LatestPrice, PriceCache};
use market::history::HistoryStore;
use market::types::{InstrumentId, PricePoint, Tick, TickError};
use watch::registry::WatchRegistry;
use watch::store::WatchStore;

use crate::config::EngineConfig;
use crate::counters::PipelineCounters;
use crate::queue::TickQueue;

pub struct AlertPipeline<S: WatchStore> {
    /// Bounded per-instrument price history.
    history: Arc<HistoryStore>,

    /// Latest observation per instrument for the display layer.
    cache: Arc<PriceCache>,

    /// Per-(subscriber, instrument, kind) suppression state.
    ledger: Arc<CooldownLedger>,

    /// Instrument ↔ watcher relation and per-subscriber rules.
    registry: Arc<WatchRegistry<S>>,

    /// Job queue into the dispatch sink.
    dispatch_tx: DispatchSender,

    counters: PipelineCounters,
    cfg: EngineConfig,

    /// One buffer + worker task per instrument seen so far.
    workers: Mutex<HashMap<InstrumentId, Arc<TickQueue>>>,
}

impl<S: WatchStore + 'static> AlertPipeline<S> {
    /// Create a new AlertPipeline wrapped in Arc<Self> for multi-task
    /// ownership. The cooldown ledger is shared with the dispatch sink so a
    /// failed audit write can release its key.
    pub fn new(
        cfg: EngineConfig,
        registry: Arc<WatchRegistry<S>>,
        ledger: Arc<CooldownLedger>,
        dispatch_tx: DispatchSender,
    ) -> Arc<Self> {
        Arc::new(Self {
            history: Arc::new(HistoryStore::with_cap(cfg.history_cap)),
            cache: Arc::new(PriceCache::with_ttl(cfg.price_ttl_ms)),
            ledger,
            registry,
            dispatch_tx,
            counters: PipelineCounters::default(),
            cfg,
            workers: Mutex::new(HashMap::new()),
        })
    }

    pub fn counters(&self) -> PipelineCounters {
        self.counters.clone()
    }

    /// Sole ingestion entry point, called once per observation by the feed
    /// collaborator.
    ///
    /// Only validation errors surface here; a rejected tick has caused no
    /// state mutation anywhere. Accepted ticks are buffered per instrument
    /// and processed in arrival order.
    pub async fn on_tick(self: Arc<Self>, tick: Tick) -> Result<(), TickError> {
        if let Err(e) = tick.validate() {
            self.counters.ticks_rejected.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(error = %e, "rejected malformed tick");
            return Err(e);
        }

        let queue = Arc::clone(&self).worker_queue(&tick.instrument).await;

        if queue.push(tick).await {
            self.counters.ticks_dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.counters.ticks_accepted.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    /// Fetch the instrument's buffer, spawning its worker task on first
    /// sight of the instrument.
    async fn worker_queue(self: Arc<Self>, instrument: &InstrumentId) -> Arc<TickQueue> {
        let mut workers = self.workers.lock().await;

        if let Some(queue) = workers.get(instrument) {
            return Arc::clone(queue);
        }

        let queue = Arc::new(TickQueue::new(self.cfg.tick_buffer));
        workers.insert(instrument.clone(), Arc::clone(&queue));

        let pipeline = Arc::clone(&self);
        let worker_queue = Arc::clone(&queue);
        let instrument = instrument.clone();
        tokio::spawn(async move {
            tracing::debug!(instrument = %instrument, "tick worker started");
            pipeline.run_worker(worker_queue).await;
        });

        queue
    }

    /// Sequential consumer for one instrument: arrival order in, arrival
    /// order applied.
    async fn run_worker(self: Arc<Self>, queue: Arc<TickQueue>) {
        loop {
            let tick = queue.pop().await;

            let trace_id = TraceId::default();
            let span = common::logger::root_span("tick", &trace_id);
            self.process_tick(tick).instrument(span).await;
        }
    }

    /// One full evaluation cycle for an already-validated tick.
    async fn process_tick(&self, tick: Tick) {
        // Stores are updated even when nobody watches the instrument; the
        // display layer reads the cache independently of alerting.
        if let Err(e) = self
            .history
            .record(&tick.instrument, tick.price, tick.ts_ms)
            .await
        {
            // validation already passed, so this cannot happen on this path
            tracing::warn!(error = %e, instrument = %tick.instrument, "history rejected tick");
            return;
        }

        self.cache
            .set(&tick.instrument, tick.price, tick.ts_ms, tick.change_percent)
            .await;

        let watchers = self.registry.watchers_of(&tick.instrument).await;
        if watchers.is_empty() {
            return;
        }

        // Evaluate against the just-updated history; the snapshot is owned,
        // so concurrent writes for other instruments never show through.
        let history = self.history.read(&tick.instrument).await;

        for subscriber in watchers {
            let rule = self.registry.settings_of(&subscriber).await;

            let mut candidates = Vec::with_capacity(2);

            if rule.trailing.enabled {
                if let Some(alert) = evaluate_trailing(
                    &tick.instrument,
                    tick.price,
                    tick.ts_ms,
                    &history,
                    rule.trailing.threshold_percent,
                ) {
                    candidates.push(alert);
                }
            }

            if rule.rolling.enabled {
                if let Some(alert) = evaluate_rolling(
                    &tick.instrument,
                    tick.price,
                    tick.ts_ms,
                    &history,
                    rule.rolling.window_minutes,
                    rule.rolling.threshold_percent,
                ) {
                    candidates.push(alert);
                }
            }

            for alert in candidates {
                let key = CooldownKey {
                    subscriber: subscriber.clone(),
                    instrument: alert.instrument.clone(),
                    kind: alert.kind,
                };

                // Atomic check-then-arm; a suppressed candidate is dropped
                // silently, not an error.
                if !self
                    .ledger
                    .try_acquire(key.clone(), tick.ts_ms, self.cfg.cooldown_ms)
                    .await
                {
                    self.counters
                        .alerts_suppressed
                        .fetch_add(1, Ordering::Relaxed);
                    continue;
                }

                let record = AlertRecord::new(alert, subscriber.clone());

                if self.dispatch_tx.send(record).await.is_err() {
                    // sink is gone; nothing was audited, so the key must not
                    // stay armed
                    tracing::error!(
                        subscriber = %subscriber,
                        instrument = %tick.instrument,
                        "dispatch queue closed, dropping alert"
                    );
                    self.ledger.disarm(&key).await;
                    continue;
                }

                self.counters
                    .alerts_dispatched
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    // =========================
    // Display-layer query surface
    // =========================

    /// Latest cached observation, or None if the instrument is offline.
    pub async fn latest(&self, instrument: &InstrumentId) -> Option<LatestPrice> {
        self.cache.get(instrument, common::time::epoch_ms()).await
    }

    /// Bulk variant of `latest`, positionally aligned with the request.
    pub async fn latest_many(&self, instruments: &[InstrumentId]) -> Vec<Option<LatestPrice>> {
        self.cache
            .get_many(instruments, common::time::epoch_ms())
            .await
    }

    /// Newest `limit` history points, newest first.
    pub async fn history(&self, instrument: &InstrumentId, limit: usize) -> Vec<PricePoint> {
        self.history.read_last(instrument, limit).await
    }
}
