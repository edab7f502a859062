use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct PipelineCounters {
    /// Ticks accepted at the ingestion boundary.
    pub ticks_accepted: Arc<AtomicU64>,
    /// Malformed ticks rejected at the ingestion boundary.
    pub ticks_rejected: Arc<AtomicU64>,
    /// Ticks dropped from a full per-instrument buffer (oldest-first).
    pub ticks_dropped: Arc<AtomicU64>,

    /// Candidates handed to the dispatch sink.
    pub alerts_dispatched: Arc<AtomicU64>,
    /// Candidates dropped by a live cooldown.
    pub alerts_suppressed: Arc<AtomicU64>,
}
