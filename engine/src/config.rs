use alerts::cooldown::DEFAULT_COOLDOWN_MS;
use market::cache::DEFAULT_PRICE_TTL_MS;
use market::history::DEFAULT_HISTORY_CAP;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Database connection string for the watch + audit stores.
    pub database_url: String,

    // =========================
    // Evaluation configuration
    // =========================
    /// Retained points per instrument. Older points are evicted FIFO.
    pub history_cap: usize,

    /// Age at which a cached latest price reads as "no data".
    pub price_ttl_ms: u64,

    /// Suppression window applied per (subscriber, instrument, kind) after
    /// a dispatch. A repeat of the same key inside this window is dropped
    /// silently, whatever its magnitude.
    pub cooldown_ms: u64,

    // =========================
    // Throughput configuration
    // =========================
    /// Per-instrument tick buffer. When the feed outruns evaluation, the
    /// buffer fills and the *oldest* queued tick is dropped — the cache only
    /// needs the latest observation, so newest wins.
    pub tick_buffer: usize,

    /// Capacity of the async channel between the pipeline and the dispatch
    /// sink. Acts as backpressure if audit persistence slows down.
    pub dispatch_queue_capacity: usize,

    /// Upper bound on one notifier call. A hung channel must not pin the
    /// sink task once the audit row is written.
    pub notify_timeout_ms: u64,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://squall_dev.db".to_string());

        Self {
            database_url,

            history_cap: DEFAULT_HISTORY_CAP,
            price_ttl_ms: DEFAULT_PRICE_TTL_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,

            tick_buffer: 64,
            dispatch_queue_capacity: 256,
            notify_timeout_ms: 5_000,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
