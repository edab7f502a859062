use std::time::{SystemTime, UNIX_EPOCH};

pub const MS_PER_MINUTE: u64 = 60_000;

/// Wall-clock milliseconds since the unix epoch.
///
/// The pipeline keeps all timestamps as `u64` epoch-ms; this is the single
/// place that touches the system clock. Evaluation and cooldown logic take
/// `now_ms` as a parameter instead of calling this, so they stay
/// deterministic under test.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
