//! Bounded per-instrument tick buffer.
//!
//! Degradation policy when the feed outruns evaluation: keep the newest
//! ticks, drop the oldest queued ones. A plain bounded mpsc channel would do
//! the opposite (reject the incoming tick), which is the wrong half of the
//! queue to lose — the price cache only ever needs the latest observation.

use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify};

use market::types::Tick;

pub struct TickQueue {
    inner: Mutex<VecDeque<Tick>>,
    notify: Notify,
    cap: usize,
}

impl TickQueue {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            notify: Notify::new(),
            cap: cap.max(1),
        }
    }

    /// Enqueue a tick. Returns true if an older tick had to be dropped to
    /// make room.
    pub async fn push(&self, tick: Tick) -> bool {
        let dropped = {
            let mut queue = self.inner.lock().await;

            let dropped = if queue.len() >= self.cap {
                queue.pop_front();
                true
            } else {
                false
            };

            queue.push_back(tick);
            dropped
        };

        self.notify.notify_one();
        dropped
    }

    /// Dequeue the oldest tick, waiting if the buffer is empty.
    pub async fn pop(&self) -> Tick {
        loop {
            if let Some(tick) = self.inner.lock().await.pop_front() {
                return tick;
            }
            self.notify.notified().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
