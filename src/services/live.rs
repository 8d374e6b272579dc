// SPDX-License-Identifier: MIT

//! Live sample fan-out: keeps the most recent device sample and broadcasts
//! new ones to stream subscribers.

use crate::models::LiveSample;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Slow stream consumers may drop intermediate samples beyond this backlog;
/// only the latest values matter for a live dashboard.
const BROADCAST_CAPACITY: usize = 32;

pub struct LiveFeed {
    last: Mutex<Option<LiveSample>>,
    tx: broadcast::Sender<LiveSample>,
}

impl Default for LiveFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            last: Mutex::new(None),
            tx,
        }
    }
}

impl LiveFeed {
    /// Record a sample and fan it out to current subscribers.
    pub fn publish(&self, sample: LiveSample) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(sample);
        }
        // No subscribers is fine; the sample is still kept for replay.
        let _ = self.tx.send(sample);
    }

    /// Subscribe to the feed: the most recent sample (for replay) plus a
    /// receiver for everything published from now on.
    pub fn subscribe(&self) -> (Option<LiveSample>, broadcast::Receiver<LiveSample>) {
        let rx = self.tx.subscribe();
        let last = self.last.lock().ok().and_then(|l| *l);
        (last, rx)
    }
}
