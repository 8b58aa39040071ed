//! TTL Cleaner
//!
//! Background task that periodically sweeps expired keys out of the
//! store. Lazy expiry on access stays in effect either way; the sweep
//! only bounds how long unreferenced expired keys hold memory.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::Store;

/// Background TTL cleanup task
pub struct TtlCleaner {
    store: Store,
    interval: Duration,
}

impl TtlCleaner {
    pub fn new(store: Store, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run the cleaner (should be spawned as a task)
    pub async fn run(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "TTL cleaner started");

        loop {
            ticker.tick().await;
            let removed = self.store.cleanup_expired();
            if removed > 0 {
                debug!(removed, remaining = self.store.len(), "Cleaned up expired keys");
            }
        }
    }

    /// Spawn the cleaner on the current runtime.
    pub fn spawn(store: Store, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(Self::new(store, interval).run())
    }
}
