//! Periodic prune of expired entries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use super::store::MemoryStore;

/// Runs [`MemoryStore::prune_expired`] on a fixed interval.
pub struct PruneScheduler {
    store: MemoryStore,
    interval: Duration,
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
}

impl PruneScheduler {
    /// A zero `interval` disables the scheduler.
    pub fn new(store: MemoryStore, interval: Duration) -> Self {
        Self {
            store,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts the background task. No-op when disabled or already running.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        if !self.is_enabled() {
            debug!("Prune scheduler disabled");
            return tokio::spawn(async {});
        }

        // AcqRel: only one caller may win the false -> true transition.
        if self.running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }
        self.stop_requested.store(false, Ordering::Release);

        let store = self.store.clone();
        let period = self.interval;
        let running = Arc::clone(&self.running);
        let stop_requested = Arc::clone(&self.stop_requested);

        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if stop_requested.load(Ordering::Acquire) {
                    break;
                }

                match store.prune_expired().await {
                    Ok(removed) => debug!(removed = removed, "Scheduled prune finished"),
                    Err(e) => warn!(error = %e, "Scheduled prune failed"),
                }
            }
            running.store(false, Ordering::Release);
        })
    }

    /// Asks the task to exit at its next tick.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }
}
