use crate::recording::registry::RecordingRegistry;
use crate::store::{MarkerStore, epoch_ms};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Timer-driven sweep of stale recording sessions and deprecated markers.
///
/// Ticks never overlap: each tick is awaited inside the loop body and a
/// missed tick is delayed, so a slow sweep pushes the next one back
/// instead of re-entering it.
pub struct Reaper {
    registry: Arc<RecordingRegistry>,
    store: Arc<dyn MarkerStore>,
    interval: Duration,
    retention: Duration,
}

impl Reaper {
    pub fn new(
        registry: Arc<RecordingRegistry>,
        store: Arc<dyn MarkerStore>,
        interval: Duration,
        retention: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            interval,
            retention,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval yields immediately on the first poll; the first sweep
        // belongs one full interval out
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = shutdown.changed() => {
                    info!("Reaper shutting down");
                    break;
                }
            }
        }
    }

    /// One sweep pass. Never raises: a failing store deletion is logged
    /// and skipped.
    pub async fn tick(&self) {
        self.registry.sweep();

        let cutoff = epoch_ms().saturating_sub(self.retention.as_millis() as i64);
        match self.store.delete_older_than(cutoff).await {
            Ok(purged) if purged > 0 => debug!("Purged {purged} deprecated marker(s)"),
            Ok(_) => {}
            Err(e) => error!("Marker purge failed: {e}"),
        }
    }
}
