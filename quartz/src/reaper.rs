use crate::metadata::MetadataLedger;
use crate::store::ObjectStore;
use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug)]
pub struct ReaperConfig {
    /// Maximum age an entry may reach before it becomes eligible for deletion.
    pub retention: Duration,
    /// How often a sweep runs. The first sweep runs immediately on spawn.
    pub sweep_interval: Duration,
}

/// Background retention sweep: deletes blob and metadata once an entry's age
/// exceeds the retention window. Stateless across sweeps.
pub struct Reaper {
    store: Arc<ObjectStore>,
    ledger: Arc<MetadataLedger>,
    config: ReaperConfig,
}

/// Owns the reaper task. Dropping the handle leaves the task running for the
/// process lifetime; `shutdown` stops it cleanly.
pub struct ReaperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl Reaper {
    pub fn new(store: Arc<ObjectStore>, ledger: Arc<MetadataLedger>, config: ReaperConfig) -> Self {
        Self {
            store,
            ledger,
            config,
        }
    }

    /// Start the sweep loop on a dedicated task: one sweep immediately, then
    /// one every `sweep_interval`.
    pub fn spawn(self) -> ReaperHandle {
        info!(
            "reaper started (retention: {}s, interval: {}s)",
            self.config.retention.as_secs(),
            self.config.sweep_interval.as_secs()
        );

        // A zero period is not schedulable (tokio's interval panics on it).
        let sweep_interval = if self.config.sweep_interval.is_zero() {
            warn!("sweep interval of zero is not schedulable, using 1s");
            Duration::from_secs(1)
        } else {
            self.config.sweep_interval
        };

        let (tx, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep_once().await;
                    }
                    _ = rx.changed() => {
                        info!("reaper stopped");
                        break;
                    }
                }
            }
        });

        ReaperHandle { shutdown: tx, task }
    }

    /// One full pass over all stored keys. Per-key failures are logged and
    /// skipped; they never abort the sweep. Returns the number of expired
    /// entries reclaimed.
    pub async fn sweep_once(&self) -> usize {
        let keys = match self.store.list().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("sweep aborted, cannot enumerate store: {}", e);
                return 0;
            }
        };

        let retention = TimeDelta::from_std(self.config.retention).unwrap_or(TimeDelta::MAX);
        let Some(cutoff) = Utc::now().checked_sub_signed(retention) else {
            // Window reaches past the representable epoch; nothing can expire.
            return 0;
        };

        let mut deleted = 0usize;
        for key in keys {
            let metadata = match self.ledger.load(&key).await {
                Ok(metadata) => metadata,
                Err(_) => {
                    // Age unknown is not the same as infinitely old; leave
                    // the orphan in place rather than destroy data over
                    // lost bookkeeping.
                    warn!("no readable metadata for {}, skipping", key);
                    continue;
                }
            };

            // Strictly older than the window; an entry exactly at the
            // boundary survives.
            if metadata.created_at >= cutoff {
                continue;
            }

            let blob_removed = match self.store.delete(&key).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("failed to delete blob for {}: {}", key, e);
                    false
                }
            };
            let metadata_removed = match self.ledger.delete(&key).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("failed to delete metadata for {}: {}", key, e);
                    false
                }
            };

            // Only entries that actually lost an artifact count as reclaimed.
            if blob_removed || metadata_removed {
                deleted += 1;
                info!(
                    "deleted expired entry {} (age: {})",
                    key,
                    Utc::now() - metadata.created_at
                );
            }
        }

        if deleted > 0 {
            info!("sweep complete, deleted {} expired entries", deleted);
        }
        deleted
    }
}
