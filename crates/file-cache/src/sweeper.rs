//! Background reclamation of expired entries

use crate::cache::Shared;
use crate::error::{CacheError, Result};
use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Handle to the sweep task of one cache.
///
/// The task only holds a weak reference to the cache, so it ends on its own
/// once the cache is dropped.
pub(crate) struct Sweeper {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep task on the current tokio runtime
    pub(crate) fn start<V>(cache: Weak<Shared<V>>, period: Duration) -> Result<Self>
    where
        V: Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| CacheError::NoRuntime(e.to_string()))?;
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = runtime.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            info!(period = ?period, "Sweeper started");
            loop {
                // Stop is only observed between sweeps
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop_rx.changed() => break,
                }

                let Some(shared) = cache.upgrade() else {
                    break;
                };
                match shared.delete_expired().await {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "Swept expired entries"),
                    Err(e) => warn!(error = %e, "Sweep failed, remaining entries left for next tick"),
                }
            }
            info!("Sweeper stopped");
        });

        Ok(Self { stop_tx, handle })
    }

    /// Idempotent
    pub(crate) fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
