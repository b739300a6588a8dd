//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! Expiry is enforced lazily on every lookup regardless; the sweep only
//! reclaims memory for entries nobody reads anymore under sustained load.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::shared::SharedCache;

/// Spawns a background task that periodically purges expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the configured interval
/// between sweeps. It acquires the cache write lock only for the duration of
/// each purge.
///
/// # Arguments
/// * `cache` - Shared cache handle to sweep
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache: SharedCache<Record> = SharedCache::new(&config)?;
/// let sweep_handle = spawn_sweep_task(cache.clone(), config.sweep_interval_secs);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<V>(cache: SharedCache<V>, sweep_interval_secs: u64) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
