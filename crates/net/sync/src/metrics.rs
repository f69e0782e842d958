use metrics::{counter, gauge, Counter, Gauge};

/// Initial sync metrics.
#[derive(Clone)]
pub(crate) struct SyncMetrics {
    /// Blocks handed to the chain processor.
    pub(crate) blocks_processed: Counter,
    /// Batches fetched while syncing to the finalized epoch.
    pub(crate) batches: Counter,
    /// Batches that returned no blocks.
    pub(crate) empty_batches: Counter,
    /// Sub-ranges re-sharded across surviving peers.
    pub(crate) failovers: Counter,
    /// Blocks per second over the telemetry window.
    pub(crate) blocks_per_second: Gauge,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self {
            blocks_processed: counter!("sync_initial_blocks_processed"),
            batches: counter!("sync_initial_batches"),
            empty_batches: counter!("sync_initial_empty_batches"),
            failovers: counter!("sync_initial_failovers"),
            blocks_per_second: gauge!("sync_initial_blocks_per_second"),
        }
    }
}
