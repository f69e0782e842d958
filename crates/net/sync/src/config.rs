use std::time::Duration;

/// Configuration of the initial sync service.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound on the peers included in one finalized target.
    pub max_peers_to_sync: usize,
    /// Slots requested per peer in one batch while syncing to the finalized
    /// epoch.
    pub block_batch_size: u64,
    /// Upper bound on the count of a single head-sync request.
    pub head_request_limit: u64,
    /// How long to wait before re-querying the peer registry when no peer
    /// qualifies.
    pub refresh_interval: Duration,
    /// Trailing window of the blocks-per-second counter.
    pub counter_window: Duration,
    /// Import blocks through the no-verify fast path while syncing to the
    /// finalized epoch.
    pub no_verify: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_peers_to_sync: 15,
            block_batch_size: 64,
            head_request_limit: 256,
            refresh_interval: Duration::from_secs(6),
            counter_window: Duration::from_secs(20),
            no_verify: false,
        }
    }
}

impl SyncConfig {
    /// Set the upper bound on peers per finalized target.
    pub fn with_max_peers_to_sync(mut self, max_peers_to_sync: usize) -> Self {
        self.max_peers_to_sync = max_peers_to_sync;
        self
    }

    /// Set the per-peer batch size.
    pub fn with_block_batch_size(mut self, block_batch_size: u64) -> Self {
        self.block_batch_size = block_batch_size;
        self
    }

    /// Set the head-sync request cap.
    pub fn with_head_request_limit(mut self, head_request_limit: u64) -> Self {
        self.head_request_limit = head_request_limit;
        self
    }

    /// Set the peer-registry refresh interval.
    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Set the rate-counter window.
    pub fn with_counter_window(mut self, counter_window: Duration) -> Self {
        self.counter_window = counter_window;
        self
    }

    /// Import through the no-verify fast path while syncing to finality.
    pub fn with_no_verify(mut self, no_verify: bool) -> Self {
        self.no_verify = no_verify;
        self
    }
}
