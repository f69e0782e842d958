use crate::{
    config::SyncConfig,
    counter::RateCounter,
    fetcher::BlockFetcher,
    metrics::SyncMetrics,
    parallel::RangeDownloader,
};
use meridian_interfaces::{
    chain::{BlockImportError, ChainProcessor},
    p2p::{
        client::{BlocksByRangeClient, BlocksByRangeRequest},
        error::DownloadError,
        peers::{FinalizedTarget, PeerView},
    },
    store::BlockStore,
};
use meridian_primitives::{ChainSpec, PeerId, SignedBeaconBlock, Slot};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio_util::sync::CancellationToken;

/// Initial sync errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The download pipeline failed.
    #[error(transparent)]
    Download(#[from] DownloadError),
    /// The chain processor refused a block.
    #[error(transparent)]
    Import(#[from] BlockImportError),
}

/// Round-robin initial sync.
///
/// Looks at the latest peer statuses and syncs against the peers advertising
/// the highest common finalized checkpoint, in two phases:
///
/// 1. To the finalized epoch: batches of blocks are striped across the
///    target's peers, merged, sorted and fed to the chain processor. Failed
///    shares move to the surviving peers mid-batch.
/// 2. To the wall-clock head: sequential capped requests against the single
///    best-head peer, anchored at the freshest finalized root.
///
/// The service is single-use: [`RoundRobinSync::run`] consumes it and
/// cancels all in-flight work on return.
pub struct RoundRobinSync<C, V, P, S> {
    client: Arc<C>,
    peers: V,
    chain: P,
    store: S,
    spec: ChainSpec,
    genesis: SystemTime,
    config: SyncConfig,
    token: CancellationToken,
    counter: RateCounter,
    metrics: SyncMetrics,
    rng: ChaCha8Rng,
    empty_rounds: u64,
}

impl<C, V, P, S> RoundRobinSync<C, V, P, S>
where
    C: BlocksByRangeClient + 'static,
    V: PeerView,
    P: ChainProcessor,
    S: BlockStore,
{
    /// Creates the service. The peer shuffler is seeded from the wall clock;
    /// use [`RoundRobinSync::with_rng_seed`] for a deterministic run.
    pub fn new(
        client: Arc<C>,
        peers: V,
        chain: P,
        store: S,
        spec: ChainSpec,
        genesis: SystemTime,
        config: SyncConfig,
    ) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let counter = RateCounter::new(config.counter_window);
        Self {
            client,
            peers,
            chain,
            store,
            spec,
            genesis,
            config,
            token: CancellationToken::new(),
            counter,
            metrics: SyncMetrics::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            empty_rounds: 0,
        }
    }

    /// Reseeds the peer shuffler.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Token cancelling this run. In-flight requests stop at the next frame
    /// boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs both sync phases to completion.
    ///
    /// Returns once the local head has reached the wall-clock slot, on the
    /// first fatal error, or on cancellation.
    pub async fn run(mut self) -> Result<(), SyncError> {
        let result = self.run_phases().await;
        self.token.cancel();
        result
    }

    async fn run_phases(&mut self) -> Result<(), SyncError> {
        self.sync_to_finalized().await?;
        self.sync_to_head().await
    }

    /// Phase 1: sync to the highest finalized epoch the peer set agrees on.
    async fn sync_to_finalized(&mut self) -> Result<(), SyncError> {
        loop {
            let local_head = self.chain.head_slot();
            let target = self
                .peers
                .best_finalized(self.config.max_peers_to_sync, self.spec.epoch_at(local_head));

            // Synced past everything the peer set can attest to.
            let ceiling = self.spec.start_slot(target.epoch + 1);
            if local_head >= ceiling {
                break;
            }
            if target.peers.is_empty() {
                tracing::warn!(target: "sync::initial", "No peers to sync with, waiting for reconnect");
                self.wait_refresh().await?;
                continue;
            }

            // Shuffle so a bad peer cannot occupy the same shard every batch.
            let mut peers = target.peers.clone();
            peers.shuffle(&mut self.rng);

            let start = local_head + 1;
            let skipped =
                self.config.block_batch_size * self.empty_rounds * peers.len() as u64;
            if start + skipped > ceiling {
                tracing::debug!(
                    target: "sync::initial",
                    finalized_epoch = target.epoch,
                    "Requested range reaches past the finalized epoch"
                );
                break;
            }

            let mut blocks = match self.fetch_batch(start, &peers, &target).await {
                Ok(blocks) => blocks,
                Err(DownloadError::NoPeers) => {
                    tracing::warn!(
                        target: "sync::initial",
                        "All peers failed the batch, re-querying the peer set"
                    );
                    self.wait_refresh().await?;
                    continue;
                }
                Err(error) => return Err(error.into()),
            };
            self.metrics.batches.increment(1);

            // Responses arrive in completion order; restore slot order before
            // feeding the processor.
            blocks.sort_by_key(|block| block.slot());

            let batch_len = blocks.len();
            for block in blocks {
                self.log_sync_status(&block, target.peers.len());
                if block.slot() <= self.chain.head_slot() {
                    // Duplicate slot from a byzantine peer. The processor must
                    // only ever see ascending slots.
                    tracing::debug!(
                        target: "sync::initial",
                        slot = block.slot(),
                        "Skipping block at or behind head"
                    );
                    continue;
                }
                if !self.store.has_block(&block.parent_root()) {
                    tracing::debug!(
                        target: "sync::initial",
                        slot = block.slot(),
                        parent = %block.parent_root(),
                        "Skipping block with unknown parent"
                    );
                    continue;
                }
                self.import_block(block, self.config.no_verify).await?;
            }

            // An empty range means the head did not move; shift the next
            // batch instead of asking for the same range again.
            if batch_len == 0 {
                self.empty_rounds += 1;
                self.metrics.empty_batches.increment(1);
            } else {
                self.empty_rounds = 0;
            }
        }

        tracing::debug!(target: "sync::initial", "Synced to finalized epoch, continuing to head");
        Ok(())
    }

    /// Phase 2: sync from the finalized epoch to the wall-clock head, from
    /// the single peer advertising the highest head.
    async fn sync_to_head(&mut self) -> Result<(), SyncError> {
        if self.chain.head_slot() >= self.spec.slots_since(self.genesis) {
            return Ok(());
        }

        // Re-anchor on the freshest finalized root; finality may have moved
        // during phase 1.
        let (best, anchor) = loop {
            let local_epoch = self.spec.epoch_at(self.chain.head_slot());
            let target =
                self.peers.best_finalized(self.config.max_peers_to_sync, local_epoch);
            match self.peers.best_head() {
                Some(best) => break (best, target.root),
                None => self.wait_refresh().await?,
            }
        };

        loop {
            let local_head = self.chain.head_slot();
            let wall_head = self.spec.slots_since(self.genesis);
            if local_head >= wall_head {
                break;
            }

            let request = BlocksByRangeRequest {
                head_block_root: anchor,
                start_slot: local_head + 1,
                count: (wall_head - local_head + 1).min(self.config.head_request_limit),
                step: 1,
            };
            tracing::debug!(
                target: "sync::initial",
                %best,
                start = request.start_slot,
                count = request.count,
                "Requesting batch up to head"
            );

            let fetcher = BlockFetcher::new(Arc::clone(&self.client), self.token.clone());
            let blocks = fetcher.fetch(best, request).await.map_err(SyncError::Download)?;
            if blocks.is_empty() {
                break;
            }

            for block in blocks {
                self.log_sync_status(&block, 1);
                if block.slot() <= self.chain.head_slot() {
                    continue;
                }
                self.import_block(block, false).await?;
            }
        }

        Ok(())
    }

    async fn fetch_batch(
        &self,
        start: Slot,
        peers: &[PeerId],
        target: &FinalizedTarget,
    ) -> Result<Vec<SignedBeaconBlock>, DownloadError> {
        let fetcher = BlockFetcher::new(Arc::clone(&self.client), self.token.clone());
        let downloader = Arc::new(RangeDownloader::new(
            fetcher,
            target.root,
            self.spec.start_slot(target.epoch + 1),
            self.metrics.clone(),
        ));
        downloader
            .download(start, 1, self.config.block_batch_size, peers.to_vec(), 0, self.empty_rounds)
            .await
    }

    async fn import_block(
        &self,
        block: SignedBeaconBlock,
        no_verify: bool,
    ) -> Result<(), SyncError> {
        self.metrics.blocks_processed.increment(1);
        if no_verify {
            self.chain.process_block_no_verify(block).await?;
        } else {
            self.chain.process_block(block).await?;
        }
        Ok(())
    }

    async fn wait_refresh(&self) -> Result<(), SyncError> {
        tokio::select! {
            _ = self.token.cancelled() => Err(SyncError::Download(DownloadError::Cancelled)),
            _ = tokio::time::sleep(self.config.refresh_interval) => Ok(()),
        }
    }

    fn log_sync_status(&self, block: &SignedBeaconBlock, syncing_peers: usize) {
        self.counter.incr();
        let mut rate = self.counter.rate();
        if rate == 0.0 {
            rate = 1.0;
        }
        self.metrics.blocks_per_second.set(rate);

        let wall_head = self.spec.slots_since(self.genesis);
        let remaining =
            Duration::from_secs_f64(wall_head.saturating_sub(block.slot()) as f64 / rate);
        tracing::info!(
            target: "sync::initial",
            peers = %format!("{}/{}", syncing_peers, self.peers.connected_count()),
            blocks_per_second = %format!("{rate:.1}"),
            "Processing block {}/{}, estimated time remaining {:?}",
            block.slot(),
            wall_head,
            remaining
        );
    }
}
