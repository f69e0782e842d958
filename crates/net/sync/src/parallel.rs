use crate::{
    fetcher::BlockFetcher,
    metrics::SyncMetrics,
    shard::{shard_range, ShardParams},
};
use futures::{future::BoxFuture, stream::FuturesUnordered, FutureExt};
use futures_util::StreamExt;
use meridian_interfaces::p2p::{
    client::BlocksByRangeClient,
    error::{DownloadError, DownloadResult},
};
use meridian_primitives::{PeerId, Root, SignedBeaconBlock, Slot};
use std::sync::Arc;

/// Downloads one batch range by striping sub-requests across a peer set.
///
/// One fetch runs per peer. A peer failing its sub-request does not fail the
/// batch while other peers survive: the failed sub-range is re-striped across
/// the survivors and fetched again. Asking the same peer again would waste
/// time against a byzantine peer, while the survivors are assumed mostly
/// honest.
///
/// Blocks are returned in completion order; the caller sorts.
pub(crate) struct RangeDownloader<C> {
    fetcher: BlockFetcher<C>,
    head_block_root: Root,
    ceiling: Slot,
    metrics: SyncMetrics,
}

impl<C> RangeDownloader<C>
where
    C: BlocksByRangeClient + 'static,
{
    pub(crate) fn new(
        fetcher: BlockFetcher<C>,
        head_block_root: Root,
        ceiling: Slot,
        metrics: SyncMetrics,
    ) -> Self {
        Self { fetcher, head_block_root, ceiling, metrics }
    }

    /// Downloads `count` slots per peer starting at `start`, striding the
    /// range across `peers`.
    ///
    /// Resolves only once every launched sub-request has completed, has
    /// contributed its blocks through failover, or the whole call has
    /// failed. Failing the call drops the remaining sub-requests, which
    /// closes their streams.
    pub(crate) fn download(
        self: Arc<Self>,
        start: Slot,
        step: u64,
        count: u64,
        peers: Vec<PeerId>,
        remainder: usize,
        empty_rounds: u64,
    ) -> BoxFuture<'static, DownloadResult<Vec<SignedBeaconBlock>>> {
        async move {
            if peers.is_empty() {
                return Err(DownloadError::NoPeers);
            }

            let shards = shard_range(ShardParams {
                start,
                step,
                count,
                peers: &peers,
                remainder,
                empty_rounds,
                head_block_root: self.head_block_root,
                ceiling: self.ceiling,
            })?;

            let mut in_progress = FuturesUnordered::new();
            for (peer, request) in shards {
                let this = Arc::clone(&self);
                let peers = peers.clone();
                in_progress.push(async move {
                    match this.fetcher.fetch(peer, request.clone()).await {
                        Ok(blocks) => Ok(blocks),
                        Err(error @ (DownloadError::Cancelled
                        | DownloadError::BeyondFinalized { .. })) => Err(error),
                        Err(error) => {
                            // The survivor set is a local snapshot; sibling
                            // sub-requests keep striping over their own.
                            let survivors: Vec<PeerId> =
                                peers.iter().copied().filter(|p| *p != peer).collect();
                            tracing::debug!(
                                target: "sync::initial",
                                %peer,
                                %error,
                                survivors = survivors.len(),
                                "Sub-request failed, re-striping across remaining peers"
                            );
                            if survivors.is_empty() {
                                return Err(DownloadError::NoPeers);
                            }
                            this.metrics.failovers.increment(1);
                            let survivor_count = survivors.len() as u64;
                            Arc::clone(&this)
                                .download(
                                    request.start_slot,
                                    request.step,
                                    request.count / survivor_count,
                                    survivors,
                                    (request.count % survivor_count) as usize,
                                    0,
                                )
                                .await
                        }
                    }
                });
            }

            let mut blocks = Vec::new();
            while let Some(fetched) = in_progress.next().await {
                blocks.extend(fetched?);
            }
            Ok(blocks)
        }
        .boxed()
    }
}
