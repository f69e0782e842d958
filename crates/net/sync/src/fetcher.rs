use futures_util::StreamExt;
use meridian_interfaces::p2p::{
    client::{BlocksByRangeClient, BlocksByRangeRequest},
    error::{DownloadError, DownloadResult},
};
use meridian_primitives::{PeerId, SignedBeaconBlock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Issues one `BlocksByRange` request against one peer and drains the
/// response stream.
pub(crate) struct BlockFetcher<C> {
    client: Arc<C>,
    token: CancellationToken,
}

impl<C> Clone for BlockFetcher<C> {
    fn clone(&self) -> Self {
        Self { client: Arc::clone(&self.client), token: self.token.clone() }
    }
}

impl<C> BlockFetcher<C>
where
    C: BlocksByRangeClient,
{
    pub(crate) fn new(client: Arc<C>, token: CancellationToken) -> Self {
        Self { client, token }
    }

    /// Downloads the blocks of `request` from `peer`, in the order the peer
    /// sent them.
    ///
    /// Cancellation is observed before the stream is opened and between
    /// frames; the stream is dropped, and thereby closed, on every exit
    /// path. A block outside the requested progression fails the fetch with
    /// the protocol error naming the peer.
    pub(crate) async fn fetch(
        &self,
        peer: PeerId,
        request: BlocksByRangeRequest,
    ) -> DownloadResult<Vec<SignedBeaconBlock>> {
        if self.token.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        tracing::trace!(
            target: "sync::initial",
            %peer,
            start = request.start_slot,
            count = request.count,
            step = request.step,
            head = %request.head_block_root,
            "Requesting blocks"
        );

        let mut stream = tokio::select! {
            _ = self.token.cancelled() => return Err(DownloadError::Cancelled),
            opened = self.client.open_blocks_stream(peer, request.clone()) => opened?,
        };

        let mut blocks = Vec::with_capacity(request.count.min(1024) as usize);
        loop {
            let frame = tokio::select! {
                _ = self.token.cancelled() => return Err(DownloadError::Cancelled),
                frame = stream.next() => frame,
            };
            match frame {
                Some(Ok(block)) => {
                    if !request.contains_slot(block.slot()) {
                        return Err(DownloadError::OutOfRangeBlock {
                            peer,
                            slot: block.slot(),
                            start: request.start_slot,
                            end: request.end_slot(),
                        });
                    }
                    blocks.push(block);
                }
                Some(Err(error)) => return Err(error.into()),
                None => break,
            }
        }

        tracing::debug!(target: "sync::initial", %peer, count = blocks.len(), "Received blocks");
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use meridian_interfaces::{
        p2p::error::RequestError,
        test_utils::{generators, TestBlocksClient},
    };
    use meridian_primitives::{Root, Slot};

    fn request(start_slot: Slot, count: u64, step: u64) -> BlocksByRangeRequest {
        BlocksByRangeRequest { head_block_root: Root::ZERO, start_slot, count, step }
    }

    #[tokio::test]
    async fn fetches_blocks_in_stream_order() {
        let mut rng = generators::rng();
        let blocks = generators::linked_block_range(&mut rng, 1..=8, Root::ZERO);
        let client = Arc::new(TestBlocksClient::default().with_blocks(blocks));
        let fetcher = BlockFetcher::new(Arc::clone(&client), CancellationToken::new());

        let peer = generators::random_peer_id(&mut rng);
        let fetched = fetcher.fetch(peer, request(1, 8, 1)).await.unwrap();

        let slots: Vec<Slot> = fetched.iter().map(|block| block.slot()).collect();
        assert_eq!(slots, (1..=8).collect::<Vec<_>>());
        assert_eq!(client.times_requested(), 1);
    }

    #[tokio::test]
    async fn skipped_slots_shrink_the_response() {
        let mut rng = generators::rng();
        // Only even slots are present.
        let blocks = generators::linked_block_range(&mut rng, (2..=16).step_by(2), Root::ZERO);
        let client = Arc::new(TestBlocksClient::default().with_blocks(blocks));
        let fetcher = BlockFetcher::new(client, CancellationToken::new());

        let peer = generators::random_peer_id(&mut rng);
        let fetched = fetcher.fetch(peer, request(1, 16, 1)).await.unwrap();
        assert_eq!(fetched.len(), 8);
    }

    #[tokio::test]
    async fn flags_out_of_range_blocks() {
        let mut rng = generators::rng();
        let peer = generators::random_peer_id(&mut rng);
        let client = Arc::new(TestBlocksClient::default().with_rogue(peer));
        let fetcher = BlockFetcher::new(client, CancellationToken::new());

        let result = fetcher.fetch(peer, request(1, 8, 1)).await;
        assert_matches!(
            result,
            Err(DownloadError::OutOfRangeBlock { slot: 10, start: 1, end: 9, .. })
        );
    }

    #[tokio::test]
    async fn propagates_transport_errors() {
        let mut rng = generators::rng();
        let peer = generators::random_peer_id(&mut rng);
        let client = Arc::new(TestBlocksClient::default().with_failures(peer, 1));
        let fetcher = BlockFetcher::new(client, CancellationToken::new());

        let result = fetcher.fetch(peer, request(1, 8, 1)).await;
        assert_matches!(result, Err(DownloadError::Request(RequestError::Timeout)));
    }

    #[tokio::test]
    async fn cancelled_fetch_opens_no_stream() {
        let mut rng = generators::rng();
        let client = Arc::new(TestBlocksClient::default());
        let token = CancellationToken::new();
        let fetcher = BlockFetcher::new(Arc::clone(&client), token.clone());
        token.cancel();

        let peer = generators::random_peer_id(&mut rng);
        let result = fetcher.fetch(peer, request(1, 8, 1)).await;
        assert_matches!(result, Err(DownloadError::Cancelled));
        assert_eq!(client.times_requested(), 0);
    }
}
