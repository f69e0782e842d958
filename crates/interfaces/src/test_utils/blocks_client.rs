use crate::p2p::{
    client::{BlockStream, BlocksByRangeClient, BlocksByRangeRequest},
    error::{RequestError, RequestResult},
};
use meridian_primitives::{BeaconBlock, PeerId, SignedBeaconBlock, Slot};
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// A scriptable [`BlocksByRangeClient`] backed by a canned canonical chain.
///
/// Every peer serves the same chain: a response contains the blocks present
/// at the requested slots, in slot order. Individual peers can be scripted
/// to fail their next requests with a transport error, or to answer every
/// request with an out-of-range block.
#[derive(Debug, Default)]
pub struct TestBlocksClient {
    blocks: HashMap<Slot, SignedBeaconBlock>,
    fail_next: Mutex<HashMap<PeerId, usize>>,
    rogue: HashSet<PeerId>,
    requests: Mutex<Vec<(PeerId, BlocksByRangeRequest)>>,
    times_requested: AtomicU64,
    delay: Option<Duration>,
}

impl TestBlocksClient {
    /// Uses `blocks` as the canonical chain served to every peer.
    pub fn with_blocks(mut self, blocks: impl IntoIterator<Item = SignedBeaconBlock>) -> Self {
        self.blocks = blocks.into_iter().map(|block| (block.slot(), block)).collect();
        self
    }

    /// Scripts `peer` to fail its next `failures` requests.
    pub fn with_failures(self, peer: PeerId, failures: usize) -> Self {
        self.fail_next.lock().insert(peer, failures);
        self
    }

    /// Scripts `peer` to answer every request with one out-of-range block.
    pub fn with_rogue(mut self, peer: PeerId) -> Self {
        self.rogue.insert(peer);
        self
    }

    /// Delays every response, so tests can interleave cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of streams opened so far.
    pub fn times_requested(&self) -> u64 {
        self.times_requested.load(Ordering::SeqCst)
    }

    /// All requests issued so far, in issue order.
    pub fn requests(&self) -> Vec<(PeerId, BlocksByRangeRequest)> {
        self.requests.lock().clone()
    }

    fn response_for(&self, request: &BlocksByRangeRequest) -> Vec<SignedBeaconBlock> {
        let mut response = Vec::new();
        let mut slot = request.start_slot;
        for _ in 0..request.count {
            if let Some(block) = self.blocks.get(&slot) {
                response.push(block.clone());
            }
            slot = match slot.checked_add(request.step) {
                Some(next) => next,
                None => break,
            };
        }
        response
    }
}

#[async_trait::async_trait]
impl BlocksByRangeClient for TestBlocksClient {
    async fn open_blocks_stream(
        &self,
        peer: PeerId,
        request: BlocksByRangeRequest,
    ) -> RequestResult<BlockStream> {
        self.times_requested.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((peer, request.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut fail_next = self.fail_next.lock();
            if let Some(remaining) = fail_next.get_mut(&peer) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(RequestError::Timeout);
                }
            }
        }

        if self.rogue.contains(&peer) {
            let block = SignedBeaconBlock {
                block: BeaconBlock { slot: request.end_slot() + 1, ..Default::default() },
                ..Default::default()
            };
            let frames: Vec<RequestResult<SignedBeaconBlock>> = vec![Ok(block)];
            return Ok(Box::pin(futures::stream::iter(frames)));
        }

        let frames: Vec<RequestResult<SignedBeaconBlock>> =
            self.response_for(&request).into_iter().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(frames)))
    }
}
