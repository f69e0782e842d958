use super::error::RequestResult;
use futures::Stream;
use meridian_primitives::{PeerId, Root, SignedBeaconBlock, Slot};
use std::{fmt::Debug, pin::Pin};

/// A `BlocksByRange` request as it appears on the wire.
///
/// The response is a length-prefixed stream of signed block frames whose
/// slots are members of the arithmetic progression
/// `start_slot, start_slot + step, ..` of length `count`, terminated by end
/// of stream. A peer may answer with fewer blocks (skipped slots,
/// truncation) but never with out-of-range slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlocksByRangeRequest {
    /// Root the requested range is anchored to.
    pub head_block_root: Root,
    /// First requested slot.
    pub start_slot: Slot,
    /// Number of requested slots, at least 1.
    pub count: u64,
    /// Distance between requested slots, at least 1.
    pub step: u64,
}

impl BlocksByRangeRequest {
    /// One past the last slot this request can return.
    pub fn end_slot(&self) -> Slot {
        self.start_slot.saturating_add(self.count.saturating_mul(self.step.max(1)))
    }

    /// Whether `slot` is a member of the requested progression.
    pub fn contains_slot(&self, slot: Slot) -> bool {
        slot >= self.start_slot
            && slot < self.end_slot()
            && (slot - self.start_slot) % self.step.max(1) == 0
    }
}

/// A stream of signed block frames from one peer.
pub type BlockStream = Pin<Box<dyn Stream<Item = RequestResult<SignedBeaconBlock>> + Send>>;

/// The client used to issue `BlocksByRange` requests.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait BlocksByRangeClient: Send + Sync + Debug {
    /// Opens a response stream for `request` against `peer`.
    ///
    /// The transport owns framing and decoding; the stream yields blocks in
    /// the order the peer sent them and finishes at end-of-stream. Dropping
    /// the stream closes it.
    async fn open_blocks_stream(
        &self,
        peer: PeerId,
        request: BlocksByRangeRequest,
    ) -> RequestResult<BlockStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_only_progression_members() {
        let request = BlocksByRangeRequest {
            head_block_root: Root::ZERO,
            start_slot: 10,
            count: 3,
            step: 4,
        };
        for slot in [10, 14, 18] {
            assert!(request.contains_slot(slot), "slot {slot}");
        }
        for slot in [9, 11, 12, 22, 26] {
            assert!(!request.contains_slot(slot), "slot {slot}");
        }
        assert_eq!(request.end_slot(), 22);
    }
}
