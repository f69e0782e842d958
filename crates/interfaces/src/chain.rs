use meridian_primitives::{SignedBeaconBlock, Slot};
use std::fmt::Debug;

/// Block import errors.
#[derive(Debug, thiserror::Error)]
pub enum BlockImportError {
    /// The block failed state transition or signature checks.
    #[error("block at slot {slot} rejected: {reason}")]
    Rejected {
        /// Slot of the rejected block.
        slot: Slot,
        /// Why the processor refused the block.
        reason: String,
    },
    /// The processor encountered an internal error.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

/// The state-transition and fork-choice engine downloaded blocks are fed
/// into.
///
/// Both import paths return once the block is fully committed; the caller is
/// the single writer and awaits each block before feeding the next.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait ChainProcessor: Send + Sync + Debug {
    /// Slot of the current head of the locally accepted chain.
    fn head_slot(&self) -> Slot;

    /// Processes and commits `block`, skipping only gossip republish and
    /// fork-choice propagation.
    async fn process_block(&self, block: SignedBeaconBlock) -> Result<(), BlockImportError>;

    /// Like [`ChainProcessor::process_block`], but also skips signature and
    /// state-transition verification. Only sound for slot ranges covered by
    /// an agreed finalized checkpoint.
    async fn process_block_no_verify(
        &self,
        block: SignedBeaconBlock,
    ) -> Result<(), BlockImportError>;
}
