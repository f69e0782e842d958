use crate::{
    chain::{BlockImportError, ChainProcessor},
    store::BlockStore,
};
use meridian_primitives::{Root, SignedBeaconBlock, Slot};
use parking_lot::Mutex;
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// An in-memory [`BlockStore`].
#[derive(Debug, Default)]
pub struct TestBlockStore {
    roots: Mutex<HashSet<Root>>,
}

impl TestBlockStore {
    /// Marks `root` as stored.
    pub fn insert(&self, root: Root) {
        self.roots.lock().insert(root);
    }
}

impl BlockStore for TestBlockStore {
    fn has_block(&self, root: &Root) -> bool {
        self.roots.lock().contains(root)
    }
}

/// A [`ChainProcessor`] that records applied blocks.
///
/// Applying a block advances the head to the block's slot and records the
/// block root in the shared store, the way the real processor persists while
/// committing.
#[derive(Debug)]
pub struct TestChain {
    head_slot: AtomicU64,
    store: Arc<TestBlockStore>,
    applied: Mutex<Vec<Slot>>,
    verified_applies: AtomicU64,
    unverified_applies: AtomicU64,
    reject_at: Mutex<Option<Slot>>,
}

impl TestChain {
    /// Creates a chain at `head_slot`, persisting into `store`.
    pub fn new(head_slot: Slot, store: Arc<TestBlockStore>) -> Self {
        Self {
            head_slot: AtomicU64::new(head_slot),
            store,
            applied: Default::default(),
            verified_applies: Default::default(),
            unverified_applies: Default::default(),
            reject_at: Default::default(),
        }
    }

    /// Scripts the processor to reject the block at `slot`.
    pub fn reject_at(&self, slot: Slot) {
        *self.reject_at.lock() = Some(slot);
    }

    /// Slots applied so far, in apply order.
    pub fn applied(&self) -> Vec<Slot> {
        self.applied.lock().clone()
    }

    /// Number of blocks imported through the verifying path.
    pub fn verified_applies(&self) -> u64 {
        self.verified_applies.load(Ordering::SeqCst)
    }

    /// Number of blocks imported through the no-verify path.
    pub fn unverified_applies(&self) -> u64 {
        self.unverified_applies.load(Ordering::SeqCst)
    }

    fn apply(&self, block: SignedBeaconBlock) -> Result<(), BlockImportError> {
        if self.reject_at.lock().is_some_and(|slot| slot == block.slot()) {
            return Err(BlockImportError::Rejected {
                slot: block.slot(),
                reason: "scripted rejection".into(),
            });
        }
        self.store.insert(block.canonical_root());
        self.head_slot.store(block.slot(), Ordering::SeqCst);
        self.applied.lock().push(block.slot());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChainProcessor for TestChain {
    fn head_slot(&self) -> Slot {
        self.head_slot.load(Ordering::SeqCst)
    }

    async fn process_block(&self, block: SignedBeaconBlock) -> Result<(), BlockImportError> {
        self.verified_applies.fetch_add(1, Ordering::SeqCst);
        self.apply(block)
    }

    async fn process_block_no_verify(
        &self,
        block: SignedBeaconBlock,
    ) -> Result<(), BlockImportError> {
        self.unverified_applies.fetch_add(1, Ordering::SeqCst);
        self.apply(block)
    }
}
