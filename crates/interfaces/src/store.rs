use meridian_primitives::Root;
use std::fmt::Debug;

/// Read access to the block database.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait BlockStore: Send + Sync + Debug {
    /// Whether a block with canonical root `root` has been stored.
    fn has_block(&self, root: &Root) -> bool;
}
