use crate::{Root, Slot};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a block signature in bytes.
pub const SIGNATURE_LENGTH: usize = 96;

/// An opaque proposer signature.
///
/// Verification is the chain processor's concern; sync only carries the bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// The all-zero placeholder signature.
    pub const fn empty() -> Self {
        Self([0; SIGNATURE_LENGTH])
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<[u8; SIGNATURE_LENGTH]> for Signature {
    fn from(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{}..)", hex::encode(&self.0[..4]))
    }
}

/// A beacon block as carried during sync.
///
/// Everything past the header fields is an opaque payload; decoding it is the
/// transport's concern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BeaconBlock {
    /// Slot the block was proposed for. The ordering key during sync.
    pub slot: Slot,
    /// Root of the parent block.
    pub parent_root: Root,
    /// Root of the post-state of this block.
    pub state_root: Root,
    /// Opaque body payload.
    pub body: Vec<u8>,
}

impl BeaconBlock {
    /// Computes the canonical root identifying this block.
    pub fn canonical_root(&self) -> Root {
        let mut hasher = Sha256::new();
        hasher.update(self.slot.to_le_bytes());
        hasher.update(self.parent_root.as_bytes());
        hasher.update(self.state_root.as_bytes());
        hasher.update(&self.body);
        let digest: [u8; 32] = hasher.finalize().into();
        Root::from(digest)
    }
}

/// A signed beacon block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignedBeaconBlock {
    /// The unsigned block.
    pub block: BeaconBlock,
    /// Proposer signature over the block root.
    pub signature: Signature,
}

impl SignedBeaconBlock {
    /// Slot of the inner block.
    pub fn slot(&self) -> Slot {
        self.block.slot
    }

    /// Parent root of the inner block.
    pub fn parent_root(&self) -> Root {
        self.block.parent_root
    }

    /// Canonical root of the inner block.
    pub fn canonical_root(&self) -> Root {
        self.block.canonical_root()
    }
}
