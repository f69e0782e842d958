use std::fmt;

const PEER_ID_LENGTH: usize = 32;

/// An opaque network identifier for a remote peer.
///
/// Carries no chain state. Equality and ordering are byte-wise; the ordering
/// only exists so peer lists can be made deterministic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PeerId([u8; PEER_ID_LENGTH]);

impl PeerId {
    /// Creates a peer id with `value` in the lowest 8 bytes, big endian.
    pub fn from_low_u64_be(value: u64) -> Self {
        let mut bytes = [0; PEER_ID_LENGTH];
        bytes[PEER_ID_LENGTH - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; PEER_ID_LENGTH] {
        &self.0
    }
}

impl From<[u8; PEER_ID_LENGTH]> for PeerId {
    fn from(bytes: [u8; PEER_ID_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
