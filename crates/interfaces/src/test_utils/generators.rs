//! Deterministic test data generators.

use meridian_primitives::{BeaconBlock, PeerId, Root, SignedBeaconBlock, Slot};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Returns the shared deterministic rng for tests.
pub fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(0)
}

/// Generates a random root.
pub fn random_root(rng: &mut ChaCha8Rng) -> Root {
    Root::from(rng.gen::<[u8; 32]>())
}

/// Generates a random peer id.
pub fn random_peer_id(rng: &mut ChaCha8Rng) -> PeerId {
    PeerId::from(rng.gen::<[u8; 32]>())
}

/// Generates `count` random peer ids.
pub fn random_peers(rng: &mut ChaCha8Rng, count: usize) -> Vec<PeerId> {
    (0..count).map(|_| random_peer_id(rng)).collect()
}

/// Generates a chain of signed blocks covering `slots` in order, each block
/// linking to the previous one and the first linking to `parent_root`.
pub fn linked_block_range(
    rng: &mut ChaCha8Rng,
    slots: impl IntoIterator<Item = Slot>,
    parent_root: Root,
) -> Vec<SignedBeaconBlock> {
    let mut parent_root = parent_root;
    let mut blocks = Vec::new();
    for slot in slots {
        let block = BeaconBlock {
            slot,
            parent_root,
            state_root: random_root(rng),
            body: rng.gen::<[u8; 8]>().to_vec(),
        };
        parent_root = block.canonical_root();
        blocks.push(SignedBeaconBlock { block, signature: Default::default() });
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linked_blocks_form_a_chain() {
        let mut rng = rng();
        let genesis_root = random_root(&mut rng);
        let blocks = linked_block_range(&mut rng, 1..=5, genesis_root);

        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0].parent_root(), genesis_root);
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].parent_root(), pair[0].canonical_root());
        }
    }
}
