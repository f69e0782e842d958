use meridian_primitives::{Epoch, PeerId, Root, Slot};
use parking_lot::RwLock;
use std::{collections::HashMap, fmt::Debug};

/// Chain state advertised by one peer in its latest status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerChainState {
    /// The peer's head slot.
    pub head_slot: Slot,
    /// The peer's finalized checkpoint root.
    pub finalized_root: Root,
    /// The peer's finalized checkpoint epoch.
    pub finalized_epoch: Epoch,
}

/// The checkpoint shared by the best set of finalized peers.
///
/// Every peer in the list advertises finalized epoch at least `epoch` with
/// finalized root `root`. The list is empty when no peer qualified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FinalizedTarget {
    /// The agreed finalized root.
    pub root: Root,
    /// The agreed finalized epoch.
    pub epoch: Epoch,
    /// Peers advertising the checkpoint, in deterministic order.
    pub peers: Vec<PeerId>,
}

/// Read-only snapshot of the connected peer set. Never blocks.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait PeerView: Send + Sync + Debug {
    /// Returns up to `max_peers` peers sharing the finalized checkpoint with
    /// the highest epoch strictly greater than `min_epoch`, together with
    /// that checkpoint. Ties within the winning epoch go to the root most
    /// peers agree on.
    fn best_finalized(&self, max_peers: usize, min_epoch: Epoch) -> FinalizedTarget;

    /// The connected peer with the highest advertised head slot.
    fn best_head(&self) -> Option<PeerId>;

    /// Number of connected peers. Telemetry only.
    fn connected_count(&self) -> usize;
}

/// Status snapshots of the connected peers, with the checkpoint selection
/// rules of [`PeerView`].
///
/// The transport's status handler writes through [`PeerSet::update`] and
/// [`PeerSet::remove`]; the sync engine only reads.
#[derive(Debug, Default)]
pub struct PeerSet {
    states: RwLock<HashMap<PeerId, PeerChainState>>,
}

impl PeerSet {
    /// Records the latest status of `peer`.
    pub fn update(&self, peer: PeerId, state: PeerChainState) {
        self.states.write().insert(peer, state);
    }

    /// Forgets `peer`.
    pub fn remove(&self, peer: &PeerId) {
        self.states.write().remove(peer);
    }
}

impl PeerView for PeerSet {
    fn best_finalized(&self, max_peers: usize, min_epoch: Epoch) -> FinalizedTarget {
        let states = self.states.read();

        let Some(epoch) = states
            .values()
            .map(|state| state.finalized_epoch)
            .filter(|epoch| *epoch > min_epoch)
            .max()
        else {
            return FinalizedTarget::default();
        };

        // Majority root among the peers advertising the winning epoch.
        let mut votes: HashMap<Root, usize> = HashMap::new();
        for state in states.values().filter(|state| state.finalized_epoch == epoch) {
            *votes.entry(state.finalized_root).or_default() += 1;
        }
        let root = votes
            .into_iter()
            .max_by_key(|(root, count)| (*count, *root))
            .map(|(root, _)| root)
            .unwrap_or_default();

        let mut peers: Vec<PeerId> = states
            .iter()
            .filter(|(_, state)| {
                state.finalized_epoch >= epoch && state.finalized_root == root
            })
            .map(|(peer, _)| *peer)
            .collect();
        peers.sort_unstable();
        peers.truncate(max_peers);

        FinalizedTarget { root, epoch, peers }
    }

    fn best_head(&self) -> Option<PeerId> {
        self.states
            .read()
            .iter()
            .max_by_key(|(peer, state)| (state.head_slot, **peer))
            .map(|(peer, _)| *peer)
    }

    fn connected_count(&self) -> usize {
        self.states.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(head_slot: Slot, finalized_root: Root, finalized_epoch: Epoch) -> PeerChainState {
        PeerChainState { head_slot, finalized_root, finalized_epoch }
    }

    #[test]
    fn best_finalized_picks_highest_eligible_epoch() {
        let set = PeerSet::default();
        let root_a = Root::from_low_u64_be(0xa);
        let root_b = Root::from_low_u64_be(0xb);
        set.update(PeerId::from_low_u64_be(1), state(400, root_a, 10));
        set.update(PeerId::from_low_u64_be(2), state(420, root_b, 12));
        set.update(PeerId::from_low_u64_be(3), state(410, root_b, 12));

        let target = set.best_finalized(10, 0);
        assert_eq!(target.epoch, 12);
        assert_eq!(target.root, root_b);
        assert_eq!(
            target.peers,
            vec![PeerId::from_low_u64_be(2), PeerId::from_low_u64_be(3)]
        );
    }

    #[test]
    fn best_finalized_requires_epoch_strictly_above_local() {
        let set = PeerSet::default();
        set.update(PeerId::from_low_u64_be(1), state(400, Root::from_low_u64_be(0xa), 10));

        assert_eq!(set.best_finalized(10, 10), FinalizedTarget::default());
        assert_eq!(set.best_finalized(10, 9).epoch, 10);
    }

    #[test]
    fn best_finalized_breaks_epoch_ties_by_majority_root() {
        let set = PeerSet::default();
        let minority = Root::from_low_u64_be(0xa);
        let majority = Root::from_low_u64_be(0xb);
        set.update(PeerId::from_low_u64_be(1), state(400, minority, 12));
        set.update(PeerId::from_low_u64_be(2), state(400, majority, 12));
        set.update(PeerId::from_low_u64_be(3), state(400, majority, 12));

        let target = set.best_finalized(10, 0);
        assert_eq!(target.root, majority);
        assert_eq!(target.peers.len(), 2);
    }

    #[test]
    fn best_finalized_caps_peer_count() {
        let set = PeerSet::default();
        let root = Root::from_low_u64_be(0xa);
        for id in 1..=8 {
            set.update(PeerId::from_low_u64_be(id), state(400, root, 12));
        }

        let target = set.best_finalized(3, 0);
        assert_eq!(target.peers.len(), 3);
        // Deterministic: the lowest peer ids survive the cap.
        assert_eq!(target.peers[0], PeerId::from_low_u64_be(1));
    }

    #[test]
    fn best_head_is_deterministic_under_ties() {
        let set = PeerSet::default();
        let root = Root::from_low_u64_be(0xa);
        set.update(PeerId::from_low_u64_be(1), state(500, root, 10));
        set.update(PeerId::from_low_u64_be(2), state(500, root, 10));

        assert_eq!(set.best_head(), Some(PeerId::from_low_u64_be(2)));
        assert_eq!(set.connected_count(), 2);
    }

    #[test]
    fn empty_set_has_no_target_and_no_head() {
        let set = PeerSet::default();
        assert_eq!(set.best_finalized(10, 0), FinalizedTarget::default());
        assert_eq!(set.best_head(), None);
        assert_eq!(set.connected_count(), 0);
    }
}
