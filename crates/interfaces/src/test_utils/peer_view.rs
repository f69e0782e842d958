use crate::p2p::peers::{FinalizedTarget, PeerChainState, PeerSet, PeerView};
use meridian_primitives::{Epoch, PeerId};
use parking_lot::Mutex;

/// A [`PeerView`] over a scriptable [`PeerSet`].
///
/// [`TestPeerView::force_finalized`] bypasses the selection rules, modeling a
/// racy registry that keeps advertising a stale target.
#[derive(Debug, Default)]
pub struct TestPeerView {
    set: PeerSet,
    forced: Mutex<Option<FinalizedTarget>>,
}

impl TestPeerView {
    /// Records the latest status of `peer`.
    pub fn update(&self, peer: PeerId, state: PeerChainState) {
        self.set.update(peer, state);
    }

    /// Makes `best_finalized` return `target` regardless of the local epoch.
    pub fn force_finalized(&self, target: FinalizedTarget) {
        *self.forced.lock() = Some(target);
    }
}

impl PeerView for TestPeerView {
    fn best_finalized(&self, max_peers: usize, min_epoch: Epoch) -> FinalizedTarget {
        if let Some(target) = self.forced.lock().clone() {
            return target;
        }
        self.set.best_finalized(max_peers, min_epoch)
    }

    fn best_head(&self) -> Option<PeerId> {
        self.set.best_head()
    }

    fn connected_count(&self) -> usize {
        self.set.connected_count()
    }
}
