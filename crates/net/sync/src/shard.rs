use meridian_interfaces::p2p::{
    client::BlocksByRangeRequest,
    error::{DownloadError, DownloadResult},
};
use meridian_primitives::{PeerId, Root, Slot};

/// Inputs of one sharded block-range batch.
#[derive(Debug, Clone)]
pub(crate) struct ShardParams<'a> {
    /// First slot of the batch, before the empty-round shift.
    pub(crate) start: Slot,
    /// Stride between the batch's slots, as seen by the caller.
    pub(crate) step: u64,
    /// Slots assigned to each peer.
    pub(crate) count: u64,
    /// Peers the batch is striped across.
    pub(crate) peers: &'a [PeerId],
    /// Number of leading peers that absorb one extra slot when the caller
    /// divided a range by the peer count with a remainder.
    pub(crate) remainder: usize,
    /// Consecutive empty batches seen so far; shifts the start past long
    /// stretches of skipped slots.
    pub(crate) empty_rounds: u64,
    /// Root the requests are anchored to.
    pub(crate) head_block_root: Root,
    /// First slot past the agreed finalized epoch.
    pub(crate) ceiling: Slot,
}

/// Stripes a slot range across peers with a stride of `peers.len()`, so the
/// union of the per-peer progressions covers the range without overlap.
///
/// With peers `p0..p3` and a batch starting at 64, `p0` is asked for slots
/// 64, 68, 72, .. while `p1` is asked for 65, 69, 73, .. and so on.
pub(crate) fn shard_range(
    params: ShardParams<'_>,
) -> DownloadResult<Vec<(PeerId, BlocksByRangeRequest)>> {
    let ShardParams {
        mut start,
        mut step,
        count,
        peers,
        remainder,
        empty_rounds,
        head_block_root,
        ceiling,
    } = params;

    if peers.is_empty() {
        return Err(DownloadError::NoPeers);
    }

    // Skip past ranges where the previous attempts returned nothing.
    start = start.saturating_add(
        count.saturating_mul(empty_rounds).saturating_mul(peers.len() as u64),
    );

    // Stop a runaway loop fed by bogus peer data.
    if start > ceiling {
        return Err(DownloadError::BeyondFinalized { start, ceiling });
    }

    // A single-slot batch cannot stride.
    if count <= 1 {
        step = 1;
    }

    let mut requests = Vec::with_capacity(peers.len());
    for (i, peer) in peers.iter().enumerate() {
        let peer_start = start + i as u64 * step;
        let peer_step = step * peers.len() as u64;
        // Truncate at the finalized ceiling. A shard that starts past the
        // ceiling saturates to zero and degenerates into the forced
        // single-block request below.
        let mut peer_count = count.min(ceiling.saturating_sub(peer_start) / peer_step);
        if i < remainder {
            peer_count += 1;
        }
        // Zero-count requests are forbidden on the wire and can hang remote
        // implementations.
        if peer_count == 0 {
            peer_count = 1;
        }
        requests.push((
            *peer,
            BlocksByRangeRequest {
                head_block_root,
                start_slot: peer_start,
                count: peer_count,
                step: peer_step,
            },
        ));
    }

    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::BTreeSet;

    const FAR_CEILING: Slot = 1 << 32;

    fn peers(count: u64) -> Vec<PeerId> {
        (1..=count).map(PeerId::from_low_u64_be).collect()
    }

    fn params(peers: &[PeerId]) -> ShardParams<'_> {
        ShardParams {
            start: 1,
            step: 1,
            count: 64,
            peers,
            remainder: 0,
            empty_rounds: 0,
            head_block_root: Root::ZERO,
            ceiling: FAR_CEILING,
        }
    }

    /// Expands a request into the slots it asks for.
    fn slots_of(request: &BlocksByRangeRequest) -> Vec<Slot> {
        (0..request.count).map(|i| request.start_slot + i * request.step).collect()
    }

    #[test]
    fn stripes_cover_range_without_overlap() {
        let peers = peers(4);
        let requests = shard_range(ShardParams { start: 100, count: 16, ..params(&peers) }).unwrap();

        let mut seen = BTreeSet::new();
        for (_, request) in &requests {
            assert_eq!(request.step, 4);
            for slot in slots_of(request) {
                assert!(seen.insert(slot), "slot {slot} requested twice");
            }
        }
        assert_eq!(seen, (100..164).collect::<BTreeSet<_>>());
    }

    #[test]
    fn remainder_goes_to_leading_shards() {
        let peers = peers(4);
        let requests =
            shard_range(ShardParams { count: 10, remainder: 2, ..params(&peers) }).unwrap();

        let counts: Vec<u64> = requests.iter().map(|(_, request)| request.count).collect();
        assert_eq!(counts, vec![11, 11, 10, 10]);

        let mut seen = BTreeSet::new();
        for (_, request) in &requests {
            for slot in slots_of(request) {
                assert!(seen.insert(slot), "slot {slot} requested twice");
            }
        }
    }

    #[test]
    fn empty_rounds_shift_the_start() {
        let peers = peers(4);
        let requests =
            shard_range(ShardParams { empty_rounds: 2, ..params(&peers) }).unwrap();

        // 1 + 64 * 2 * 4 slots skipped.
        assert_eq!(requests[0].1.start_slot, 513);
        assert_eq!(requests[1].1.start_slot, 514);
    }

    #[test]
    fn start_past_ceiling_is_an_error() {
        let peers = peers(4);
        let result = shard_range(ShardParams { start: 353, ceiling: 352, ..params(&peers) });
        assert_matches!(
            result,
            Err(DownloadError::BeyondFinalized { start: 353, ceiling: 352 })
        );
    }

    #[test]
    fn counts_truncate_at_ceiling() {
        let peers = peers(2);
        let requests =
            shard_range(ShardParams { start: 100, ceiling: 110, ..params(&peers) }).unwrap();

        for (_, request) in &requests {
            assert!(request.count >= 1);
            for slot in slots_of(request) {
                assert!(slot < 110, "slot {slot} past the ceiling");
            }
        }
    }

    #[test]
    fn shard_at_ceiling_degenerates_to_single_block() {
        let peers = peers(2);
        let requests =
            shard_range(ShardParams { start: 352, ceiling: 352, ..params(&peers) }).unwrap();

        // Both shards saturate to zero and get bumped to the one-block
        // minimum the protocol requires.
        assert_eq!(requests[0].1.count, 1);
        assert_eq!(requests[1].1.count, 1);
    }

    #[test]
    fn single_slot_batch_forces_unit_step() {
        let peers = peers(3);
        let requests =
            shard_range(ShardParams { count: 1, step: 7, ..params(&peers) }).unwrap();

        assert_eq!(requests[0].1.start_slot, 1);
        assert_eq!(requests[1].1.start_slot, 2);
        assert_eq!(requests[2].1.start_slot, 3);
        for (_, request) in &requests {
            assert_eq!(request.step, 3);
        }
    }

    #[test]
    fn no_peers_is_an_error() {
        assert_matches!(shard_range(params(&[])), Err(DownloadError::NoPeers));
    }
}
