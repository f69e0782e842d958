#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Initial block synchronization for the beacon node.
//!
//! At startup the node knows only its genesis (or a recent cold) state and
//! has to catch up to the live head by downloading signed blocks from a pool
//! of untrusted peers. [`RoundRobinSync`] drives that catch-up in two phases:
//!
//! 1. **To finality.** The peers advertising the highest common finalized
//!    checkpoint are asked for block batches, each batch striped across the
//!    peer set so that `k` peers cover contiguous slots without overlap. A
//!    failing peer's share is re-striped across the remaining peers.
//! 2. **To head.** Past the finalized epoch, blocks are fetched sequentially
//!    from the single peer advertising the highest head, up to the current
//!    wall-clock slot. Less adversarial care is needed here: anything that
//!    does not build on the finalized chain dies in fork choice.
//!
//! Blocks reach the chain processor strictly in ascending slot order; a block
//! whose parent is still unknown is skipped and picked up by a later batch.

mod config;
mod counter;
mod fetcher;
mod metrics;
mod parallel;
mod round_robin;
mod shard;

pub use config::SyncConfig;
pub use round_robin::{RoundRobinSync, SyncError};
