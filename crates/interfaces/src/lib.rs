#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Meridian interface bindings.
//!
//! The sync engine reaches the rest of the node exclusively through the
//! traits in this crate: the chain processor, the block database, and the
//! p2p layer's request client and peer registry snapshots.

/// Chain processing traits.
pub mod chain;

/// P2P traits and wire types.
pub mod p2p;

/// Block storage traits.
pub mod store;

/// Common test helpers for mocking out the node.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
