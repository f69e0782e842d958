#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Commonly used types in meridian.
//!
//! This crate contains beacon chain primitive types and helper functions.

mod block;
mod chain_spec;
mod peer;
mod root;
mod slot_ticker;

pub use block::{BeaconBlock, Signature, SignedBeaconBlock, SIGNATURE_LENGTH};
pub use chain_spec::ChainSpec;
pub use peer::PeerId;
pub use root::{Root, ROOT_LENGTH};
pub use slot_ticker::SlotTicker;

/// A slot number: the index of a fixed-duration time slice since genesis.
pub type Slot = u64;

/// An epoch number: a group of consecutive slots and the unit of finality.
pub type Epoch = u64;
