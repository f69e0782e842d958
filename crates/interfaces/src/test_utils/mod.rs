//! Test helper impls for mocking out the rest of the node.

mod blocks_client;
mod chain;
pub mod generators;
mod peer_view;

pub use blocks_client::TestBlocksClient;
pub use chain::{TestBlockStore, TestChain};
pub use peer_view::TestPeerView;
