/// Block-range request client.
pub mod client;

/// Request and download error types.
pub mod error;

/// Peer registry snapshots.
pub mod peers;
