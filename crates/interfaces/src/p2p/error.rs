use meridian_primitives::{PeerId, Slot};
use tokio::sync::{mpsc, oneshot};

/// Result alias for one request against one peer.
pub type RequestResult<T> = Result<T, RequestError>;

/// Error variants that can happen when sending requests to a peer session.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Closed channel to the peer.
    #[error("closed channel to the peer")]
    ChannelClosed,
    /// Not connected to the peer.
    #[error("not connected to the peer")]
    NotConnected,
    /// Connection to the peer dropped while handling the request.
    #[error("connection to the peer dropped while handling the request")]
    ConnectionDropped,
    /// Request timed out while awaiting the response.
    #[error("request timed out while awaiting response")]
    Timeout,
    /// Received a frame that could not be decoded.
    #[error("received bad response")]
    BadResponse,
}

impl<T> From<mpsc::error::SendError<T>> for RequestError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        RequestError::ChannelClosed
    }
}

impl From<oneshot::error::RecvError> for RequestError {
    fn from(_: oneshot::error::RecvError) -> Self {
        RequestError::ChannelClosed
    }
}

/// Result alias for a download operation.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Error variants of the block-range download pipeline.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// No peers available to request blocks from.
    #[error("no peers available to request blocks")]
    NoPeers,
    /// A peer answered with a block outside the requested slot range.
    #[error("peer {peer} returned block at slot {slot}, outside the requested range {start}..{end}")]
    OutOfRangeBlock {
        /// The peer that violated the request bounds.
        peer: PeerId,
        /// Slot of the offending block.
        slot: Slot,
        /// First requested slot.
        start: Slot,
        /// One past the last requestable slot.
        end: Slot,
    },
    /// A requested start slot lies past the agreed finalized ceiling.
    #[error("requested start slot {start} is past the finalized ceiling {ceiling}")]
    BeyondFinalized {
        /// The requested start slot.
        start: Slot,
        /// First slot past the finalized epoch.
        ceiling: Slot,
    },
    /// The download was cancelled from outside.
    #[error("download cancelled")]
    Cancelled,
    /// Transport-level failure against one peer.
    #[error(transparent)]
    Request(#[from] RequestError),
}
