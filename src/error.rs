use std::collections::TryReserveError;

use crate::transport::{ChannelId, TransportError};

/// Errors that end a connection.
///
/// A busy send buffer is not in this list: the chunked sender absorbs it and
/// retries on the next send acknowledgment.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The request did not fit the parse buffer. The connection is aborted
    /// without a reply.
    #[error("request of {len} bytes exceeds the {limit} byte limit")]
    RequestTooLarge { len: usize, limit: usize },

    #[error("failed to allocate response buffer")]
    Allocation(#[from] TryReserveError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to encode response payload")]
    Encode(#[from] serde_json::Error),

    /// A callback arrived for a connection that is already closed.
    #[error("no open connection for channel {0}")]
    UnknownChannel(ChannelId),
}
