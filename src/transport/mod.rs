//! Transport seam between the connection core and the network stack.
//!
//! The core never touches sockets directly. Everything it needs from the
//! network is expressed through the [`Transport`] trait: a non-blocking write
//! into a bounded send buffer, a query of how much of that buffer is free,
//! and the close/abort primitives. Inbound traffic is delivered the other way
//! round, as events the adapter hands to [`crate::server::Server`].
//!
//! [`SocketTransport`] is the tokio-backed adapter used by the binary; tests
//! drive the core with their own recording implementation.

pub mod socket;

use std::fmt;
use std::io;

pub use socket::{Event, SocketTransport};

/// Opaque handle for one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hard failures reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection reset by peer")]
    Reset,
    #[error("connection aborted")]
    Aborted,
    #[error("channel is not connected")]
    NotConnected,
    #[error("channel already closed")]
    Closed,
    #[error("i/o error: {0}")]
    Io(io::ErrorKind),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionReset => TransportError::Reset,
            io::ErrorKind::ConnectionAborted => TransportError::Aborted,
            io::ErrorKind::NotConnected => TransportError::NotConnected,
            kind => TransportError::Io(kind),
        }
    }
}

/// Outcome of a rejected [`Transport::write`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// The adapter cannot take the bytes right now. Retry after the next
    /// send acknowledgment.
    #[error("send buffer exhausted")]
    WouldBlock,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Network primitives the connection core consumes.
///
/// All methods are non-blocking. Implementations must treat every operation
/// on an unknown or already-closed channel as harmless.
pub trait Transport {
    /// Copies `data` into the channel's send buffer.
    fn write(&mut self, channel: ChannelId, data: &[u8]) -> Result<(), WriteError>;

    /// Pushes buffered bytes towards the peer.
    fn flush(&mut self, channel: ChannelId) -> Result<(), TransportError>;

    /// Bytes that a `write` could accept right now.
    fn writable_capacity(&self, channel: ChannelId) -> usize;

    /// Acknowledges `len` inbound bytes as consumed.
    fn consume(&mut self, channel: ChannelId, len: usize);

    /// Detaches every callback registered for the channel.
    fn unregister(&mut self, channel: ChannelId);

    /// Graceful close; data already written still drains.
    fn close(&mut self, channel: ChannelId) -> Result<(), TransportError>;

    /// Hard close. Idempotent.
    fn abort(&mut self, channel: ChannelId);
}

/// Standard closing sequence: detach callbacks first, then close, falling
/// back to an abort when the graceful close is refused.
pub fn shutdown<T: Transport + ?Sized>(transport: &mut T, channel: ChannelId) {
    transport.unregister(channel);
    if let Err(error) = transport.close(channel) {
        tracing::warn!(%channel, %error, "close failed, aborting");
        transport.abort(channel);
    }
}

/// Closing sequence for error paths: detach callbacks, then abort.
pub fn teardown<T: Transport + ?Sized>(transport: &mut T, channel: ChannelId) {
    transport.unregister(channel);
    transport.abort(channel);
}
