//! Chunked response sender.
//!
//! Streams a [`ConnectionState`] body through a send buffer whose free space
//! is only known by asking, and may be smaller than what is left to send.
//! [`pump`] writes at most one chunk per call and never waits: when the
//! buffer is full it flushes and hands control back, and the transport's next
//! send acknowledgment calls it again.
//!
//! ```text
//!   start ──▶ pump ──▶ chunk fits? ──no──▶ flush, Pending
//!              ▲            │yes
//!              │            ▼
//!        send-ack ◀── write, advance ──▶ complete? ──yes──▶ close, Done
//! ```

use tracing::{debug, trace, warn};

use crate::error::ServerError;
use crate::http::connection::ConnectionState;
use crate::transport::{Transport, WriteError};

/// Result of one [`pump`] call.
#[derive(Debug)]
pub enum Progress {
    /// More to send. Hand the state back to its connection and wait for the
    /// next send acknowledgment.
    Pending(ConnectionState),
    /// Body fully written; the channel is closed and the state released.
    Done,
}

/// Advances the transfer by at most one chunk of up to `chunk_cap` bytes.
///
/// On a hard transport error the channel is aborted, the state released and
/// the error returned. A full buffer or a transient out-of-memory from the
/// transport leaves the state untouched and yields `Pending`.
pub fn pump<T: Transport + ?Sized>(
    mut state: ConnectionState,
    transport: &mut T,
    chunk_cap: usize,
) -> Result<Progress, ServerError> {
    let channel = state.channel();

    if !state.has_body() {
        debug!(%channel, "no response body prepared, nothing to send");
        return Ok(Progress::Pending(state));
    }

    if state.is_complete() {
        state.release(transport);
        return Ok(Progress::Done);
    }

    let chunk_len = state.remaining().min(chunk_cap);
    let capacity = transport.writable_capacity(channel);

    if capacity < chunk_len {
        trace!(%channel, capacity, chunk_len, "send buffer full, waiting for ack");
        flush(transport, &state);
        return Ok(Progress::Pending(state));
    }

    match transport.write(channel, state.pending(chunk_len)) {
        Ok(()) => {
            state.advance(chunk_len);
            flush(transport, &state);
            trace!(
                %channel,
                len = chunk_len,
                sent = state.sent_len(),
                total = state.total_len(),
                "chunk written"
            );

            if state.is_complete() {
                debug!(%channel, total = state.total_len(), "last chunk written, closing");
                state.release(transport);
                return Ok(Progress::Done);
            }
            Ok(Progress::Pending(state))
        }
        Err(WriteError::WouldBlock) => {
            debug!(%channel, len = chunk_len, "transport out of memory, retrying on next ack");
            flush(transport, &state);
            Ok(Progress::Pending(state))
        }
        Err(WriteError::Transport(error)) => {
            warn!(%channel, %error, sent = state.sent_len(), "chunk write failed, aborting");
            state.abort(transport);
            Err(error.into())
        }
    }
}

fn flush<T: Transport + ?Sized>(transport: &mut T, state: &ConnectionState) {
    if let Err(error) = transport.flush(state.channel()) {
        warn!(channel = %state.channel(), %error, "flush failed");
    }
}
