//! Tokio socket adapter.
//!
//! Every accepted stream is split into a reader task and a writer task. The
//! tasks never call into the server: they only push [`Event`]s into one
//! queue, and the event loop in [`crate::server::listener`] drains that
//! queue on a single flow of control.
//!
//! Writable capacity is modeled the way an embedded TCP stack exposes it: a
//! fixed per-connection send buffer, minus bytes staged by `write` and bytes
//! handed to the writer task that the kernel has not taken yet.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{ChannelId, Transport, TransportError, WriteError};

/// Spare room offered to each socket read. Larger than any request the
/// server accepts, so oversized requests arrive whole and can be rejected.
pub const READ_BUFFER_SIZE: usize = 2048;

/// Notifications produced by the socket tasks.
#[derive(Debug)]
pub enum Event {
    /// Inbound bytes; `None` means the peer closed its side.
    Received {
        channel: ChannelId,
        data: Option<Bytes>,
    },
    /// `len` previously flushed bytes left the local buffer.
    Sent { channel: ChannelId, len: usize },
    /// The socket failed; the channel is unusable.
    Failed {
        channel: ChannelId,
        error: TransportError,
    },
}

enum Outbound {
    Data(Bytes),
    Close,
}

struct Channel {
    staged: BytesMut,
    in_flight: usize,
    registered: bool,
    outbound: mpsc::UnboundedSender<Outbound>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Channel {
    fn push_staged(&mut self) -> Result<(), TransportError> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let bytes = self.staged.split().freeze();
        self.in_flight += bytes.len();
        self.outbound
            .send(Outbound::Data(bytes))
            .map_err(|_| TransportError::Closed)
    }
}

pub struct SocketTransport {
    channels: HashMap<ChannelId, Channel>,
    events: mpsc::UnboundedSender<Event>,
    send_buffer: usize,
    next_id: u64,
}

impl SocketTransport {
    pub fn new(events: mpsc::UnboundedSender<Event>, send_buffer: usize) -> Self {
        Self {
            channels: HashMap::new(),
            events,
            send_buffer,
            next_id: 1,
        }
    }

    /// Takes ownership of an accepted stream and starts its socket tasks.
    pub fn attach(&mut self, stream: TcpStream) -> ChannelId {
        let channel = ChannelId(self.next_id);
        self.next_id += 1;

        if let Err(err) = stream.set_nodelay(true) {
            trace!(%channel, error = %err, "failed to set TCP_NODELAY");
        }

        let (read_half, write_half) = stream.into_split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(channel, read_half, self.events.clone()));
        let writer = tokio::spawn(write_loop(
            channel,
            write_half,
            outbound_rx,
            self.events.clone(),
        ));

        self.channels.insert(
            channel,
            Channel {
                staged: BytesMut::with_capacity(self.send_buffer),
                in_flight: 0,
                registered: true,
                outbound,
                reader,
                writer,
            },
        );

        channel
    }

    /// Whether events for `channel` should still reach the server.
    pub fn is_registered(&self, channel: ChannelId) -> bool {
        self.channels
            .get(&channel)
            .map(|c| c.registered)
            .unwrap_or(false)
    }

    /// Returns `len` acknowledged bytes to the channel's send buffer.
    ///
    /// Returns `true` when the acknowledgment should be forwarded.
    pub fn settle(&mut self, channel: ChannelId, len: usize) -> bool {
        match self.channels.get_mut(&channel) {
            Some(state) => {
                state.in_flight = state.in_flight.saturating_sub(len);
                state.registered
            }
            None => false,
        }
    }

    pub fn open_channels(&self) -> usize {
        self.channels.len()
    }
}

impl Transport for SocketTransport {
    fn write(&mut self, channel: ChannelId, data: &[u8]) -> Result<(), WriteError> {
        let Some(state) = self.channels.get_mut(&channel) else {
            return Err(TransportError::NotConnected.into());
        };

        let free = self
            .send_buffer
            .saturating_sub(state.staged.len() + state.in_flight);
        if data.len() > free {
            return Err(WriteError::WouldBlock);
        }

        state.staged.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self, channel: ChannelId) -> Result<(), TransportError> {
        self.channels
            .get_mut(&channel)
            .ok_or(TransportError::NotConnected)?
            .push_staged()
    }

    fn writable_capacity(&self, channel: ChannelId) -> usize {
        self.channels
            .get(&channel)
            .map(|c| self.send_buffer.saturating_sub(c.staged.len() + c.in_flight))
            .unwrap_or(0)
    }

    fn consume(&mut self, channel: ChannelId, len: usize) {
        // the kernel manages the receive window
        trace!(%channel, len, "inbound bytes consumed");
    }

    fn unregister(&mut self, channel: ChannelId) {
        if let Some(state) = self.channels.get_mut(&channel) {
            state.registered = false;
        }
    }

    fn close(&mut self, channel: ChannelId) -> Result<(), TransportError> {
        let mut state = self
            .channels
            .remove(&channel)
            .ok_or(TransportError::NotConnected)?;
        state.reader.abort();

        let closing = state
            .push_staged()
            .and_then(|()| {
                state
                    .outbound
                    .send(Outbound::Close)
                    .map_err(|_| TransportError::Closed)
            });
        if closing.is_err() {
            state.writer.abort();
        }

        debug!(%channel, "channel closed");
        closing
    }

    fn abort(&mut self, channel: ChannelId) {
        if let Some(state) = self.channels.remove(&channel) {
            state.reader.abort();
            state.writer.abort();
            debug!(%channel, "channel aborted");
        }
    }
}

async fn read_loop(
    channel: ChannelId,
    mut stream: OwnedReadHalf,
    events: mpsc::UnboundedSender<Event>,
) {
    let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);

    loop {
        buf.reserve(READ_BUFFER_SIZE);
        match stream.read_buf(&mut buf).await {
            Ok(0) => {
                let _ = events.send(Event::Received { channel, data: None });
                break;
            }
            Ok(_) => {
                let data = Some(buf.split().freeze());
                if events.send(Event::Received { channel, data }).is_err() {
                    break;
                }
            }
            Err(err) => {
                let _ = events.send(Event::Failed {
                    channel,
                    error: err.into(),
                });
                break;
            }
        }
    }
}

async fn write_loop(
    channel: ChannelId,
    mut stream: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<Event>,
) {
    while let Some(message) = outbound.recv().await {
        match message {
            Outbound::Data(bytes) => {
                let len = bytes.len();
                if let Err(err) = stream.write_all(&bytes).await {
                    let _ = events.send(Event::Failed {
                        channel,
                        error: err.into(),
                    });
                    return;
                }
                let _ = events.send(Event::Sent { channel, len });
            }
            Outbound::Close => break,
        }
    }

    if let Err(err) = stream.shutdown().await {
        trace!(%channel, error = %err, "shutdown after close failed");
    }
}
