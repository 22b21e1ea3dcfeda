use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::Limits;
use crate::error::ServerError;
use crate::http::connection::{Body, ConnectionState};
use crate::http::page;
use crate::http::parser::parse_request_line;
use crate::http::router::{self, Route};
use crate::http::sender::{self, Progress};
use crate::sensors::Sensors;
use crate::transport::{self, ChannelId, Transport, TransportError};

/// Where a connection is in its lifecycle.
///
/// `Closed` is never stored: a closed connection has no entry at all, which
/// is what [`Server::phase`] reports it as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Accepted,
    Receiving,
    Responding,
    Closed,
}

struct Connection {
    channel: ChannelId,
    phase: Phase,
    peer: Option<SocketAddr>,
    state: Option<ConnectionState>,
    last_activity: Instant,
}

impl Connection {
    fn close<T: Transport + ?Sized>(self, transport: &mut T) {
        match self.state {
            Some(state) => state.release(transport),
            None => transport::shutdown(transport, self.channel),
        }
    }

    fn abort<T: Transport + ?Sized>(self, transport: &mut T) {
        match self.state {
            Some(state) => state.abort(transport),
            None => transport::teardown(transport, self.channel),
        }
    }
}

/// Connection lifecycle manager.
///
/// Owns the transport, the sensor collaborator and one record per open
/// connection. Every transport notification enters through one of the
/// `on_*` methods; a connection is closed by removing its record, so the
/// record and its [`ConnectionState`] are released exactly once.
pub struct Server<T, S> {
    transport: T,
    sensors: S,
    limits: Limits,
    connections: HashMap<ChannelId, Connection>,
}

impl<T: Transport, S: Sensors> Server<T, S> {
    pub fn new(transport: T, sensors: S, limits: Limits) -> Self {
        Self {
            transport,
            sensors,
            limits,
            connections: HashMap::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn phase(&self, channel: ChannelId) -> Phase {
        self.connections
            .get(&channel)
            .map(|c| c.phase)
            .unwrap_or(Phase::Closed)
    }

    /// Send progress of the connection's chunked response, as
    /// `(sent_len, total_len)`.
    pub fn progress(&self, channel: ChannelId) -> Option<(usize, usize)> {
        self.connections
            .get(&channel)
            .and_then(|c| c.state.as_ref())
            .map(|s| (s.sent_len(), s.total_len()))
    }

    /// A new connection was accepted.
    pub fn on_accept(&mut self, channel: ChannelId, peer: Option<SocketAddr>) {
        match peer {
            Some(peer) => info!(%channel, %peer, "accepted connection"),
            None => info!(%channel, "accepted connection"),
        }

        let previous = self.connections.insert(
            channel,
            Connection {
                channel,
                phase: Phase::Accepted,
                peer,
                state: None,
                last_activity: Instant::now(),
            },
        );
        if previous.is_some() {
            warn!(%channel, "channel id reused while still open");
        }
    }

    /// Inbound bytes arrived. `None` means the peer closed its side.
    pub fn on_receive(&mut self, channel: ChannelId, data: Option<&[u8]>) -> Result<(), ServerError> {
        if !self.connections.contains_key(&channel) {
            if let Some(data) = data {
                self.transport.consume(channel, data.len());
            }
            return Err(ServerError::UnknownChannel(channel));
        }

        let Some(data) = data else {
            info!(%channel, "peer closed connection");
            self.close(channel);
            return Ok(());
        };

        self.transport.consume(channel, data.len());

        if data.len() >= self.limits.max_request_len {
            warn!(
                %channel,
                len = data.len(),
                limit = self.limits.max_request_len,
                "request too large, aborting"
            );
            self.abort(channel);
            return Err(ServerError::RequestTooLarge {
                len: data.len(),
                limit: self.limits.max_request_len,
            });
        }

        if let Some(conn) = self.connections.get_mut(&channel) {
            conn.phase = Phase::Receiving;
            conn.last_activity = Instant::now();
        }

        match parse_request_line(data) {
            Ok(line) => info!(%channel, method = %line.method, path = %line.path, "request"),
            Err(err) => debug!(%channel, error = ?err, "unparseable request line"),
        }

        let route = router::resolve(data);
        debug!(%channel, ?route, "route selected");

        if route.is_chunked() {
            self.start_page(channel)
        } else {
            self.reply_and_close(channel, route)
        }
    }

    /// Previously written bytes were acknowledged; continue any chunked
    /// transfer.
    pub fn on_send_ack(&mut self, channel: ChannelId, len: usize) -> Result<(), ServerError> {
        let Some(conn) = self.connections.get_mut(&channel) else {
            debug!(%channel, len, "send ack for closed connection ignored");
            return Err(ServerError::UnknownChannel(channel));
        };
        conn.last_activity = Instant::now();

        let Some(state) = conn.state.take() else {
            return Ok(());
        };

        match sender::pump(state, &mut self.transport, self.limits.chunk_size) {
            Ok(Progress::Pending(state)) => {
                conn.state = Some(state);
                Ok(())
            }
            Ok(Progress::Done) => {
                self.connections.remove(&channel);
                Ok(())
            }
            Err(err) => {
                self.connections.remove(&channel);
                Err(err)
            }
        }
    }

    /// The transport reported a hard error. The connection is torn down from
    /// whatever phase it was in.
    pub fn on_error(&mut self, channel: ChannelId, error: TransportError) {
        match self.connections.remove(&channel) {
            Some(conn) => {
                warn!(%channel, peer = ?conn.peer, phase = ?conn.phase, %error, "connection error");
                conn.abort(&mut self.transport);
            }
            None => debug!(%channel, %error, "error for closed connection ignored"),
        }
    }

    /// Aborts every connection idle for longer than the configured timeout.
    /// Returns how many were reaped.
    pub fn reap_idle(&mut self, now: Instant) -> usize {
        let Some(timeout) = self.limits.idle_timeout else {
            return 0;
        };

        let expired: Vec<ChannelId> = self
            .connections
            .values()
            .filter(|c| now.saturating_duration_since(c.last_activity) > timeout)
            .map(|c| c.channel)
            .collect();

        for channel in &expired {
            if let Some(conn) = self.connections.remove(channel) {
                info!(%channel, phase = ?conn.phase, "idle timeout, aborting");
                conn.abort(&mut self.transport);
            }
        }

        expired.len()
    }

    fn start_page(&mut self, channel: ChannelId) -> Result<(), ServerError> {
        let body = match page::render_index() {
            Ok(body) => body,
            Err(err) => {
                warn!(%channel, error = %err, "failed to render page, aborting");
                self.abort(channel);
                return Err(err);
            }
        };

        let Some(conn) = self.connections.get_mut(&channel) else {
            return Err(ServerError::UnknownChannel(channel));
        };

        let mut state = conn
            .state
            .take()
            .unwrap_or_else(|| ConnectionState::new(channel));
        state.prepare(Body::Owned(body));
        conn.phase = Phase::Responding;

        debug!(%channel, total = state.total_len(), "starting chunked response");

        match sender::pump(state, &mut self.transport, self.limits.chunk_size) {
            Ok(Progress::Pending(state)) => {
                conn.state = Some(state);
                Ok(())
            }
            Ok(Progress::Done) => {
                self.connections.remove(&channel);
                Ok(())
            }
            Err(err) => {
                warn!(%channel, error = %err, "initial chunk failed");
                self.connections.remove(&channel);
                Err(err)
            }
        }
    }

    fn reply_and_close(&mut self, channel: ChannelId, route: Route) -> Result<(), ServerError> {
        let response = match route.respond(&self.sensors) {
            Ok(Some(response)) => response,
            Ok(None) => return Ok(()),
            Err(err) => {
                self.abort(channel);
                return Err(err);
            }
        };

        let bytes = response.to_bytes();
        match self.transport.write(channel, &bytes) {
            Ok(()) => {
                if let Err(error) = self.transport.flush(channel) {
                    warn!(%channel, %error, "flush failed");
                }
            }
            Err(error) => warn!(%channel, ?route, %error, "failed to write response"),
        }

        self.close(channel);
        Ok(())
    }

    fn close(&mut self, channel: ChannelId) {
        if let Some(conn) = self.connections.remove(&channel) {
            conn.close(&mut self.transport);
        }
    }

    fn abort(&mut self, channel: ChannelId) {
        if let Some(conn) = self.connections.remove(&channel) {
            conn.abort(&mut self.transport);
        }
    }
}
