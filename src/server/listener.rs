use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{Config, Limits};
use crate::error::ServerError;
use crate::sensors::{Board, Sensors, SimulatedHardware};
use crate::server::lifecycle::Server;
use crate::transport::{Event, SocketTransport};

/// How often idle connections are checked when a timeout is configured.
const REAP_INTERVAL: Duration = Duration::from_secs(1);

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("Listening on {}", cfg.listen_addr);

    let sensors = Board::new(SimulatedHardware::new());
    serve(listener, cfg.limits(), cfg.send_buffer, sensors).await
}

/// Runs the event loop on an already bound listener.
///
/// Accepts, socket events and idle checks are all dispatched from this one
/// loop, so the server core only ever runs on a single flow of control.
pub async fn serve<S: Sensors>(
    listener: TcpListener,
    limits: Limits,
    send_buffer: usize,
    sensors: S,
) -> anyhow::Result<()> {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let transport = SocketTransport::new(events_tx, send_buffer);
    let mut server = Server::new(transport, sensors, limits);

    let reaping = limits.idle_timeout.is_some();
    let mut reaper = tokio::time::interval(REAP_INTERVAL);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let channel = server.transport_mut().attach(stream);
                    server.on_accept(channel, Some(peer));
                }
                Err(err) => warn!(error = %err, "accept failed"),
            },

            Some(event) = events.recv() => dispatch(&mut server, event),

            tick = reaper.tick(), if reaping => {
                let reaped = server.reap_idle(tick.into_std());
                if reaped > 0 {
                    debug!(reaped, open = server.connection_count(), "reaped idle connections");
                }
            }
        }
    }
}

fn dispatch<S: Sensors>(server: &mut Server<SocketTransport, S>, event: Event) {
    let result = match event {
        Event::Received { channel, data } => {
            if !server.transport().is_registered(channel) {
                return;
            }
            server.on_receive(channel, data.as_deref())
        }
        Event::Sent { channel, len } => {
            if !server.transport_mut().settle(channel, len) {
                return;
            }
            server.on_send_ack(channel, len)
        }
        Event::Failed { channel, error } => {
            if server.transport().is_registered(channel) {
                server.on_error(channel, error);
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => {}
        Err(ServerError::UnknownChannel(channel)) => {
            debug!(%channel, "event for closed connection dropped");
        }
        Err(err) => warn!(error = %err, "connection ended with error"),
    }
}
