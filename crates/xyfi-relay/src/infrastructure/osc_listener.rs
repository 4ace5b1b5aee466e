//! Inbound OSC listener.
//!
//! The engine reports which remote it currently considers "pointed at" by
//! sending `/pointingInUnity <id> <tag>` to the relay.  This module binds a
//! UDP socket on the configured address and processes datagrams on a
//! dedicated thread:
//!
//! - `/pointingInUnity` with two arguments is logged at info and emitted as a
//!   [`PointingInEngine`] event.
//! - Any other address is logged at debug.
//! - Datagrams that do not decode as OSC are logged and skipped.
//!
//! Bundles are flattened, so each contained message is handled in order.
//!
//! # Read timeout
//!
//! The socket uses a 500 ms read timeout; on every timeout the `running` flag
//! is checked so the thread exits promptly at shutdown.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use xyfi_core::protocol::events::ADDRESS_POINTING_IN_ENGINE;
use xyfi_core::{decode_packet, OscMessage};

const MAX_DATAGRAM: usize = 4096;

/// Error type for starting the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind OSC listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn OSC listener thread: {0}")]
    Spawn(#[source] io::Error),
}

/// The engine reported that a remote is pointing at something.
#[derive(Debug, Clone, PartialEq)]
pub struct PointingInEngine {
    pub remote_id: String,
    pub tag: String,
    pub source: SocketAddr,
}

/// Binds `addr` and spawns the listener thread.
///
/// Returns the bound address (useful when `addr` uses port 0) and a receiver
/// of [`PointingInEngine`] events.  Events are dropped, not queued, when the
/// receiver lags or has gone away; logging continues either way.
///
/// # Errors
///
/// Returns [`ListenerError::Bind`] if the socket cannot be bound.
pub fn start_osc_listener(
    addr: SocketAddr,
    running: Arc<AtomicBool>,
) -> Result<(SocketAddr, mpsc::Receiver<PointingInEngine>), ListenerError> {
    let socket = UdpSocket::bind(addr).map_err(|source| ListenerError::Bind { addr, source })?;
    if let Err(e) = socket.set_read_timeout(Some(Duration::from_millis(500))) {
        warn!("could not set OSC listener read timeout: {e}");
    }
    let local = socket.local_addr().unwrap_or(addr);

    let (tx, rx) = mpsc::channel(64);

    std::thread::Builder::new()
        .name("xyfi-osc-listener".to_string())
        .spawn(move || listener_loop(socket, tx, running))
        .map_err(ListenerError::Spawn)?;

    info!("OSC listener bound on UDP {local}");
    Ok((local, rx))
}

fn listener_loop(socket: UdpSocket, tx: mpsc::Sender<PointingInEngine>, running: Arc<AtomicBool>) {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    while running.load(Ordering::Relaxed) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                error!("OSC listener recv error: {e}");
                continue;
            }
        };

        match decode_packet(&buf[..len]) {
            Ok(packet) => {
                for msg in packet.into_messages() {
                    handle_message(msg, src, &tx);
                }
            }
            Err(e) => debug!("undecodable datagram from {src}: {e}"),
        }
    }

    info!("OSC listener stopped");
}

fn handle_message(msg: OscMessage, src: SocketAddr, tx: &mpsc::Sender<PointingInEngine>) {
    match (msg.address.as_str(), msg.args.as_slice()) {
        (ADDRESS_POINTING_IN_ENGINE, [id, tag]) => {
            info!(remote = %id, %tag, "pointing in engine");
            let event = PointingInEngine {
                remote_id: id.to_string(),
                tag: tag.to_string(),
                source: src,
            };
            match tx.try_send(event) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(_)) => debug!("pointing event queue full, dropping"),
            }
        }
        (address, args) => {
            debug!(%address, args = args.len(), "ignoring OSC message from {src}");
        }
    }
}

fn is_timeout_error(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
