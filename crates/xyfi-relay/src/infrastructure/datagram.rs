//! Outbound UDP transport to the real-time engine.
//!
//! One shared, unconnected `std::net::UdpSocket` is used for every send.
//! `send_to` on a UDP socket does not block on the peer, is safe to call from
//! many tasks at once, and needs no coordination, so no async wrapper or lock
//! is involved.

use std::net::{SocketAddr, UdpSocket};

use tracing::info;

use crate::application::{DatagramSink, TransportError};

pub struct UdpDatagramSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpDatagramSink {
    /// Binds an ephemeral local port suitable for reaching `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Bind`] if no local socket can be bound.
    pub fn bind(target: SocketAddr) -> Result<Self, TransportError> {
        let local: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket =
            UdpSocket::bind(local).map_err(|source| TransportError::Bind { addr: local, source })?;
        info!("sending OSC datagrams to {target}");
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl DatagramSink for UdpDatagramSink {
    fn send(&self, datagram: &[u8]) -> Result<(), TransportError> {
        self.socket
            .send_to(datagram, self.target)
            .map(|_| ())
            .map_err(|source| TransportError::Send {
                target: self.target,
                source,
            })
    }
}
