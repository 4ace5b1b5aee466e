//! Relay configuration types.
//!
//! [`RelayConfig`] holds every runtime setting.  The infrastructure layer
//! fills it from CLI arguments, environment variables and an optional TOML
//! file; the domain never reads the environment itself.

use std::net::SocketAddr;
use std::time::Duration;

/// Host advertised to screens when no local IPv4 address can be detected.
pub const FALLBACK_ADVERTISE_HOST: &str = "127.0.0.1";

/// All runtime configuration for the relay.
///
/// # Example
///
/// ```rust
/// use xyfi_relay::domain::RelayConfig;
///
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 8443);
/// assert_eq!(cfg.advertised_address(), "127.0.0.1:8443");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Address the WebSocket server binds to.
    pub ws_bind_addr: SocketAddr,

    /// Host part of the `address` string sent to screens in `initialize`.
    ///
    /// Phones need a LAN-reachable address, so this is normally the
    /// machine's outward-facing IPv4 address rather than the bind address.
    pub advertise_host: String,

    /// Local address of the inbound OSC listener.
    pub osc_listen_addr: SocketAddr,

    /// Destination of outbound OSC datagrams (the real-time engine).
    pub engine_addr: SocketAddr,

    /// Period of the idle ticker.
    pub idle_tick_interval: Duration,

    /// Number of undelivered events buffered per screen before events are
    /// dropped for that screen.
    pub screen_queue_capacity: usize,
}

impl RelayConfig {
    /// The `host:port` string screens use to reach the relay.
    pub fn advertised_address(&self) -> String {
        format!("{}:{}", self.advertise_host, self.ws_bind_addr.port())
    }
}

impl Default for RelayConfig {
    /// | Field                 | Default          |
    /// |-----------------------|------------------|
    /// | ws_bind_addr          | `0.0.0.0:8443`   |
    /// | advertise_host        | `127.0.0.1`      |
    /// | osc_listen_addr       | `127.0.0.1:9000` |
    /// | engine_addr           | `127.0.0.1:9001` |
    /// | idle_tick_interval    | 5 seconds        |
    /// | screen_queue_capacity | 128              |
    fn default() -> Self {
        Self {
            ws_bind_addr: SocketAddr::from(([0, 0, 0, 0], 8443)),
            advertise_host: FALLBACK_ADVERTISE_HOST.to_string(),
            osc_listen_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
            engine_addr: SocketAddr::from(([127, 0, 0, 1], 9001)),
            idle_tick_interval: Duration::from_secs(5),
            screen_queue_capacity: 128,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
