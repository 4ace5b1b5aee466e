//! xyfi-relay library crate.
//!
//! Relays pointer and touch state from phone "remotes" to "screen" viewers
//! over WebSocket, and mirrors the same state to an external real-time engine
//! as OSC datagrams.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Phones (JSON over WebSocket, /remotes)      Screens (JSON over WebSocket, /screens)
//!                 ↓                                         ↑
//! [xyfi-relay]
//!   ├── domain/           Event frames, channels, RelayConfig
//!   ├── application/      Relay core, screen fan-out, idle ticker
//!   └── infrastructure/
//!         ├── ws_server/     WebSocket accept loop (tokio-tungstenite)
//!         ├── datagram/      Outbound UDP sink (xyfi-core codec)
//!         ├── osc_listener/  Inbound UDP listener
//!         └── config_file/   Optional TOML configuration
//!                 ↓
//! Engine (OSC over UDP)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `xyfi-core`; it reaches the network
//!   only through the [`application::DatagramSink`] trait and channels.
//! - `infrastructure` depends on all other layers plus `tokio` and `tungstenite`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: relay rules and background tasks.
pub mod application;

/// Infrastructure layer: sockets, WebSocket server, config file.
pub mod infrastructure;
