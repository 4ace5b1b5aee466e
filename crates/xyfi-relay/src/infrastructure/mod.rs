//! Infrastructure layer for xyfi-relay.
//!
//! Handles all I/O:
//!
//! - Accepting WebSocket connections from remotes and screens
//! - Sending OSC datagrams to the engine
//! - Receiving OSC datagrams from the engine
//! - Reading the optional TOML configuration file
//!
//! Relay rules live in the application layer; message types live in the
//! domain layer.

pub mod config_file;
pub mod datagram;
pub mod osc_listener;
pub mod ws_server;

pub use config_file::{ConfigError, FileConfig};
pub use datagram::UdpDatagramSink;
pub use osc_listener::{start_osc_listener, ListenerError, PointingInEngine};
pub use ws_server::{run_server, serve};
