//! Application layer for xyfi-relay.
//!
//! Holds the relay rules ([`RelayCore`]), the screen fan-out ([`ScreenHub`])
//! and the idle ticker task.  Nothing here opens a socket: outbound datagrams
//! go through the [`DatagramSink`] trait and screens are fed through bounded
//! channels that the infrastructure layer drains.

pub mod idle_ticker;
pub mod relay_service;
pub mod screen_hub;

pub use idle_ticker::run_idle_ticker;
pub use relay_service::{DatagramSink, RelayCore, TransportError};
pub use screen_hub::{ScreenHub, ScreenId};
