//! Domain layer for xyfi-relay.
//!
//! Pure types with no dependencies on sockets or the async runtime:
//!
//! - The JSON event frames exchanged with browsers, and how their payloads
//!   are interpreted.
//! - The two fixed channels (`/remotes`, `/screens`) and connection ids.
//! - Runtime configuration.

pub mod channel;
pub mod config;
pub mod messages;

pub use channel::Channel;
pub use config::RelayConfig;
pub use messages::{EventFrame, MessageError, PositionPayload, RemoteEvent, ScreenEvent};
