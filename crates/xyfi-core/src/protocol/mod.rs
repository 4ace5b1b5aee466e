//! Protocol module containing the OSC codec and the relay's semantic events.

pub mod events;
pub mod osc;

pub use events::{encode_position, encode_touch, strip_namespace, Position};
pub use osc::{decode_message, decode_packet, encode_message, OscArg, OscError, OscMessage, OscPacket};
