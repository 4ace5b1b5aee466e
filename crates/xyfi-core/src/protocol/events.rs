//! Semantic events the relay exchanges with the external engine.
//!
//! The engine (a Unity scene in the reference deployment) listens for two
//! OSC addresses:
//!
//! | Address            | Arguments                                 |
//! |--------------------|-------------------------------------------|
//! | `/unity/touching`  | `s` remote id, `s` `"true"` / `"false"`   |
//! | `/unity/pointing`  | `s` remote id, `f` x, `f` y               |
//!
//! and may report back on `/pointingInUnity` with `(id, tag)`.
//!
//! Remote ids arrive here in their raw transport form (`/remotes#abc123`).
//! The namespace prefix is stripped before encoding so the engine only ever
//! sees the bare id.

use serde::{Deserialize, Serialize};

use crate::protocol::osc::{encode_message, OscArg, OscError, OscMessage};

/// Address of the touch-state message sent to the engine.
pub const ADDRESS_TOUCHING: &str = "/unity/touching";

/// Address of the pointer-position message sent to the engine.
pub const ADDRESS_POINTING: &str = "/unity/pointing";

/// Address the engine uses to report which remote is pointing at what.
pub const ADDRESS_POINTING_IN_ENGINE: &str = "/pointingInUnity";

/// A two-dimensional pointer position reported by a remote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Removes the channel-namespace prefix from a connection id.
///
/// Everything up to and including the first `#` is dropped.  An id without a
/// `#` is already bare and is returned unchanged.
///
/// ```rust
/// use xyfi_core::strip_namespace;
///
/// assert_eq!(strip_namespace("/remotes#ABCD"), "ABCD");
/// assert_eq!(strip_namespace("ABCD"), "ABCD");
/// ```
pub fn strip_namespace(raw_id: &str) -> &str {
    match raw_id.split_once('#') {
        Some((_, bare)) => bare,
        None => raw_id,
    }
}

/// Builds the `/unity/touching` message for `remote_id`.
pub fn touch_message(remote_id: &str, is_touching: bool) -> OscMessage {
    OscMessage::new(
        ADDRESS_TOUCHING,
        vec![
            OscArg::from(strip_namespace(remote_id)),
            // The engine expects the flag as a string, not as an OSC T/F tag.
            OscArg::from(if is_touching { "true" } else { "false" }),
        ],
    )
}

/// Builds the `/unity/pointing` message for `remote_id`.
pub fn position_message(remote_id: &str, position: Position) -> OscMessage {
    OscMessage::new(
        ADDRESS_POINTING,
        vec![
            OscArg::from(strip_namespace(remote_id)),
            OscArg::Float(position.x),
            OscArg::Float(position.y),
        ],
    )
}

/// Encodes a touch-state datagram.
///
/// # Errors
///
/// Returns [`OscError::EmbeddedNul`] if the remote id contains a NUL byte.
///
/// # Examples
///
/// ```rust
/// use xyfi_core::{decode_message, encode_touch, OscArg};
///
/// let bytes = encode_touch("/remotes#XYZ", true).unwrap();
/// let msg = decode_message(&bytes).unwrap();
/// assert_eq!(msg.address, "/unity/touching");
/// assert_eq!(msg.args, vec![OscArg::from("XYZ"), OscArg::from("true")]);
/// ```
pub fn encode_touch(remote_id: &str, is_touching: bool) -> Result<Vec<u8>, OscError> {
    encode_message(&touch_message(remote_id, is_touching))
}

/// Encodes a pointer-position datagram.
///
/// # Errors
///
/// Returns [`OscError::EmbeddedNul`] if the remote id contains a NUL byte.
pub fn encode_position(remote_id: &str, position: Position) -> Result<Vec<u8>, OscError> {
    encode_message(&position_message(remote_id, position))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
