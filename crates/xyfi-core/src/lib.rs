//! # xyfi-core
//!
//! Shared library for the xyfi relay containing the OSC message codec and the
//! remote identity registry.
//!
//! This crate has zero dependencies on sockets, async runtimes, or browser
//! transports.  Everything in it is plain data plus pure functions, so the
//! relay binary (and any future tooling) can reuse it freely.
//!
//! # Architecture overview
//!
//! xyfi lets a room full of phones act as pointers on a big screen.  Each
//! phone (a "remote") streams its pointer position and touch state to the
//! relay, which forwards them to every "screen" viewer and, in parallel, to an
//! external real-time engine over UDP.
//!
//! This crate is the shared foundation.  It defines:
//!
//! - **`protocol`** – How events travel to the engine.  Messages are encoded
//!   with the Open Sound Control (OSC 1.0) wire format: an address string, a
//!   type-tag string, and big-endian arguments, all padded to 4 bytes.
//!
//! - **`domain`** – The identity registry: which remotes are connected, which
//!   colour each one was given, and how long each has been idle.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `xyfi_core::IdentityRegistry` instead of the full module path.
pub use domain::identity::{DisplayColor, RemoteId, RemoteIdentity};
pub use domain::registry::{IdentityRegistry, RandomSource, RegistrySnapshot, SeededRandom, ThreadRandom};
pub use protocol::events::{encode_position, encode_touch, strip_namespace, Position};
pub use protocol::osc::{decode_message, decode_packet, encode_message, OscArg, OscError, OscMessage, OscPacket};
