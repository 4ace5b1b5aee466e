//! Domain layer: remote identities, the display palette, and the registry.
//!
//! Nothing in here performs I/O.  The registry is plain in-memory state; the
//! relay decides how to share it between tasks.

pub mod identity;
pub mod palette;
pub mod registry;

pub use identity::{DisplayColor, RemoteId, RemoteIdentity};
pub use palette::{best_effort_dedupe, PALETTE};
pub use registry::{IdentityRegistry, RandomSource, RegistrySnapshot, SeededRandom, ThreadRandom};
