//! IdentityRegistry: connected remotes, their colours, and their idle time.
//!
//! The registry is the relay's in-memory table of every remote that is
//! currently connected.  Each entry tracks:
//!
//! - The remote's bare id (its connection id without the namespace prefix).
//! - The cursor colour it was given when it first appeared.
//! - How many Idle Ticker firings have passed since its last position update.
//!
//! # Lifecycle
//!
//! ```text
//! connect ──► ensure(id) ──► touch(id) on every position ──► remove(id) on disconnect
//!                               ▲
//!                  tick() ages every entry periodically
//! ```
//!
//! # Colour assignment
//!
//! A new remote draws a colour uniformly at random from [`PALETTE`].  If some
//! connected remote already holds exactly that colour, one hex digit of the
//! draw is replaced by a random digit (see [`best_effort_dedupe`]).  The
//! result is not re-checked, so two remotes *can* still end up with the same
//! colour; the palette is large enough that this is rare in practice.
//!
//! # Concurrency
//!
//! The registry itself is not synchronised.  Whoever owns it must serialise
//! access (the relay keeps it behind a single `Mutex`).

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::domain::identity::{DisplayColor, RemoteId, RemoteIdentity};
use crate::domain::palette::{best_effort_dedupe, PALETTE};

/// Source of the random choices made during colour assignment.
///
/// Production code uses [`ThreadRandom`]; tests inject a deterministic source
/// to force colour collisions.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send {
    /// Returns an index in `0..len`.  `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Returns the character position to perturb, in `1..=6`.
    fn perturb_position(&mut self) -> usize;

    /// Returns a decimal digit, in `0..=9`.
    fn digit(&mut self) -> u8;
}

/// [`RandomSource`] backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn perturb_position(&mut self) -> usize {
        rand::thread_rng().gen_range(1..=6)
    }

    fn digit(&mut self) -> u8 {
        rand::thread_rng().gen_range(0..=9)
    }
}

/// [`RandomSource`] with a fixed seed, for reproducible runs.
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    fn perturb_position(&mut self) -> usize {
        self.0.gen_range(1..=6)
    }

    fn digit(&mut self) -> u8 {
        self.0.gen_range(0..=9)
    }
}

/// Read-only copy of the registry, keyed by id.
///
/// Serializes to `{"<id>": ["<color>", <idle ticks>], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RegistrySnapshot(BTreeMap<RemoteId, (DisplayColor, u64)>);

impl RegistrySnapshot {
    pub fn get(&self, id: &RemoteId) -> Option<&(DisplayColor, u64)> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RemoteId, &(DisplayColor, u64))> {
        self.0.iter()
    }
}

/// In-memory registry of connected remotes.
///
/// # HashMap choice
///
/// Lookups happen on every position event, so the table is keyed by id for
/// O(1) access.  Iteration order does not matter; [`RegistrySnapshot`] sorts
/// by id for stable diagnostics output.
pub struct IdentityRegistry<R: RandomSource = ThreadRandom> {
    identities: HashMap<RemoteId, RemoteIdentity>,
    random: R,
}

impl IdentityRegistry<ThreadRandom> {
    pub fn new() -> Self {
        Self::with_random(ThreadRandom)
    }
}

impl Default for IdentityRegistry<ThreadRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> IdentityRegistry<R> {
    /// Creates an empty registry that draws colours from `random`.
    pub fn with_random(random: R) -> Self {
        Self {
            identities: HashMap::new(),
            random,
        }
    }

    /// Registers `id` with a freshly assigned colour if it is not present.
    ///
    /// Returns `true` if a new entry was created, `false` if `id` was already
    /// registered (in which case nothing changes).
    pub fn ensure(&mut self, id: &RemoteId) -> bool {
        if self.identities.contains_key(id) {
            return false;
        }
        let color = self.assign_color();
        debug!("registered remote {id} with colour {color}");
        self.identities
            .insert(id.clone(), RemoteIdentity::new(id.clone(), color));
        true
    }

    /// Resets the idle counter of `id`.
    ///
    /// Returns `false` and does nothing if `id` is not registered.
    pub fn touch(&mut self, id: &RemoteId) -> bool {
        match self.identities.get_mut(id) {
            Some(identity) => {
                identity.reset_idle();
                true
            }
            None => false,
        }
    }

    /// Removes `id`, returning its record if it was registered.
    pub fn remove(&mut self, id: &RemoteId) -> Option<RemoteIdentity> {
        self.identities.remove(id)
    }

    /// Increments the idle counter of every registered remote.
    pub fn tick(&mut self) {
        for identity in self.identities.values_mut() {
            identity.age();
        }
    }

    /// Returns a sorted, read-only copy of every entry.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot(
            self.identities
                .iter()
                .map(|(id, identity)| {
                    (id.clone(), (identity.color().clone(), identity.idle_ticks()))
                })
                .collect(),
        )
    }

    pub fn get(&self, id: &RemoteId) -> Option<&RemoteIdentity> {
        self.identities.get(id)
    }

    pub fn contains(&self, id: &RemoteId) -> bool {
        self.identities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Draws a colour and applies the single-shot de-duplication step.
    fn assign_color(&mut self) -> DisplayColor {
        let index = self.random.pick_index(PALETTE.len()) % PALETTE.len();
        let candidate = DisplayColor::new(PALETTE[index]);

        let collides = self
            .identities
            .values()
            .any(|identity| identity.color() == &candidate);
        if !collides {
            return candidate;
        }

        let position = self.random.perturb_position();
        let digit = self.random.digit();
        let perturbed = best_effort_dedupe(&candidate, position, digit);
        debug!("colour {candidate} already in use; perturbed to {perturbed}");
        perturbed
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
