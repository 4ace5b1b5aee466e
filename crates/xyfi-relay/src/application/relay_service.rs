//! Relay core: the rules applied to every remote and screen event.
//!
//! [`RelayCore`] owns the identity registry, the set of live remote
//! connections and the [`ScreenHub`].  Connection tasks call into it with
//! already-parsed events; it fans events out to screens and mirrors them to
//! the engine through a [`DatagramSink`].
//!
//! # Locking
//!
//! All state sits behind `std::sync::Mutex`es whose critical sections never
//! await.  When both are needed, the live-remote lock is taken before the hub
//! lock, so a screen that subscribes sees either the `initialize` list with a
//! remote in it or the later `push` for that remote, never neither.  Poisoned
//! locks are recovered with [`PoisonError::into_inner`].

use std::collections::BTreeSet;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use xyfi_core::{
    encode_position, encode_touch, strip_namespace, IdentityRegistry, OscError, RandomSource,
    RegistrySnapshot, RemoteId, ThreadRandom,
};

use crate::application::screen_hub::{ScreenHub, ScreenId};
use crate::domain::messages::touching_from_json;
use crate::domain::{EventFrame, PositionPayload, RemoteEvent, ScreenEvent};

// ── Datagram sink ─────────────────────────────────────────────────────────────

/// Errors from the outbound datagram transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind datagram socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to send datagram to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Delivers one encoded OSC datagram to the engine.
///
/// Implemented over UDP by
/// [`UdpDatagramSink`](crate::infrastructure::datagram::UdpDatagramSink);
/// tests substitute a recording double.
#[cfg_attr(test, mockall::automock)]
pub trait DatagramSink: Send + Sync {
    fn send(&self, datagram: &[u8]) -> Result<(), TransportError>;
}

// ── Relay core ────────────────────────────────────────────────────────────────

pub struct RelayCore<R: RandomSource = ThreadRandom> {
    registry: Mutex<IdentityRegistry<R>>,
    live_remotes: Mutex<BTreeSet<String>>,
    screens: Mutex<ScreenHub>,
    sink: Arc<dyn DatagramSink>,
    advertise_address: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R: RandomSource> RelayCore<R> {
    pub fn new(
        registry: IdentityRegistry<R>,
        sink: Arc<dyn DatagramSink>,
        advertise_address: impl Into<String>,
        screen_queue_capacity: usize,
    ) -> Self {
        Self {
            registry: Mutex::new(registry),
            live_remotes: Mutex::new(BTreeSet::new()),
            screens: Mutex::new(ScreenHub::new(screen_queue_capacity)),
            sink,
            advertise_address: advertise_address.into(),
        }
    }

    // ── /remotes ──────────────────────────────────────────────────────────────

    /// A remote connected with transport id `raw_id`.
    pub fn remote_connected(&self, raw_id: &str) {
        let id = strip_namespace(raw_id).to_string();
        {
            let mut live = lock(&self.live_remotes);
            live.insert(raw_id.to_string());
            lock(&self.screens).broadcast(&ScreenEvent::Push { id: id.clone() });
        }
        let created = lock(&self.registry).ensure(&RemoteId::new(id.as_str()));
        info!(remote = %id, created, "remote connected");
        self.log_identities();
    }

    /// Dispatches one parsed frame from a remote.
    pub fn handle_remote_frame(&self, raw_id: &str, frame: EventFrame) {
        match RemoteEvent::from_frame(frame) {
            RemoteEvent::Position(payload) => self.remote_position(raw_id, payload),
            RemoteEvent::Touching(payload) => self.remote_touching(raw_id, &payload),
            RemoteEvent::Unknown(event) => {
                debug!(remote = %strip_namespace(raw_id), %event, "ignoring unknown remote event");
            }
        }
    }

    /// A remote reported its pointer position.
    ///
    /// Screens always receive the payload as sent.  The engine only receives
    /// a datagram when the payload is a two-number array.
    pub fn remote_position(&self, raw_id: &str, payload: Value) {
        let id = strip_namespace(raw_id);
        let parsed = PositionPayload::from_json(&payload);

        lock(&self.screens).broadcast(&ScreenEvent::Position {
            id: id.to_string(),
            position: payload,
        });
        lock(&self.registry).touch(&RemoteId::new(id));

        match parsed {
            PositionPayload::Point(position) => {
                self.send_datagram(encode_position(raw_id, position));
            }
            PositionPayload::Empty => {
                debug!(remote = %id, "empty position, no datagram");
            }
            PositionPayload::Malformed => {
                warn!(remote = %id, "malformed position payload, no datagram");
            }
        }
    }

    /// A remote reported its touch state.
    pub fn remote_touching(&self, raw_id: &str, payload: &Value) {
        let touching = touching_from_json(payload);
        debug!(remote = %strip_namespace(raw_id), touching, "touch state");
        self.send_datagram(encode_touch(raw_id, touching));
    }

    /// A remote disconnected.
    ///
    /// Returns `false` when `raw_id` was not live, in which case nothing is
    /// broadcast.
    pub fn remote_disconnected(&self, raw_id: &str) -> bool {
        {
            let mut live = lock(&self.live_remotes);
            if !live.remove(raw_id) {
                return false;
            }
            lock(&self.screens).broadcast(&ScreenEvent::Pop {
                raw_id: raw_id.to_string(),
            });
        }
        let id = strip_namespace(raw_id);
        lock(&self.registry).remove(&RemoteId::new(id));
        info!(remote = %id, "remote disconnected");
        self.log_identities();
        true
    }

    // ── /screens ──────────────────────────────────────────────────────────────

    /// Subscribes a new screen and queues its `initialize` event.
    pub fn screen_connected(&self) -> (ScreenId, mpsc::Receiver<ScreenEvent>) {
        let live = lock(&self.live_remotes);
        let mut screens = lock(&self.screens);
        let (screen, rx) = screens.subscribe();
        screens.send_to(
            screen,
            ScreenEvent::Initialize {
                remote_ids: live.iter().cloned().collect(),
                address: self.advertise_address.clone(),
            },
        );
        info!(screen, remotes = live.len(), "screen connected");
        (screen, rx)
    }

    pub fn screen_disconnected(&self, screen: ScreenId) {
        if lock(&self.screens).unsubscribe(screen) {
            info!(screen, "screen disconnected");
        }
    }

    // ── Idle ticks and diagnostics ────────────────────────────────────────────

    pub fn tick_idle(&self) {
        lock(&self.registry).tick();
        self.log_identities();
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        lock(&self.registry).snapshot()
    }

    /// Raw connection ids of live remotes, sorted.
    pub fn live_remotes(&self) -> Vec<String> {
        lock(&self.live_remotes).iter().cloned().collect()
    }

    pub fn screen_count(&self) -> usize {
        lock(&self.screens).len()
    }

    pub fn advertise_address(&self) -> &str {
        &self.advertise_address
    }

    fn send_datagram(&self, encoded: Result<Vec<u8>, OscError>) {
        let datagram = match encoded {
            Ok(datagram) => datagram,
            Err(e) => {
                warn!("failed to encode datagram: {e}");
                return;
            }
        };
        if let Err(e) = self.sink.send(&datagram) {
            warn!("{e}");
        }
    }

    fn log_identities(&self) {
        debug!(identities = ?self.snapshot(), "identity table");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
