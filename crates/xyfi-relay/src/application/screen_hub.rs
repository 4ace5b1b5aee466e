//! Fan-out of [`ScreenEvent`]s to connected screens.
//!
//! Every screen owns a bounded queue.  The WebSocket writer task for that
//! screen drains the queue; the hub only ever pushes with `try_send`, so a
//! slow viewer can lose events but can never stall a remote.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::domain::ScreenEvent;

/// Identifier of one subscribed screen, unique for the hub's lifetime.
pub type ScreenId = u64;

pub struct ScreenHub {
    subscribers: HashMap<ScreenId, mpsc::Sender<ScreenEvent>>,
    next_id: ScreenId,
    capacity: usize,
}

impl ScreenHub {
    /// Creates an empty hub whose per-screen queues hold `capacity` events.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 1,
            capacity: capacity.max(1),
        }
    }

    /// Registers a new screen and returns its id and event queue.
    pub fn subscribe(&mut self) -> (ScreenId, mpsc::Receiver<ScreenEvent>) {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.insert(id, tx);
        debug!(screen = id, screens = self.subscribers.len(), "screen subscribed");
        (id, rx)
    }

    /// Removes a screen.  Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ScreenId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            debug!(screen = id, screens = self.subscribers.len(), "screen unsubscribed");
        }
        removed
    }

    /// Queues `event` for a single screen.
    pub fn send_to(&mut self, id: ScreenId, event: ScreenEvent) -> bool {
        let Some(tx) = self.subscribers.get(&id) else {
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(screen = id, event = event.name(), "screen queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.unsubscribe(id);
                false
            }
        }
    }

    /// Queues a copy of `event` for every screen.
    ///
    /// Returns the number of screens the event was queued for.
    pub fn broadcast(&mut self, event: &ScreenEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (&id, tx) in &self.subscribers {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(screen = id, event = event.name(), "screen queue full, dropping event");
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        for id in closed {
            self.unsubscribe(id);
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
