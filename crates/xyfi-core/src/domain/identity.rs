//! Identity types for connected remotes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::events::strip_namespace;

/// The bare id of a remote: its connection id without the namespace prefix.
///
/// Stable for the lifetime of one connection and unique among the remotes
/// that are connected at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    /// Wraps an id that is already bare.
    pub fn new(bare: impl Into<String>) -> Self {
        Self(bare.into())
    }

    /// Derives the bare id from a transport connection id such as
    /// `/remotes#Zf0iBHb5`.
    pub fn from_connection_id(raw_id: &str) -> Self {
        Self(strip_namespace(raw_id).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A CSS hex colour (`#rrggbb`) used to draw a remote's cursor on screens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayColor(String);

impl DisplayColor {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side record of one connected remote.
///
/// The colour is fixed when the identity is created; only the idle counter
/// changes afterwards, and only through the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteIdentity {
    id: RemoteId,
    color: DisplayColor,
    idle_ticks: u64,
}

impl RemoteIdentity {
    pub(crate) fn new(id: RemoteId, color: DisplayColor) -> Self {
        Self {
            id,
            color,
            idle_ticks: 0,
        }
    }

    pub fn id(&self) -> &RemoteId {
        &self.id
    }

    pub fn color(&self) -> &DisplayColor {
        &self.color
    }

    /// Idle Ticker firings since the last position update.
    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks
    }

    pub(crate) fn reset_idle(&mut self) {
        self.idle_ticks = 0;
    }

    pub(crate) fn age(&mut self) {
        self.idle_ticks = self.idle_ticks.saturating_add(1);
    }
}
