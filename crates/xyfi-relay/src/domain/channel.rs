//! The two fixed event channels and their connection ids.

use std::fmt;

use uuid::Uuid;

/// A logical event channel, selected by the WebSocket request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// One connection per phone providing pointer/touch input.
    Remotes,
    /// One connection per viewer displaying the aggregated cursors.
    Screens,
}

impl Channel {
    /// Resolves a request path such as `/remotes` or `/screens/`.
    ///
    /// Returns `None` for any other path.
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/remotes" => Some(Channel::Remotes),
            "/screens" => Some(Channel::Screens),
            _ => None,
        }
    }

    /// The namespace prefix used in connection ids.
    pub fn namespace(self) -> &'static str {
        match self {
            Channel::Remotes => "/remotes",
            Channel::Screens => "/screens",
        }
    }

    /// Assigns a fresh raw connection id, e.g. `/remotes#3f2a...`.
    pub fn new_connection_id(self) -> String {
        format!("{}#{}", self.namespace(), Uuid::new_v4().simple())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}
