//! Optional TOML configuration file.
//!
//! Every key is optional; missing keys take the built-in defaults, so an
//! empty file is valid.  Example:
//!
//! ```toml
//! [server]
//! ws_bind = "0.0.0.0:443"
//! advertise_host = "192.168.1.20"
//!
//! [engine]
//! host = "127.0.0.1"
//! port = 9001
//! osc_listen = "127.0.0.1:9000"
//!
//! [relay]
//! tick_interval_secs = 5
//! screen_queue_capacity = 128
//! ```
//!
//! Values given on the command line or through environment variables take
//! precedence over the file (see `main.rs`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Schema ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub relay: RelaySection,
}

/// WebSocket server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_ws_bind")]
    pub ws_bind: SocketAddr,
    /// Host advertised to screens.  Detected from the network when absent.
    #[serde(default)]
    pub advertise_host: Option<String>,
}

/// Engine (OSC) settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSection {
    /// Host name or IP address of the engine.
    #[serde(default = "default_engine_host")]
    pub host: String,
    #[serde(default = "default_engine_port")]
    pub port: u16,
    /// Local address for inbound OSC datagrams from the engine.
    #[serde(default = "default_osc_listen")]
    pub osc_listen: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelaySection {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_screen_queue_capacity")]
    pub screen_queue_capacity: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

fn default_ws_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8443))
}
fn default_engine_host() -> String {
    "127.0.0.1".to_string()
}
fn default_engine_port() -> u16 {
    9001
}
fn default_osc_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}
fn default_tick_interval_secs() -> u64 {
    5
}
fn default_screen_queue_capacity() -> usize {
    128
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            ws_bind: default_ws_bind(),
            advertise_host: None,
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            host: default_engine_host(),
            port: default_engine_port(),
            osc_listen: default_osc_listen(),
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            screen_queue_capacity: default_screen_queue_capacity(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl FileConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
