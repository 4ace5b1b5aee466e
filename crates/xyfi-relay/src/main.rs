//! xyfi relay entry point.
//!
//! Phones connect to `/remotes` and stream pointer positions and touch
//! state; big-screen viewers connect to `/screens` and receive every remote's
//! events.  The same state is mirrored to a real-time engine as OSC
//! datagrams, and `/pointingInUnity` replies from the engine are logged.
//!
//! # Usage
//!
//! ```text
//! xyfi-relay [OPTIONS]
//!
//! Options:
//!   --config         <PATH>  TOML configuration file
//!   --ws-bind        <IP>    WebSocket bind address [default: 0.0.0.0]
//!   --ws-port        <PORT>  WebSocket port [default: 8443]
//!   --advertise-host <HOST>  Host sent to screens [default: detected LAN IPv4]
//!   --osc-listen     <ADDR>  Inbound OSC address [default: 127.0.0.1:9000]
//!   --engine-host    <HOST>  Engine host [default: 127.0.0.1]
//!   --engine-port    <PORT>  Engine OSC port [default: 9001]
//!   --tick-interval  <SECS>  Idle tick period [default: 5]
//! ```
//!
//! # Precedence
//!
//! Command line and environment (`XYFI_*`) beat the config file, which beats
//! the built-in defaults.
//!
//! | Variable              | Flag               |
//! |-----------------------|--------------------|
//! | `XYFI_CONFIG`         | `--config`         |
//! | `XYFI_WS_BIND`        | `--ws-bind`        |
//! | `XYFI_WS_PORT`        | `--ws-port`        |
//! | `XYFI_ADVERTISE_HOST` | `--advertise-host` |
//! | `XYFI_OSC_LISTEN`     | `--osc-listen`     |
//! | `XYFI_ENGINE_HOST`    | `--engine-host`    |
//! | `XYFI_ENGINE_PORT`    | `--engine-port`    |
//! | `XYFI_TICK_INTERVAL`  | `--tick-interval`  |

use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use xyfi_core::IdentityRegistry;
use xyfi_relay::application::{run_idle_ticker, RelayCore};
use xyfi_relay::domain::config::FALLBACK_ADVERTISE_HOST;
use xyfi_relay::domain::RelayConfig;
use xyfi_relay::infrastructure::{run_server, start_osc_listener, FileConfig, UdpDatagramSink};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// xyfi relay: phones as pointers on a shared screen.
///
/// Every option is optional; unset options fall back to the config file and
/// then to built-in defaults.
#[derive(Debug, Default, Parser)]
#[command(
    name = "xyfi-relay",
    about = "Relays phone pointer events to screens and to an OSC engine",
    version
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "XYFI_CONFIG")]
    config: Option<PathBuf>,

    /// IP address the WebSocket server binds to.
    #[arg(long, env = "XYFI_WS_BIND")]
    ws_bind: Option<IpAddr>,

    /// Port the WebSocket server listens on.
    #[arg(long, env = "XYFI_WS_PORT")]
    ws_port: Option<u16>,

    /// Host advertised to screens in the `initialize` event.
    #[arg(long, env = "XYFI_ADVERTISE_HOST")]
    advertise_host: Option<String>,

    /// Local address for OSC datagrams coming back from the engine.
    #[arg(long, env = "XYFI_OSC_LISTEN")]
    osc_listen: Option<SocketAddr>,

    /// Host name or IP address of the engine.
    #[arg(long, env = "XYFI_ENGINE_HOST")]
    engine_host: Option<String>,

    /// OSC port of the engine.
    #[arg(long, env = "XYFI_ENGINE_PORT")]
    engine_port: Option<u16>,

    /// Idle tick period in seconds.
    #[arg(long, env = "XYFI_TICK_INTERVAL")]
    tick_interval: Option<u64>,
}

impl Cli {
    /// Loads the config file named by `--config`, or the defaults when none
    /// was given.
    fn load_file_config(&self) -> anyhow::Result<FileConfig> {
        match &self.config {
            Some(path) => FileConfig::load(path)
                .with_context(|| format!("failed to load config file {}", path.display())),
            None => Ok(FileConfig::default()),
        }
    }

    /// Merges CLI values over `file` into a [`RelayConfig`].
    ///
    /// `detect_host` is consulted only when neither the CLI nor the file
    /// names an advertise host.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine host cannot be resolved or the tick
    /// interval is zero.
    fn into_relay_config(
        self,
        file: FileConfig,
        detect_host: impl FnOnce() -> Option<IpAddr>,
    ) -> anyhow::Result<RelayConfig> {
        let ws_bind_addr = SocketAddr::new(
            self.ws_bind.unwrap_or_else(|| file.server.ws_bind.ip()),
            self.ws_port.unwrap_or_else(|| file.server.ws_bind.port()),
        );

        let advertise_host = match self.advertise_host.or(file.server.advertise_host) {
            Some(host) => host,
            None => detect_host()
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| FALLBACK_ADVERTISE_HOST.to_string()),
        };

        let engine_host = self.engine_host.unwrap_or(file.engine.host);
        let engine_port = self.engine_port.unwrap_or(file.engine.port);
        let engine_addr = (engine_host.as_str(), engine_port)
            .to_socket_addrs()
            .with_context(|| format!("invalid engine address: '{engine_host}:{engine_port}'"))?
            .next()
            .with_context(|| format!("engine host '{engine_host}' resolved to no address"))?;

        let tick_secs = self.tick_interval.unwrap_or(file.relay.tick_interval_secs);
        anyhow::ensure!(tick_secs > 0, "tick interval must be at least one second");

        Ok(RelayConfig {
            ws_bind_addr,
            advertise_host,
            osc_listen_addr: self.osc_listen.unwrap_or(file.engine.osc_listen),
            engine_addr,
            idle_tick_interval: Duration::from_secs(tick_secs),
            screen_queue_capacity: file.relay.screen_queue_capacity,
        })
    }
}

/// Finds the IPv4 address this host would use to reach the outside world.
///
/// Connecting a UDP socket sends nothing; it only selects a route.
fn detect_local_ipv4() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let file = cli.load_file_config()?;
    let config = cli.into_relay_config(file, detect_local_ipv4)?;

    info!(
        "xyfi relay starting: ws={}, advertise={}, engine={}, osc-listen={}",
        config.ws_bind_addr,
        config.advertised_address(),
        config.engine_addr,
        config.osc_listen_addr
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let sink = UdpDatagramSink::bind(config.engine_addr).context("failed to open engine socket")?;
    let core = Arc::new(RelayCore::new(
        IdentityRegistry::new(),
        Arc::new(sink),
        config.advertised_address(),
        config.screen_queue_capacity,
    ));

    match start_osc_listener(config.osc_listen_addr, Arc::clone(&running)) {
        Ok((_, mut pointing)) => {
            tokio::spawn(async move {
                while let Some(event) = pointing.recv().await {
                    debug!(?event, "engine pointing event");
                }
            });
        }
        Err(e) => warn!("{e}; continuing without inbound OSC"),
    }

    let ticker = tokio::spawn(run_idle_ticker(
        Arc::clone(&core),
        config.idle_tick_interval,
        Arc::clone(&running),
    ));

    let result = run_server(config.ws_bind_addr, core, Arc::clone(&running)).await;

    running.store(false, Ordering::Relaxed);
    ticker.abort();
    result?;

    info!("xyfi relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
