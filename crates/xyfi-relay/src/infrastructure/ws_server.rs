//! WebSocket server: accept loop and per-connection tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Upgrading each connection to a WebSocket session, using the request
//!    path to pick the channel (`/remotes` or `/screens`).  Any other path
//!    is refused during the handshake with `404 Not Found`.
//! 3. Running one task per connection:
//!    - **Remote**: reads JSON event frames and hands them to [`RelayCore`].
//!    - **Screen**: drains the screen's event queue into text frames while
//!      watching the socket for close.
//! 4. Stopping the accept loop when the `running` flag is cleared.
//!
//! A failure in one connection is logged and never reaches the accept loop
//! or any other connection.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
        Message as WsMessage,
    },
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use xyfi_core::{strip_namespace, RandomSource};

use crate::application::RelayCore;
use crate::domain::{Channel, EventFrame};

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `bind_addr` and serves connections until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound.
pub async fn run_server<R: RandomSource + 'static>(
    bind_addr: SocketAddr,
    core: Arc<RelayCore<R>>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {bind_addr}"))?;

    info!("WebSocket relay listening on {bind_addr}");
    serve(listener, core, running).await
}

/// Runs the accept loop on an already bound listener.
pub async fn serve<R: RandomSource + 'static>(
    listener: TcpListener,
    core: Arc<RelayCore<R>>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the `running` flag is rechecked while idle.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let core = Arc::clone(&core);
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, core).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-connection handling ───────────────────────────────────────────────────

async fn handle_connection<R: RandomSource>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    core: Arc<RelayCore<R>>,
) {
    match run_connection(stream, peer_addr, core).await {
        Ok(()) => debug!("connection {peer_addr} closed"),
        Err(e) => warn!("connection {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_connection<R: RandomSource>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    core: Arc<RelayCore<R>>,
) -> anyhow::Result<()> {
    let mut channel = None;
    let select_channel = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        match Channel::from_path(request.uri().path()) {
            Some(selected) => {
                channel = Some(selected);
                Ok(response)
            }
            None => {
                let mut refusal = ErrorResponse::new(Some("unknown channel".to_string()));
                *refusal.status_mut() = StatusCode::NOT_FOUND;
                Err(refusal)
            }
        }
    };

    let ws = accept_hdr_async(stream, select_channel)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    match channel {
        Some(Channel::Remotes) => run_remote_session(ws, peer_addr, &core).await,
        Some(Channel::Screens) => run_screen_session(ws, peer_addr, &core).await,
        None => anyhow::bail!("handshake with {peer_addr} completed without a channel"),
    }
}

async fn run_remote_session<R: RandomSource>(
    mut ws: WebSocketStream<TcpStream>,
    peer_addr: SocketAddr,
    core: &RelayCore<R>,
) -> anyhow::Result<()> {
    let raw_id = Channel::Remotes.new_connection_id();
    info!("remote {} connected from {peer_addr}", strip_namespace(&raw_id));
    core.remote_connected(&raw_id);

    let mut outcome = Ok(());
    while let Some(incoming) = ws.next().await {
        match incoming {
            Ok(WsMessage::Text(text)) => match EventFrame::parse(&text) {
                Ok(frame) => core.handle_remote_frame(&raw_id, frame),
                Err(e) => warn!("remote {}: {e}", strip_namespace(&raw_id)),
            },
            Ok(WsMessage::Close(_)) => break,
            Ok(other) => debug!("remote {}: ignoring {} frame", strip_namespace(&raw_id), frame_kind(&other)),
            Err(e) => {
                outcome = Err(e).context("remote read failed");
                break;
            }
        }
    }

    core.remote_disconnected(&raw_id);
    outcome
}

async fn run_screen_session<R: RandomSource>(
    ws: WebSocketStream<TcpStream>,
    peer_addr: SocketAddr,
    core: &RelayCore<R>,
) -> anyhow::Result<()> {
    let (screen, mut events) = core.screen_connected();
    debug!(screen, "screen attached from {peer_addr}");
    let (mut ws_tx, mut ws_rx) = ws.split();

    let outcome = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break Ok(()) };
                let text = match event.to_frame().to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(screen, "failed to serialize {} event: {e}", event.name());
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                    break Err(e).context("screen write failed");
                }
            }
            incoming = ws_rx.next() => match incoming {
                None | Some(Ok(WsMessage::Close(_))) => break Ok(()),
                Some(Ok(other)) => debug!(screen, "ignoring inbound {} frame", frame_kind(&other)),
                Some(Err(e)) => break Err(e).context("screen read failed"),
            },
        }
    };

    core.screen_disconnected(screen);
    outcome
}

fn frame_kind(msg: &WsMessage) -> &'static str {
    match msg {
        WsMessage::Text(_) => "text",
        WsMessage::Binary(_) => "binary",
        WsMessage::Ping(_) => "ping",
        WsMessage::Pong(_) => "pong",
        WsMessage::Close(_) => "close",
        WsMessage::Frame(_) => "raw",
    }
}
