//! [`PanelServer`] – HTTP + WebSocket server for the control panel.
//!
//! Regular HTTP requests get the embedded panel HTML; WebSocket
//! upgrades become a bidirectional bridge: state snapshots flow down to
//! the browser, widget events flow up into the panel core.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, trace, warn};

use turtleweb_panel::TurtlePanel;
use turtleweb_types::{PanelError, WidgetEvent};

/// Default TCP port for the panel HTTP/WebSocket server.
pub const DEFAULT_PORT: u16 = 8080;

/// The compiled-in control panel page (HTML + CSS + JS).
const PANEL_HTML: &str = include_str!("panel.html");

pub struct PanelServer {
    panel: Arc<TurtlePanel>,
    port: u16,
}

impl PanelServer {
    /// Create a server for `panel` on the [`DEFAULT_PORT`].
    pub fn new(panel: Arc<TurtlePanel>) -> Self {
        Self {
            panel,
            port: DEFAULT_PORT,
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start the server. Each connection is dispatched as either a
    /// WebSocket bridge (when the request carries `Upgrade: websocket`)
    /// or a plain HTTP response with the panel page.
    pub async fn run(self) -> Result<(), PanelError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| PanelError::Transport(format!("bind error on {addr}: {e}")))?;
        debug!(target: "turtleweb::server", port = self.port, "panel UI listening");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let panel = Arc::clone(&self.panel);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, panel).await {
                            warn!(target: "turtleweb::server", %peer, error = %e, "client error");
                        }
                    });
                }
                Err(e) => {
                    error!(target: "turtleweb::server", error = %e, "accept error");
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    panel: Arc<TurtlePanel>,
) -> Result<(), PanelError> {
    // Peek at the request head to decide between WebSocket upgrade and
    // static HTML. `peek` does not consume, so the handshaker still
    // sees the full HTTP request.
    let mut buf = [0u8; 1024];
    let n = stream
        .peek(&mut buf)
        .await
        .map_err(|e| PanelError::Transport(format!("peek error from {peer}: {e}")))?;

    let head = String::from_utf8_lossy(&buf[..n]);
    let is_ws_upgrade = head.lines().any(|line| {
        let line = line.to_lowercase();
        line.starts_with("upgrade:") && line.contains("websocket")
    });

    if is_ws_upgrade {
        handle_ws(stream, peer, panel).await
    } else {
        serve_html(stream).await
    }
}

async fn serve_html(mut stream: TcpStream) -> Result<(), PanelError> {
    let body = PANEL_HTML;
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    );
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| PanelError::Transport(format!("HTTP write error: {e}")))
}

async fn handle_ws(
    stream: TcpStream,
    peer: SocketAddr,
    panel: Arc<TurtlePanel>,
) -> Result<(), PanelError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| PanelError::Transport(format!("ws handshake from {peer}: {e}")))?;

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut state_rx = panel.subscribe_state();

    // Every fresh tab starts from the current snapshot.
    let initial = serde_json::to_string(&panel.state_snapshot())
        .map_err(|e| PanelError::Serialization(e.to_string()))?;
    if ws_tx.send(Message::Text(initial.into())).await.is_err() {
        return Ok(());
    }

    loop {
        tokio::select! {
            // ── Downstream: state store → browser ──────────────────────
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state_rx.borrow_and_update().clone();
                match serde_json::to_string(&snapshot) {
                    Ok(json) => {
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(target: "turtleweb::server", error = %e, "state serialization failed");
                    }
                }
            }
            // ── Upstream: browser → panel ──────────────────────────────
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = parse_widget_frame(text.as_str()) {
                            panel.handle_event(event).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

/// Validate one inbound browser frame into a [`WidgetEvent`].
///
/// Anything that does not parse as a known widget frame is dropped at
/// this boundary with a trace; handler logic never sees raw payloads.
pub(crate) fn parse_widget_frame(text: &str) -> Option<WidgetEvent> {
    match serde_json::from_str::<WidgetEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            trace!(target: "turtleweb::server", error = %e, "dropping unrecognised frame");
            None
        }
    }
}
