//! Echo WebSocket endpoint.
//!
//! The server the feed client is written against. It accepts WebSocket
//! connections on `/socket` and answers every text frame with an
//! [`EchoReply`]: the text, an upper-cased copy and the receipt time.
//!
//! # Connection Flow
//!
//! 1. `EchoServer::bind` - Bind to the address (port 0 for random) and
//!    start the accept loop
//! 2. Peer connects, handshake checks the request path
//! 3. One task per peer echoes frames until the peer goes away
//! 4. `EchoServer::shutdown` - Stop accepting and close every peer
//!
//! Peers are independent: nothing one peer sends reaches another.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};
use std::result::Result as StdResult;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::EchoReply;

// ============================================================================
// Constants
// ============================================================================

/// Request path the WebSocket endpoint is served on.
pub const SOCKET_PATH: &str = "/socket";

// ============================================================================
// EchoServer
// ============================================================================

/// A running echo endpoint.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use socket_feed::EchoServer;
///
/// let server = EchoServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000).await?;
/// println!("listening on {}", server.ws_url());
/// ```
#[derive(Debug)]
pub struct EchoServer {
    /// Address the listener is bound to.
    local_addr: SocketAddr,
    /// Flipped to `true` on shutdown.
    shutdown_tx: watch::Sender<bool>,
}

impl EchoServer {
    /// Binds the endpoint and starts accepting connections.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(accept_loop(listener, shutdown_rx));

        info!(%local_addr, "Echo server started");

        Ok(Self {
            local_addr,
            shutdown_tx,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://{ip}:{port}/socket`
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}{SOCKET_PATH}", self.local_addr)
    }

    /// Stops accepting connections and closes every open peer.
    pub fn shutdown(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!(local_addr = %self.local_addr, "Echo server shutting down");
        }
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Accept Loop
// ============================================================================

/// Background task that accepts new connections.
async fn accept_loop(listener: TcpListener, mut shutdown_rx: watch::Receiver<bool>) {
    debug!("Accept loop started");

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let shutdown_rx = shutdown_rx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_peer(stream, addr, shutdown_rx).await {
                            warn!(error = %e, %addr, "Peer handling failed");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Accept failed");
                }
            },

            _ = shutdown_rx.changed() => break,
        }
    }

    debug!("Accept loop terminated");
}

/// Rejects handshakes for any path other than [`SOCKET_PATH`].
fn check_path(request: &Request, response: Response) -> StdResult<Response, ErrorResponse> {
    let path = request.uri().path();
    if path == SOCKET_PATH {
        return Ok(response);
    }

    debug!(path, "Rejecting handshake for unknown path");
    let mut rejection = ErrorResponse::new(Some(format!("no WebSocket endpoint at {path}")));
    *rejection.status_mut() = StatusCode::NOT_FOUND;
    Err(rejection)
}

/// Echoes frames for one peer until it disconnects or the server stops.
async fn serve_peer(
    stream: TcpStream,
    addr: SocketAddr,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, check_path)
        .await
        .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

    info!(%addr, "Connection established");

    let (mut ws_write, mut ws_read) = ws_stream.split();

    let result = loop {
        if *shutdown_rx.borrow_and_update() {
            let _ = ws_write.close().await;
            break Ok(());
        }

        tokio::select! {
            message = ws_read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    trace!(%addr, len = text.len(), "Frame in");
                    let json = EchoReply::from_frame(text.as_str()).encode()?;
                    if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                        break Err(Error::WebSocket(e));
                    }
                }

                Some(Ok(Message::Close(_))) | None => break Ok(()),

                Some(Err(e)) => break Err(Error::WebSocket(e)),

                // Ignore Binary, Ping, Pong
                Some(Ok(_)) => {}
            },

            _ = shutdown_rx.changed() => {}
        }
    };

    info!(%addr, "Connection dropped");
    result
}

// ============================================================================
// Tests
// ============================================================================
