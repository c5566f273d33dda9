//! WebSocket client transport.
//!
//! Connects with `tokio_tungstenite::connect_async` and adapts the split
//! WebSocket stream into a text-only [`Session`]:
//!
//! - Text frames pass through
//! - Binary, Ping and Pong frames are skipped
//! - A Close frame or a socket error ends the session
//!
//! `wss://` endpoints use rustls with the webpki root store.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future;
use futures_util::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

use super::{Connector, Session};

// ============================================================================
// Constants
// ============================================================================

/// Default limit for TCP connect plus WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// WsConnector
// ============================================================================

/// Connector for `ws://` and `wss://` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct WsConnector {
    /// Limit for TCP connect plus handshake.
    connect_timeout: Duration,
}

impl WsConnector {
    /// Creates a connector with the default timeout.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub const fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Returns the connect timeout.
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the ring crypto provider unless one is already installed.
fn install_crypto_provider() {
    // Err means another provider won the race, which is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &Url) -> Result<Session> {
        if endpoint.scheme() == "wss" {
            install_crypto_provider();
        }

        let (ws_stream, response) = timeout(self.connect_timeout, connect_async(endpoint.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(self.connect_timeout))?
            .map_err(|e| Error::connection(format!("WebSocket handshake failed: {e}")))?;

        debug!(%endpoint, status = %response.status(), "WebSocket handshake completed");

        let (ws_write, ws_read) = ws_stream.split();

        let sink = ws_write.with(|text: String| {
            trace!(len = text.len(), "Frame out");
            future::ready(Ok::<_, Error>(Message::Text(text.into())))
        });

        let stream = ws_read.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),

                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by remote");
                    Some(Err(Error::ConnectionClosed))
                }

                Err(e) => Some(Err(Error::WebSocket(e))),

                // Ignore Binary, Ping, Pong
                Ok(_) => None,
            })
        });

        Ok(Session::new(Box::pin(sink), Box::pin(stream)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{IpAddr, Ipv4Addr};

    use crate::protocol::{OutboundValue, decode_inbound};
    use crate::server::EchoServer;

    #[test]
    fn test_default_timeout() {
        assert_eq!(WsConnector::default().connect_timeout(), DEFAULT_CONNECT_TIMEOUT);

        let connector = WsConnector::new().with_connect_timeout(Duration::from_secs(1));
        assert_eq!(connector.connect_timeout(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to find a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/socket")).expect("url");
        let result = WsConnector::new().connect(&url).await;

        let err = result.err().expect("connect should fail");
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_wss_attempts_tls_handshake() {
        // Plain TCP peer that hangs up, so the TLS handshake fails.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("addr").port();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let url = Url::parse(&format!("wss://127.0.0.1:{port}/socket")).expect("url");
        let err = WsConnector::new()
            .connect(&url)
            .await
            .err()
            .expect("connect should fail");

        assert!(err.is_connection_error());
        assert!(
            !err.to_string().contains("TLS support not compiled in"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_session_against_echo_server() {
        let server = EchoServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");
        let url = Url::parse(&server.ws_url()).expect("url");

        let mut session = WsConnector::new().connect(&url).await.expect("connect");

        let payload = OutboundValue::new("shout").encode().expect("encode");
        session.sink.send(payload).await.expect("send");

        let text = session
            .stream
            .next()
            .await
            .expect("frame")
            .expect("text frame");
        let msg = decode_inbound(&text).expect("decode");
        assert_eq!(msg.formatted, "SHOUT");
        assert_eq!(msg.original.as_deref(), Some("shout"));

        server.shutdown();
    }
}
