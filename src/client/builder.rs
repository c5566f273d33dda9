//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating
//! [`ConnectionManager`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use socket_feed::{ConnectionManager, MemoryPresenter};
//!
//! # fn example() -> socket_feed::Result<()> {
//! let presenter = MemoryPresenter::new();
//! let client = ConnectionManager::builder()
//!     .endpoint("ws://127.0.0.1:3000/socket")
//!     .presenter(presenter.clone())
//!     .retry_delay(Duration::from_secs(5))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::presenter::{Presenter, TracingPresenter};
use crate::retry::{FixedDelay, RetryPolicy};
use crate::transport::{Connector, WsConnector};

use super::manager::{ClientConfig, ConnectionManager};

// ============================================================================
// Constants
// ============================================================================

/// Endpoint the echo server listens on by default.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:3000/socket";

/// Events buffered per subscriber before the slowest one starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`ConnectionManager`].
///
/// Use [`ConnectionManager::builder()`] to create a new builder.
///
/// | Setting | Default |
/// |---------|---------|
/// | `endpoint` | required |
/// | `connector` | [`WsConnector`] with `connect_timeout` |
/// | `presenter` | [`TracingPresenter`] |
/// | `retry` | [`FixedDelay`], 5000 ms, unbounded |
/// | `event_capacity` | [`EVENT_CHANNEL_CAPACITY`] |
#[derive(Default)]
pub struct ClientBuilder {
    /// Endpoint URL as given.
    endpoint: Option<String>,
    /// Transport connector.
    connector: Option<Arc<dyn Connector>>,
    /// Presentation hooks.
    presenter: Option<Arc<dyn Presenter>>,
    /// Reconnect policy.
    retry: Option<Box<dyn RetryPolicy>>,
    /// Timeout for the default WebSocket connector.
    connect_timeout: Option<Duration>,
    /// Broadcast channel capacity.
    event_capacity: Option<usize>,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint URL (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the transport connector.
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Sets the presentation hooks.
    #[inline]
    #[must_use]
    pub fn presenter(mut self, presenter: impl Presenter) -> Self {
        self.presenter = Some(Arc::new(presenter));
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn retry(mut self, policy: impl RetryPolicy) -> Self {
        self.retry = Some(Box::new(policy));
        self
    }

    /// Uses an unbounded fixed-delay reconnect policy.
    #[inline]
    #[must_use]
    pub fn retry_delay(self, delay: Duration) -> Self {
        self.retry(FixedDelay::new(delay))
    }

    /// Sets the connect timeout of the default WebSocket connector.
    ///
    /// Ignored when a custom connector is set.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    /// Sets the event channel capacity.
    #[inline]
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the endpoint is missing, unparsable, or not `ws`/`wss`
    /// - [`Error::Config`] if the event capacity or connect timeout is zero
    pub fn build(self) -> Result<ConnectionManager> {
        let endpoint = self.validate_endpoint()?;
        let event_capacity = self.validate_event_capacity()?;
        let connector = self.resolve_connector()?;

        Ok(ConnectionManager::new(ClientConfig {
            endpoint,
            connector,
            presenter: self
                .presenter
                .unwrap_or_else(|| Arc::new(TracingPresenter)),
            retry: self
                .retry
                .unwrap_or_else(|| Box::new(FixedDelay::default())),
            event_capacity,
        }))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the endpoint configuration.
    fn validate_endpoint(&self) -> Result<Url> {
        let raw = self.endpoint.as_deref().ok_or_else(|| {
            Error::config(format!(
                "Endpoint is required. Use .endpoint() to set it.\n\
                 Example: ConnectionManager::builder().endpoint(\"{DEFAULT_ENDPOINT}\")"
            ))
        })?;

        let url = Url::parse(raw)
            .map_err(|e| Error::config(format!("Invalid endpoint '{raw}': {e}")))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "Endpoint scheme must be ws or wss, got '{}'",
                url.scheme()
            )));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::config(format!("Endpoint '{raw}' has no host")));
        }

        Ok(url)
    }

    /// Validates the event channel capacity.
    fn validate_event_capacity(&self) -> Result<usize> {
        match self.event_capacity {
            Some(0) => Err(Error::config("Event capacity must be greater than zero")),
            Some(capacity) => Ok(capacity),
            None => Ok(EVENT_CHANNEL_CAPACITY),
        }
    }

    /// Picks the configured connector or builds the WebSocket one.
    fn resolve_connector(&self) -> Result<Arc<dyn Connector>> {
        if let Some(connector) = &self.connector {
            return Ok(Arc::clone(connector));
        }

        let mut connector = WsConnector::new();
        if let Some(connect_timeout) = self.connect_timeout {
            if connect_timeout.is_zero() {
                return Err(Error::config("Connect timeout must be greater than zero"));
            }
            connector = connector.with_connect_timeout(connect_timeout);
        }
        Ok(Arc::new(connector))
    }
}

// ============================================================================
// Tests
// ============================================================================
