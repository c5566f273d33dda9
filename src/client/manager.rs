//! Connection manager and event loop.
//!
//! The manager keeps one connection to a fixed endpoint alive for as long
//! as it runs.
//!
//! # Event Loop
//!
//! [`ConnectionManager::connect`] spawns a single tokio task that owns the
//! current session, the retry policy and the retry timer. It handles:
//!
//! - Session open: indicators flip to "open"
//! - Inbound frames: decoded and rendered in arrival order, bad ones dropped
//! - Outbound values: sent while open, dropped otherwise
//! - Session close: indicators flip to "closed", one retry is scheduled
//! - Shutdown: live session closed, pending retry cancelled
//!
//! Every handle talks to the task over a command channel, so presenter
//! calls and state changes never race each other.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::presenter::{self, Presenter};
use crate::protocol::{OutboundValue, decode_inbound};
use crate::retry::RetryPolicy;
use crate::transport::{Connector, Session};

use super::builder::ClientBuilder;
use super::event::{ClientEvent, ConnectionState};

// ============================================================================
// ClientConfig
// ============================================================================

/// Validated settings handed over by [`ClientBuilder::build`].
pub(crate) struct ClientConfig {
    pub(crate) endpoint: Url,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) presenter: Arc<dyn Presenter>,
    pub(crate) retry: Box<dyn RetryPolicy>,
    pub(crate) event_capacity: usize,
}

// ============================================================================
// ManagerCommand
// ============================================================================

/// Internal commands for the event loop.
#[derive(Debug)]
enum ManagerCommand {
    /// Send a value if the session is open.
    Send(OutboundValue),
    /// Close the current session and reconnect as usual.
    Disconnect,
    /// Stop for good.
    Shutdown,
}

// ============================================================================
// Shared State
// ============================================================================

/// Snapshot published by the event loop.
#[derive(Debug, Clone, Copy)]
struct Status {
    state: ConnectionState,
    connection: Option<ConnectionId>,
}

/// Parts the event loop takes when it starts.
struct Startup {
    commands: mpsc::UnboundedReceiver<ManagerCommand>,
    retry: Box<dyn RetryPolicy>,
}

/// State shared between handles and the event loop.
struct Shared {
    endpoint: Url,
    connector: Arc<dyn Connector>,
    presenter: Arc<dyn Presenter>,
    status: RwLock<Status>,
    events: broadcast::Sender<ClientEvent>,
    /// Present until the event loop starts (or the manager stops first).
    startup: Mutex<Option<Startup>>,
}

impl Shared {
    fn set_status(&self, state: ConnectionState, connection: Option<ConnectionId>) {
        *self.status.write() = Status { state, connection };
    }

    fn emit(&self, event: ClientEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn presenter(&self) -> &dyn Presenter {
        self.presenter.as_ref()
    }
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Reconnecting connection to a single endpoint.
///
/// # Thread Safety
///
/// `ConnectionManager` is `Send + Sync` and cheap to clone; clones drive
/// the same connection. All operations return immediately. Once every
/// handle is dropped the event loop shuts itself down.
///
/// # Example
///
/// ```no_run
/// use socket_feed::{ConnectionManager, WriterPresenter};
///
/// # async fn example() -> socket_feed::Result<()> {
/// let client = ConnectionManager::builder()
///     .endpoint("ws://127.0.0.1:3000/socket")
///     .presenter(WriterPresenter::new(std::io::stdout()))
///     .build()?;
///
/// client.connect();
/// client.send("hello");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionManager {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ManagerCommand>,
    /// State shared with the event loop.
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn new(config: ClientConfig) -> Self {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity);

        let shared = Arc::new(Shared {
            endpoint: config.endpoint,
            connector: config.connector,
            presenter: config.presenter,
            status: RwLock::new(Status {
                state: ConnectionState::Idle,
                connection: None,
            }),
            events,
            startup: Mutex::new(Some(Startup {
                commands,
                retry: config.retry,
            })),
        });

        Self { command_tx, shared }
    }

    /// Starts connecting.
    ///
    /// Spawns the event loop on the current tokio runtime and returns
    /// immediately. Failures show up later as closes followed by retries.
    /// Calling this again while running, or after a stop, does nothing.
    pub fn connect(&self) {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "connect() called outside a tokio runtime");
                return;
            }
        };

        let Some(startup) = self.shared.startup.lock().take() else {
            debug!(state = %self.state(), "connect() ignored, event loop already started");
            return;
        };

        self.shared.set_status(ConnectionState::Connecting, None);
        runtime.spawn(run_event_loop(
            Arc::clone(&self.shared),
            startup.commands,
            startup.retry,
        ));
    }

    /// Sends a text value if the connection is open.
    ///
    /// The value is encoded as a JSON string. While not open it is dropped
    /// without error. The presenter's input is cleared either way.
    pub fn send(&self, value: impl Into<OutboundValue>) {
        let value = value.into();
        if self.command_tx.send(ManagerCommand::Send(value)).is_err() {
            debug!("Send dropped, event loop gone");
        }
        self.shared.presenter().clear_input();
    }

    /// Sends a text value, reporting when the connection is not open.
    ///
    /// The check happens at call time; if the session closes before the
    /// value reaches it the value is still dropped.
    ///
    /// # Errors
    ///
    /// - [`Error::Stopped`] if the manager has stopped
    /// - [`Error::NotConnected`] if the connection is not open
    pub fn try_send(&self, value: impl Into<OutboundValue>) -> Result<()> {
        match self.state() {
            ConnectionState::Open => {}
            ConnectionState::Stopped => return Err(Error::Stopped),
            _ => return Err(Error::NotConnected),
        }

        self.command_tx
            .send(ManagerCommand::Send(value.into()))
            .map_err(|_| Error::Stopped)?;
        self.shared.presenter().clear_input();
        Ok(())
    }

    /// Closes the current session; the manager reconnects after the delay.
    pub fn disconnect(&self) {
        let _ = self.command_tx.send(ManagerCommand::Disconnect);
    }

    /// Stops the manager.
    ///
    /// Closes the live session, cancels a pending retry and moves to
    /// [`ConnectionState::Stopped`]. The manager cannot be restarted.
    pub fn shutdown(&self) {
        // Not started yet: stop in place.
        if self.shared.startup.lock().take().is_some() {
            stop(&self.shared);
            return;
        }
        let _ = self.command_tx.send(ManagerCommand::Shutdown);
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.status.read().state
    }

    /// Returns `true` if the connection is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Returns the id of the current or most recent session.
    #[inline]
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.shared.status.read().connection
    }

    /// Returns the endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.shared.endpoint
    }

    /// Subscribes to lifecycle events.
    ///
    /// Only events emitted after subscribing are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.shared.events.subscribe()
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// How a phase of the loop ended.
enum Outcome {
    /// Carry on with the retry cycle.
    Continue,
    /// Shutdown requested or every handle dropped.
    Stop,
}

/// How an open session ended.
enum SessionEnd {
    /// Remote close, transport error, or local disconnect.
    Closed(Option<String>),
    /// Shutdown requested or every handle dropped.
    Stop,
}

/// Event loop that owns the connection.
async fn run_event_loop(
    shared: Arc<Shared>,
    mut commands: mpsc::UnboundedReceiver<ManagerCommand>,
    mut retry: Box<dyn RetryPolicy>,
) {
    debug!(endpoint = %shared.endpoint, "Event loop started");
    presenter::show_closed(shared.presenter());

    // Consecutive closes since the last successful open.
    let mut attempt: u32 = 0;

    loop {
        let id = ConnectionId::next();
        shared.set_status(ConnectionState::Connecting, Some(id));
        shared.emit(ClientEvent::Connecting { id });
        debug!(%id, endpoint = %shared.endpoint, "Connecting");

        let Some(result) = connect_once(&shared, id, &mut commands).await else {
            break;
        };

        let reason = match result {
            Ok(session) => {
                on_open(&shared, id);
                retry.reset();
                attempt = 0;

                match run_session(&shared, id, session, &mut commands).await {
                    SessionEnd::Closed(reason) => reason,
                    SessionEnd::Stop => {
                        on_close(&shared, id, Some("shutdown".to_string()));
                        break;
                    }
                }
            }
            Err(e) => {
                warn!(%id, error = %e, "Connection attempt failed");
                Some(e.to_string())
            }
        };

        on_close(&shared, id, reason);

        attempt = attempt.saturating_add(1);
        let Some(delay) = retry.next_delay(attempt) else {
            info!(attempt, "Retry policy gave up");
            break;
        };

        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        info!(attempt, delay_ms, "Reconnecting after delay");
        shared.emit(ClientEvent::Reconnecting { attempt, delay });

        if let Outcome::Stop = wait_for_retry(delay, &mut commands).await {
            break;
        }
    }

    stop(&shared);
    debug!("Event loop terminated");
}

/// Runs one connect attempt, serving commands meanwhile.
///
/// Returns `None` if the manager should stop.
async fn connect_once(
    shared: &Shared,
    id: ConnectionId,
    commands: &mut mpsc::UnboundedReceiver<ManagerCommand>,
) -> Option<Result<Session>> {
    let mut attempt = shared.connector.connect(&shared.endpoint);

    loop {
        tokio::select! {
            result = &mut attempt => return Some(result),

            command = commands.recv() => {
                if let Outcome::Stop = handle_offline_command(command, "connecting") {
                    debug!(%id, "Connect attempt abandoned");
                    return None;
                }
            }
        }
    }
}

/// Serves one open session until it ends.
async fn run_session(
    shared: &Shared,
    id: ConnectionId,
    session: Session,
    commands: &mut mpsc::UnboundedReceiver<ManagerCommand>,
) -> SessionEnd {
    let Session {
        mut sink,
        mut stream,
    } = session;

    loop {
        tokio::select! {
            // Incoming frames from the server
            frame = stream.next() => match frame {
                Some(Ok(text)) => on_frame(shared, id, &text),

                Some(Err(Error::ConnectionClosed)) => {
                    debug!(%id, "Session closed by remote");
                    return SessionEnd::Closed(None);
                }

                Some(Err(e)) => {
                    warn!(%id, error = %e, "Session error");
                    return SessionEnd::Closed(Some(e.to_string()));
                }

                None => {
                    debug!(%id, "Session stream ended");
                    return SessionEnd::Closed(None);
                }
            },

            // Commands from handles
            command = commands.recv() => match command {
                Some(ManagerCommand::Send(value)) => {
                    let payload = match value.encode() {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(%id, error = %e, "Failed to encode outbound value");
                            continue;
                        }
                    };

                    if let Err(e) = sink.send(payload).await {
                        warn!(%id, error = %e, "Failed to send frame");
                        return SessionEnd::Closed(Some(e.to_string()));
                    }
                    trace!(%id, "Frame sent");
                }

                Some(ManagerCommand::Disconnect) => {
                    debug!(%id, "Disconnect requested");
                    let _ = sink.close().await;
                    return SessionEnd::Closed(Some("disconnected locally".to_string()));
                }

                Some(ManagerCommand::Shutdown) | None => {
                    debug!(%id, "Shutdown received");
                    let _ = sink.close().await;
                    return SessionEnd::Stop;
                }
            }
        }
    }
}

/// Waits out the retry delay, serving commands meanwhile.
async fn wait_for_retry(
    delay: std::time::Duration,
    commands: &mut mpsc::UnboundedReceiver<ManagerCommand>,
) -> Outcome {
    let timer = sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            () = &mut timer => return Outcome::Continue,

            command = commands.recv() => {
                if let Outcome::Stop = handle_offline_command(command, "waiting to reconnect") {
                    return Outcome::Stop;
                }
            }
        }
    }
}

/// Handles a command while no session is open.
fn handle_offline_command(command: Option<ManagerCommand>, phase: &str) -> Outcome {
    match command {
        Some(ManagerCommand::Send(_)) => {
            debug!(phase, "Outbound value dropped, not connected");
            Outcome::Continue
        }
        Some(ManagerCommand::Disconnect) => Outcome::Continue,
        Some(ManagerCommand::Shutdown) | None => Outcome::Stop,
    }
}

// ============================================================================
// Lifecycle Handlers
// ============================================================================

/// Session reported itself open.
fn on_open(shared: &Shared, id: ConnectionId) {
    shared.set_status(ConnectionState::Open, Some(id));
    presenter::show_open(shared.presenter());
    info!(%id, endpoint = %shared.endpoint, "Connection open");
    shared.emit(ClientEvent::Opened { id });
}

/// One inbound text frame.
fn on_frame(shared: &Shared, id: ConnectionId, text: &str) {
    trace!(%id, len = text.len(), "Frame in");

    match decode_inbound(text) {
        Ok(message) => {
            shared.presenter().append_line(message.render());
            shared.emit(ClientEvent::Message { id, message });
        }
        Err(e) => {
            warn!(%id, error = %e, "Dropping undecodable frame");
            shared.emit(ClientEvent::FrameDropped {
                id,
                reason: e.to_string(),
            });
        }
    }
}

/// Session ended or the attempt failed.
fn on_close(shared: &Shared, id: ConnectionId, reason: Option<String>) {
    shared.set_status(ConnectionState::Closed, Some(id));
    presenter::show_closed(shared.presenter());
    info!(%id, reason = reason.as_deref().unwrap_or("none"), "Connection closed");
    shared.emit(ClientEvent::Closed { id, reason });
}

/// Moves to the terminal state.
fn stop(shared: &Shared) {
    let connection = shared.status.read().connection;
    shared.set_status(ConnectionState::Stopped, connection);
    presenter::show_closed(shared.presenter());
    info!("Connection manager stopped");
    shared.emit(ClientEvent::Stopped);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use proptest::prelude::*;
    use tokio::time::{Instant, timeout};

    use crate::presenter::MemoryPresenter;
    use crate::retry::{DEFAULT_RETRY_DELAY, FixedDelay};
    use crate::server::EchoServer;
    use crate::transport::{MemoryAcceptor, MemoryConnector, MemoryPeer};

    const ENDPOINT: &str = "ws://memory/socket";

    struct Harness {
        client: ConnectionManager,
        presenter: MemoryPresenter,
        connector: MemoryConnector,
        acceptor: MemoryAcceptor,
        events: broadcast::Receiver<ClientEvent>,
    }

    fn harness_with(policy: impl RetryPolicy) -> Harness {
        let (connector, acceptor) = MemoryConnector::new();
        let presenter = MemoryPresenter::new();
        let client = ConnectionManager::builder()
            .endpoint(ENDPOINT)
            .connector(connector.clone())
            .presenter(presenter.clone())
            .retry(policy)
            .build()
            .expect("build");
        let events = client.subscribe();

        Harness {
            client,
            presenter,
            connector,
            acceptor,
            events,
        }
    }

    fn harness() -> Harness {
        harness_with(FixedDelay::default())
    }

    impl Harness {
        async fn accept(&mut self) -> MemoryPeer {
            self.acceptor.accept().await.expect("session")
        }

        /// Waits for the first event matching `pred`, skipping others.
        async fn wait_for(&mut self, pred: impl Fn(&ClientEvent) -> bool) -> ClientEvent {
            loop {
                let event = self.events.recv().await.expect("event");
                if pred(&event) {
                    return event;
                }
            }
        }

        async fn wait_open(&mut self) {
            self.wait_for(|e| matches!(e, ClientEvent::Opened { .. })).await;
        }

        async fn wait_closed(&mut self) {
            self.wait_for(|e| matches!(e, ClientEvent::Closed { .. })).await;
        }

        async fn wait_message(&mut self) -> String {
            match self
                .wait_for(|e| matches!(e, ClientEvent::Message { .. }))
                .await
            {
                ClientEvent::Message { message, .. } => message.render(),
                _ => unreachable!(),
            }
        }
    }

    #[tokio::test]
    async fn test_open_flips_indicators() {
        let mut h = harness();
        h.client.connect();

        let _peer = h.accept().await;
        h.wait_open().await;

        assert!(h.presenter.shows_open());
        assert!(h.client.is_open());
        assert!(h.client.connection_id().is_some());
    }

    #[tokio::test]
    async fn test_renders_message_line() {
        let mut h = harness();
        h.client.connect();

        let peer = h.accept().await;
        peer.send_text(r#"{"formatted":"Message A","received":"12:00:01"}"#);

        assert_eq!(h.wait_message().await, "Message A (12:00:01)");
        assert_eq!(h.presenter.lines(), vec!["Message A (12:00:01)".to_string()]);
    }

    #[tokio::test]
    async fn test_bad_frames_dropped_without_stopping() {
        let mut h = harness();
        h.client.connect();

        let peer = h.accept().await;
        peer.send_text("{oops");
        peer.send_text(r#"{"formatted":"no marker"}"#);
        peer.send_text(r#"{"formatted":"ok","received":1}"#);

        let malformed = h
            .wait_for(|e| matches!(e, ClientEvent::FrameDropped { .. }))
            .await;
        assert!(matches!(
            malformed,
            ClientEvent::FrameDropped { ref reason, .. } if reason.starts_with("Malformed frame")
        ));

        let schema = h
            .wait_for(|e| matches!(e, ClientEvent::FrameDropped { .. }))
            .await;
        assert!(matches!(
            schema,
            ClientEvent::FrameDropped { ref reason, .. } if reason.starts_with("Schema mismatch")
        ));

        assert_eq!(h.wait_message().await, "ok (1)");
        assert_eq!(h.presenter.lines().len(), 1);
        assert!(h.client.is_open());
    }

    #[tokio::test]
    async fn test_send_while_open_emits_one_frame() {
        let mut h = harness();
        h.client.connect();

        let mut peer = h.accept().await;
        h.wait_open().await;

        h.client.send("hello");

        let payload = peer.recv_text().await.expect("frame");
        let decoded: String = serde_json::from_str(&payload).expect("json string");
        assert_eq!(decoded, "hello");
        assert!(peer.try_recv_text().is_none());
        assert_eq!(h.presenter.inputs_cleared(), 1);
    }

    #[tokio::test]
    async fn test_send_empty_value() {
        let mut h = harness();
        h.client.connect();

        let mut peer = h.accept().await;
        h.wait_open().await;

        h.client.send("");
        assert_eq!(peer.recv_text().await.as_deref(), Some(r#""""#));
    }

    #[test]
    fn test_send_clears_input_on_caller() {
        // No runtime and no event loop: the hook still runs before send returns.
        let h = harness();
        h.client.send("typed");
        assert_eq!(h.presenter.inputs_cleared(), 1);
        assert!(h.presenter.lines().is_empty());
    }

    #[tokio::test]
    async fn test_try_send_reports_not_connected() {
        let h = harness();

        let err = h.client.try_send("early").unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_closed_is_dropped() {
        let mut h = harness();
        h.client.connect();

        let peer = h.accept().await;
        h.wait_open().await;
        peer.close();
        h.wait_closed().await;

        // Silently dropped, input still cleared.
        h.client.send("lost");
        assert_eq!(h.presenter.inputs_cleared(), 1);
        assert!(matches!(h.client.try_send("lost"), Err(Error::NotConnected)));

        // The next session does not get the dropped value.
        let mut next = h.accept().await;
        h.wait_open().await;
        h.client.send("kept");
        assert_eq!(next.recv_text().await.as_deref(), Some(r#""kept""#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_fixed_delay() {
        let mut h = harness();
        h.client.connect();

        let peer = h.accept().await;
        h.wait_open().await;

        peer.close();
        h.wait_closed().await;
        let closed_at = Instant::now();
        assert!(h.presenter.shows_closed());

        // Closed for the whole wait.
        tokio::time::sleep(DEFAULT_RETRY_DELAY - Duration::from_millis(1)).await;
        assert_eq!(h.client.state(), ConnectionState::Closed);
        assert!(h.presenter.shows_closed());
        assert_eq!(h.connector.attempts(), 1);

        let _peer = h.accept().await;
        assert!(closed_at.elapsed() >= DEFAULT_RETRY_DELAY);
        assert_eq!(h.connector.attempts(), 2);

        h.wait_open().await;
        assert!(h.presenter.shows_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_loop_repeats() {
        let mut h = harness();
        h.client.connect();

        let mut closed_at: Option<Instant> = None;
        for round in 1..=5 {
            let peer = h.accept().await;
            if let Some(closed_at) = closed_at {
                assert!(closed_at.elapsed() >= DEFAULT_RETRY_DELAY);
            }
            h.wait_open().await;

            // Exactly one new attempt per close.
            assert_eq!(h.connector.attempts(), round);

            closed_at = Some(Instant::now());
            peer.close();

            let event = h
                .wait_for(|e| matches!(e, ClientEvent::Reconnecting { .. }))
                .await;
            assert_eq!(
                event,
                ClientEvent::Reconnecting {
                    attempt: 1,
                    delay: DEFAULT_RETRY_DELAY,
                }
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connects_retry_forever() {
        let mut h = harness();
        h.connector.refuse_connections(true);
        h.client.connect();

        for attempt in 1..=20 {
            let event = h
                .wait_for(|e| matches!(e, ClientEvent::Reconnecting { .. }))
                .await;
            assert_eq!(
                event,
                ClientEvent::Reconnecting {
                    attempt,
                    delay: DEFAULT_RETRY_DELAY,
                }
            );
            assert!(h.presenter.shows_closed());
        }

        h.connector.refuse_connections(false);
        let _peer = h.accept().await;
        h.wait_open().await;
        assert!(h.client.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_retry() {
        let mut h = harness();
        h.client.connect();

        let peer = h.accept().await;
        h.wait_open().await;
        peer.close();
        h.wait_for(|e| matches!(e, ClientEvent::Reconnecting { .. }))
            .await;

        h.client.shutdown();
        h.wait_for(|e| matches!(e, ClientEvent::Stopped)).await;

        tokio::time::sleep(DEFAULT_RETRY_DELAY * 3).await;
        assert_eq!(h.connector.attempts(), 1);
        assert_eq!(h.client.state(), ConnectionState::Stopped);
        assert!(matches!(h.client.try_send("x"), Err(Error::Stopped)));
    }

    #[tokio::test]
    async fn test_shutdown_closes_live_session() {
        let mut h = harness();
        h.client.connect();

        let mut peer = h.accept().await;
        h.wait_open().await;

        h.client.shutdown();
        assert!(peer.recv_text().await.is_none());
        h.wait_for(|e| matches!(e, ClientEvent::Stopped)).await;
        assert!(h.presenter.shows_closed());
    }

    #[tokio::test]
    async fn test_shutdown_before_connect() {
        let h = harness();
        h.client.shutdown();
        assert_eq!(h.client.state(), ConnectionState::Stopped);

        h.client.connect();
        assert_eq!(h.client.state(), ConnectionState::Stopped);
        assert_eq!(h.connector.attempts(), 0);
    }

    #[tokio::test]
    async fn test_connect_twice_is_noop() {
        let mut h = harness();
        h.client.connect();
        h.client.connect();

        let _peer = h.accept().await;
        h.wait_open().await;
        assert_eq!(h.connector.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_policy_stops() {
        let mut h = harness_with(FixedDelay::new(Duration::from_millis(100)).with_max_attempts(2));
        h.connector.refuse_connections(true);
        h.client.connect();

        h.wait_for(|e| matches!(e, ClientEvent::Stopped)).await;
        // First attempt plus two retries.
        assert_eq!(h.connector.attempts(), 3);
        assert_eq!(h.client.state(), ConnectionState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_reconnects() {
        let mut h = harness();
        h.client.connect();

        let mut peer = h.accept().await;
        h.wait_open().await;

        h.client.disconnect();
        assert!(peer.recv_text().await.is_none());
        h.wait_closed().await;

        let _next = h.accept().await;
        h.wait_open().await;
        assert_eq!(h.connector.attempts(), 2);
    }

    #[tokio::test]
    async fn test_dropping_handles_stops_loop() {
        let mut h = harness();
        h.client.connect();

        let mut peer = h.accept().await;
        h.wait_open().await;

        let Harness {
            client, mut events, ..
        } = h;
        drop(client);
        assert!(peer.recv_text().await.is_none());

        loop {
            if events.recv().await.expect("event") == ClientEvent::Stopped {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_end_to_end_with_echo_server() {
        let server = EchoServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        let presenter = MemoryPresenter::new();
        let client = ConnectionManager::builder()
            .endpoint(server.ws_url())
            .presenter(presenter.clone())
            .build()
            .expect("build");
        let mut events = client.subscribe();
        client.connect();

        let wait = async {
            loop {
                match events.recv().await.expect("event") {
                    ClientEvent::Opened { .. } => client.send("hi"),
                    ClientEvent::Message { message, .. } => return message,
                    _ => {}
                }
            }
        };
        let message = timeout(Duration::from_secs(10), wait)
            .await
            .expect("echo within timeout");

        assert_eq!(message.formatted, "HI");
        assert!(message.received.as_datetime().is_some());
        let lines = presenter.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("HI ("));

        client.shutdown();
    }

    proptest! {
        #[test]
        fn prop_log_matches_arrival_order(texts in proptest::collection::vec("[a-zA-Z0-9 ]{0,12}", 0..24)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");

            let lines = rt.block_on(async {
                let mut h = harness();
                h.client.connect();
                let peer = h.accept().await;

                for (i, text) in texts.iter().enumerate() {
                    let frame = serde_json::json!({ "formatted": text, "received": i });
                    peer.send_text(frame.to_string());
                }
                for _ in &texts {
                    h.wait_message().await;
                }
                h.presenter.lines()
            });

            let expected: Vec<String> = texts
                .iter()
                .enumerate()
                .map(|(i, text)| format!("{text} ({i})"))
                .collect();
            prop_assert_eq!(lines, expected);
        }
    }
}
