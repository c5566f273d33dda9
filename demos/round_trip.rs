//! In-process round trip against the echo server.
//!
//! Demonstrates:
//! - Starting the echo server on a random port
//! - Subscribing to client events
//! - Sending values and reading the rendered log
//!
//! Usage:
//!   cargo run --example round_trip
//!   cargo run --example round_trip -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use common::Args;
use socket_feed::{ClientEvent, ConnectionManager, EchoServer, MemoryPresenter, Result};

// ============================================================================
// Constants
// ============================================================================

const VALUES: &[&str] = &["hello", "reconnecting feed", "done"];

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== Round Trip ===\n");

    // ========================================================================
    // Start Server
    // ========================================================================

    let server = EchoServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
    println!("[Server] Listening on {}", server.ws_url());

    // ========================================================================
    // Connect Client
    // ========================================================================

    let presenter = MemoryPresenter::new();
    let client = ConnectionManager::builder()
        .endpoint(server.ws_url())
        .presenter(presenter.clone())
        .build()?;

    let mut events = client.subscribe();
    client.connect();

    wait_until(&mut events, |e| matches!(e, ClientEvent::Opened { .. })).await?;
    println!("[Client] Open indicator shown: {}\n", presenter.shows_open());

    // ========================================================================
    // Send and Receive
    // ========================================================================

    for value in VALUES {
        println!("[Send]   {value}");
        client.try_send(*value)?;
        wait_until(&mut events, |e| matches!(e, ClientEvent::Message { .. })).await?;
    }

    println!("\n[Log]");
    for line in presenter.lines() {
        println!("        {line}");
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    client.shutdown();
    server.shutdown();
    println!("\n[Done]   Closed indicator shown: {}", presenter.shows_closed());
    Ok(())
}

/// Waits for the first event matching `predicate`.
async fn wait_until(
    events: &mut tokio::sync::broadcast::Receiver<ClientEvent>,
    predicate: impl Fn(&ClientEvent) -> bool,
) -> Result<()> {
    let wait = async {
        while let Ok(event) = events.recv().await {
            if predicate(&event) {
                return Ok(());
            }
        }
        Err(socket_feed::Error::ConnectionClosed)
    };

    tokio::time::timeout(STEP_TIMEOUT, wait)
        .await
        .map_err(|_| socket_feed::Error::connection_timeout(STEP_TIMEOUT))?
}
