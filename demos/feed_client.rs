//! Interactive feed client.
//!
//! Demonstrates:
//! - Building a client with the stdout presenter
//! - Sending every stdin line as a value, empty lines included
//! - Automatic reconnect when the server goes away
//!
//! Start `echo_server` first, then:
//!   cargo run --example feed_client
//!   cargo run --example feed_client -- --endpoint ws://127.0.0.1:4000/socket
//!   cargo run --example feed_client -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use socket_feed::client::DEFAULT_ENDPOINT;
use socket_feed::{ConnectionManager, Result, WriterPresenter};
use tokio::io::{AsyncBufReadExt, BufReader};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Feed Client ===\n");

    let endpoint = args.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
    let client = ConnectionManager::builder()
        .endpoint(endpoint)
        .presenter(WriterPresenter::new(std::io::stdout()))
        .build()?;

    println!("[Client] Connecting to {endpoint}");
    println!("        Type a line and press Enter to send it\n");
    client.connect();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => client.send(line),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.shutdown();
    println!("\n[Client] Stopped");
    Ok(())
}
