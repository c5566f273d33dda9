//! Standalone echo endpoint.
//!
//! Demonstrates:
//! - Binding the echo server on a fixed port
//! - Serving `/socket` until Ctrl+C
//!
//! Usage:
//!   cargo run --example echo_server
//!   cargo run --example echo_server -- --port 4000
//!   cargo run --example echo_server -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};

use common::Args;
use socket_feed::{EchoServer, Result};

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
    println!("=== Echo Server ===\n");

    let server = EchoServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), args.port).await?;
    println!("[Server] Listening on {}", server.ws_url());
    println!("        Point a client at this URL to get uppercase echoes\n");

    common::wait_for_exit(args.no_wait).await;

    server.shutdown();
    println!("\n[Server] Stopped");
    Ok(())
}
