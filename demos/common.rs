//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Graceful exit handling

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Port the echo server demo binds to.
pub const DEFAULT_PORT: u16 = 3000;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub no_wait: bool,
    pub port: u16,
    pub endpoint: Option<String>,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// Recognizes `--debug`, `--no-wait`, `--port <n>` and `--endpoint <url>`.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
            port: value_of("--port")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            endpoint: value_of("--endpoint"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "socket_feed=debug"
    } else {
        "socket_feed=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Wait for Ctrl+C or skip if `--no-wait` flag is set.
pub async fn wait_for_exit(no_wait: bool) {
    if no_wait {
        println!("[--no-wait] Skipping wait");
        return;
    }

    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await.ok();
}
