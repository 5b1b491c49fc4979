//! Length-Framed Chat Server - Entry Point
//!
//! Binds every port given on the command line, one room per port, and
//! accepts connections until Ctrl-C.

use std::env;

use futures_util::future::join_all;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use frame_chat::{listener, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=frame_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frame_chat=info")),
        )
        .init();

    let config = ServerConfig::from_args(env::args().skip(1))?;

    let mut listeners = Vec::with_capacity(config.ports.len());
    for port in &config.ports {
        let listener = TcpListener::bind(("0.0.0.0", *port)).await?;
        info!("Chat server listening on port {}", port);
        listeners.push(listener);
    }

    let rooms = join_all(
        listeners
            .into_iter()
            .map(|l| listener::serve(l, config.queue_depth)),
    );

    tokio::select! {
        _ = rooms => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown requested");
        }
    }

    Ok(())
}
