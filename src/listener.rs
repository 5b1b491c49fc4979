//! Listener
//!
//! Binds a port, starts that port's room actor and accepts connections
//! forever. Per-connection failures never stop the accept loop.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::server::{RoomCommand, RoomServer};
use crate::session::handle_connection_with_depth;

/// Channel buffer size for room commands
pub const ROOM_COMMAND_BUFFER: usize = 256;

/// Start a room actor and return its command sender
pub fn spawn_room() -> mpsc::Sender<RoomCommand> {
    let (cmd_tx, cmd_rx) = mpsc::channel(ROOM_COMMAND_BUFFER);
    tokio::spawn(RoomServer::new(cmd_rx).run());
    cmd_tx
}

/// Accept connections on `listener`, each bound to this listener's room
pub async fn serve(listener: TcpListener, queue_depth: usize) {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let cmd_tx = spawn_room();
    info!("Room listening on {}", local);

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {} on {}", addr, local);
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                }
                let cmd_tx = cmd_tx.clone();

                // Spawn a session task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection_with_depth(stream, cmd_tx, queue_depth).await {
                        warn!("Connection {} closed with error: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection on {}: {}", local, e);
            }
        }
    }
}
