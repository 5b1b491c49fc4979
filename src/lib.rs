//! Length-Framed TCP Chat Broadcast Library
//!
//! A chat broker over plain TCP. Every message is a fixed 8-byte header
//! (body length + type tag) followed by its body. Each listening port has one
//! room that broadcasts chat lines to every connected session and replays
//! its last 100 messages to newcomers.
//!
//! # Features
//! - Two-phase frame reads with a 1460-byte body limit
//! - Display name binding
//! - Room-wide chat broadcast with recent-history replay
//! - Ordered per-session outbound queues with slow-consumer eviction
//! - Multiple ports, one room each
//! - Interactive line-based client
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `RoomServer` is the per-port actor owning membership and history
//! - Each connection has a `session` task communicating with its room
//! - No locks needed - all room state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use frame_chat::listener;
//! use frame_chat::session::DEFAULT_OUTBOUND_QUEUE_DEPTH;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("0.0.0.0:9000").await.unwrap();
//!     listener::serve(listener, DEFAULT_OUTBOUND_QUEUE_DEPTH).await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod listener;
pub mod member;
pub mod message;
pub mod room;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use client::{parse_command, ChatClient};
pub use config::{ClientConfig, ServerConfig};
pub use error::{AppError, SendError};
pub use frame::{Header, Message, MessageType, HEADER_SIZE, MAX_BODY_LENGTH};
pub use member::Member;
pub use message::{BindName, ChatInfo, Payload, RoomInfo};
pub use room::{Room, MAX_RECENT_MESSAGES};
pub use server::{RoomCommand, RoomServer};
pub use session::{handle_connection, Session};
pub use types::SessionId;
