//! Error types for the chat server
//!
//! Defines connection-level errors and member enqueue errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Framing and transport errors are fatal to the connection they occur on.
/// Payload errors are logged by the session and the connection stays open.
#[derive(Debug, Error)]
pub enum AppError {
    /// Transport error, including peer close (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header declared a body larger than the maximum (fatal)
    #[error("Bad frame: body length {body_length} exceeds maximum {max}")]
    BadFrame { body_length: u32, max: u32 },

    /// Payload body failed to parse as its expected record
    #[error("Payload decode error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Frame carried a different type tag than the record expects
    #[error("Unexpected message type: expected {expected}, got {actual}")]
    UnexpectedType { expected: i32, actual: i32 },

    /// Channel send error (fatal - room actor gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Port argument could not be parsed
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// Wrong command line
    #[error("Usage: {0}")]
    Usage(String),
}

/// Member enqueue errors
///
/// Occurs when a message cannot be placed on a session's outbound queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The outbound queue is at capacity (slow consumer)
    #[error("Outbound queue full")]
    QueueFull,
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
