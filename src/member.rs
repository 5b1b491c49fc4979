//! Member struct definition
//!
//! The room-side registration handle for one session: its id and the
//! sending end of its outbound queue. The room never owns the session itself.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::frame::Message;
use crate::types::SessionId;

/// Joined session as seen by the room
#[derive(Debug)]
pub struct Member {
    /// Unique identifier for the session
    pub id: SessionId,
    /// Room → Session outbound queue
    pub sender: mpsc::Sender<Message>,
}

impl Member {
    /// Create a new member with the given ID and queue sender
    pub fn new(id: SessionId, sender: mpsc::Sender<Message>) -> Self {
        Self { id, sender }
    }

    /// Enqueue a message onto this member's outbound queue
    ///
    /// Never waits: a full queue means the session is not keeping up.
    pub fn deliver(&self, msg: Message) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}
