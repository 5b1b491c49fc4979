//! Payload records carried inside frame bodies
//!
//! JSON-encoded records using Serde derives. Each record type is bound to
//! its type tag through the [`Payload`] trait; the framing layer never looks
//! inside a body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::frame::{Message, MessageType};

/// Stateless encode/decode between a record and a tagged frame
pub trait Payload: Serialize + DeserializeOwned {
    /// Type tag frames of this record carry
    const TYPE: MessageType;

    /// Encode into a new frame tagged with `Self::TYPE`.
    fn to_message(&self) -> Result<Message, AppError> {
        let body = serde_json::to_vec(self)?;
        Ok(Message::new(Self::TYPE, &body))
    }

    /// Decode a frame body, checking the type tag first.
    fn from_message(msg: &Message) -> Result<Self, AppError> {
        if msg.type_tag() != Self::TYPE.tag() {
            return Err(AppError::UnexpectedType {
                expected: Self::TYPE.tag(),
                actual: msg.type_tag(),
            });
        }
        Ok(serde_json::from_slice(msg.body())?)
    }
}

/// Client → Server: bind a display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindName {
    pub name: String,
}

impl Payload for BindName {
    const TYPE: MessageType = MessageType::BindName;
}

/// Client → Server: chat text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInfo {
    pub information: String,
}

impl Payload for ChatInfo {
    const TYPE: MessageType = MessageType::ChatInfo;
}

/// Server → Client: one broadcast chat line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Sender's display name (may be empty)
    pub name: String,
    /// Chat text
    pub information: String,
    /// Server time in epoch milliseconds
    pub time: i64,
}

impl Payload for RoomInfo {
    const TYPE: MessageType = MessageType::RoomInfo;
}

impl RoomInfo {
    /// Build a record stamped with the current time
    pub fn now(name: impl Into<String>, information: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            information: information.into(),
            time: epoch_millis(),
        }
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
