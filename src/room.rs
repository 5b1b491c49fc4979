//! Room struct definition
//!
//! Represents the broadcast domain of one listening port: the set of joined
//! sessions plus a bounded history of recently delivered messages.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::error::SendError;
use crate::frame::Message;
use crate::member::Member;
use crate::types::SessionId;

/// Number of delivered messages kept for replay to new members
pub const MAX_RECENT_MESSAGES: usize = 100;

/// Broadcast room
///
/// Not synchronized itself; the room actor owns it and applies commands one
/// at a time, which keeps membership and history changes serialized.
#[derive(Debug)]
pub struct Room {
    /// Joined members: SessionId -> Member
    members: HashMap<SessionId, Member>,
    /// Recently delivered messages, oldest first
    recent: VecDeque<Message>,
    /// History bound
    max_recent: usize,
}

impl Room {
    /// Create an empty room keeping at most `max_recent` messages
    pub fn new(max_recent: usize) -> Self {
        Self {
            members: HashMap::new(),
            recent: VecDeque::with_capacity(max_recent),
            max_recent,
        }
    }

    /// Add a member and replay the recent history to it in arrival order
    ///
    /// Returns the number of replayed messages. If the replay cannot be
    /// enqueued the member is never added and the error is returned.
    pub fn join(&mut self, member: Member) -> Result<usize, SendError> {
        let id = member.id;
        for msg in &self.recent {
            member.deliver(msg.clone())?;
        }
        self.members.insert(id, member);
        Ok(self.recent.len())
    }

    /// Remove a member. Returns false if it was not joined.
    pub fn leave(&mut self, id: SessionId) -> bool {
        self.members.remove(&id).is_some()
    }

    /// Record a message in the history and enqueue it to every member
    ///
    /// Members whose queue is full or closed are removed; their ids are
    /// returned. Dropping a member drops the room's end of its queue, which
    /// ends the session's write loop.
    pub fn deliver(&mut self, msg: Message) -> Vec<SessionId> {
        self.recent.push_back(msg.clone());
        while self.recent.len() > self.max_recent {
            self.recent.pop_front();
        }

        let mut evicted = Vec::new();
        for (id, member) in &self.members {
            match member.deliver(msg.clone()) {
                Ok(()) => {}
                Err(SendError::QueueFull) => {
                    warn!("Session {} is not keeping up, dropping it", id);
                    evicted.push(*id);
                }
                Err(SendError::ChannelClosed) => {
                    debug!("Session {} queue already closed", id);
                    evicted.push(*id);
                }
            }
        }
        for id in &evicted {
            self.members.remove(id);
        }
        evicted
    }

    /// Whether a session is currently joined
    pub fn contains(&self, id: SessionId) -> bool {
        self.members.contains_key(&id)
    }

    /// Number of joined members
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Recent history, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &Message> {
        self.recent.iter()
    }

    /// Number of messages in the recent history
    pub fn recent_len(&self) -> usize {
        self.recent.len()
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new(MAX_RECENT_MESSAGES)
    }
}
