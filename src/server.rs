//! Room actor implementation
//!
//! One actor per listening port owns that port's [`Room`]. Sessions talk to
//! it only through [`RoomCommand`]s on an mpsc channel, so join, leave and
//! deliver are applied one at a time in the order they arrive.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::frame::Message;
use crate::member::Member;
use crate::room::Room;
use crate::types::SessionId;

/// Commands sent from sessions to the room actor
#[derive(Debug)]
pub enum RoomCommand {
    /// Session entered the room
    Join {
        session_id: SessionId,
        sender: mpsc::Sender<Message>,
    },
    /// Session closed
    Leave {
        session_id: SessionId,
        name: String,
    },
    /// Broadcast a message to every member
    Deliver { message: Message },
}

/// The room actor
///
/// Processes commands from sessions until every sender is dropped.
pub struct RoomServer {
    /// Membership and history
    room: Room,
    /// Command receiver channel
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomServer {
    /// Create a room actor with the default history bound
    pub fn new(receiver: mpsc::Receiver<RoomCommand>) -> Self {
        Self::with_room(Room::default(), receiver)
    }

    /// Create a room actor around an existing room
    pub fn with_room(room: Room, receiver: mpsc::Receiver<RoomCommand>) -> Self {
        Self { room, receiver }
    }

    /// Run the room event loop
    ///
    /// Returns the room when the last command sender is dropped.
    pub async fn run(mut self) -> Room {
        info!("Room started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("Room shutting down");
        self.room
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { session_id, sender } => {
                self.handle_join(session_id, sender);
            }
            RoomCommand::Leave { session_id, name } => {
                self.handle_leave(session_id, &name);
            }
            RoomCommand::Deliver { message } => {
                self.handle_deliver(message);
            }
        }
    }

    fn handle_join(&mut self, session_id: SessionId, sender: mpsc::Sender<Message>) {
        match self.room.join(Member::new(session_id, sender)) {
            Ok(replayed) => {
                info!(
                    "Session {} joined the room ({} recent messages replayed)",
                    session_id, replayed
                );
            }
            Err(e) => {
                warn!("Session {} could not join: {}", session_id, e);
            }
        }
        debug!("Members: {}", self.room.member_count());
    }

    fn handle_leave(&mut self, session_id: SessionId, name: &str) {
        let who = if name.is_empty() { "no name" } else { name };
        if self.room.leave(session_id) {
            info!("Session {} ({}) left the room", session_id, who);
        } else {
            debug!("Session {} ({}) was not in the room", session_id, who);
        }
        debug!("Members: {}", self.room.member_count());
    }

    fn handle_deliver(&mut self, message: Message) {
        let evicted = self.room.deliver(message);
        if !evicted.is_empty() {
            info!("Evicted {} session(s) during delivery", evicted.len());
        }
        debug!(
            "Delivered to {} members, history {}",
            self.room.member_count(),
            self.room.recent_len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MessageType;
    use crate::message::{Payload, RoomInfo};

    #[tokio::test]
    async fn test_commands_are_applied_in_order() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let actor = tokio::spawn(RoomServer::new(cmd_rx).run());

        let first = Message::new(MessageType::RoomInfo, b"1");
        let second = Message::new(MessageType::RoomInfo, b"2");

        cmd_tx
            .send(RoomCommand::Deliver {
                message: first.clone(),
            })
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let session_id = SessionId::new();
        cmd_tx
            .send(RoomCommand::Join {
                session_id,
                sender: tx,
            })
            .await
            .unwrap();
        cmd_tx
            .send(RoomCommand::Deliver {
                message: second.clone(),
            })
            .await
            .unwrap();
        cmd_tx
            .send(RoomCommand::Leave {
                session_id,
                name: String::new(),
            })
            .await
            .unwrap();
        drop(cmd_tx);

        let room = actor.await.unwrap();
        assert_eq!(room.member_count(), 0);
        assert_eq!(room.recent_len(), 2);

        assert_eq!(rx.recv().await, Some(first));
        assert_eq!(rx.recv().await, Some(second));
        // the room's sender was dropped on leave
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_two_members_one_chat() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let actor = tokio::spawn(RoomServer::new(cmd_rx).run());

        let mut receivers = Vec::new();
        for _ in 0..2 {
            let (tx, rx) = mpsc::channel(16);
            cmd_tx
                .send(RoomCommand::Join {
                    session_id: SessionId::new(),
                    sender: tx,
                })
                .await
                .unwrap();
            receivers.push(rx);
        }

        let info = RoomInfo {
            name: "alice".to_string(),
            information: "hi".to_string(),
            time: 1_700_000_000_000,
        };
        cmd_tx
            .send(RoomCommand::Deliver {
                message: info.to_message().unwrap(),
            })
            .await
            .unwrap();
        drop(cmd_tx);

        let room = actor.await.unwrap();
        assert_eq!(room.recent_len(), 1);
        assert_eq!(room.member_count(), 2);

        for rx in &mut receivers {
            let msg = rx.try_recv().unwrap();
            assert_eq!(RoomInfo::from_message(&msg).unwrap(), info);
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_leave_unknown_session_is_noop() {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let actor = tokio::spawn(RoomServer::new(cmd_rx).run());

        cmd_tx
            .send(RoomCommand::Leave {
                session_id: SessionId::new(),
                name: "ghost".to_string(),
            })
            .await
            .unwrap();
        drop(cmd_tx);

        let room = actor.await.unwrap();
        assert_eq!(room.member_count(), 0);
    }
}
