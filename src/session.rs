//! Connection session
//!
//! Drives one connection: registers it with the room, runs the inbound
//! framing state machine and drains the outbound queue.
//!
//! Inbound frames are handled strictly in order:
//! `AwaitingHeader → AwaitingBody → Dispatching → AwaitingHeader`, with
//! `Closed` reachable from every state. Outbound frames go through a bounded
//! mpsc queue drained by a single writer task, so at most one write is in
//! flight and frames reach the peer in enqueue order.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::frame::{self, Header, Message, MessageType, HEADER_SIZE, MAX_BODY_LENGTH};
use crate::message::{BindName, ChatInfo, Payload, RoomInfo};
use crate::server::RoomCommand;
use crate::types::SessionId;

/// Outbound queue depth per session; must hold a full history replay
pub const DEFAULT_OUTBOUND_QUEUE_DEPTH: usize = 256;

/// Inbound state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Waiting for exactly `HEADER_SIZE` bytes
    AwaitingHeader,
    /// Waiting for exactly the declared body
    AwaitingBody(Header),
    /// A whole frame is in the read buffer
    Dispatching,
    /// Terminal
    Closed,
}

/// Per-connection inbound state
///
/// Owned by the task driving the connection; the room only ever sees the
/// session id and the sending end of its outbound queue.
pub struct Session {
    id: SessionId,
    /// Display name, empty until a bind-name frame arrives
    name: String,
    room: mpsc::Sender<RoomCommand>,
    /// Read buffer reused across header and body phases
    read_msg: Message,
    state: ReadState,
}

impl Session {
    /// Create a session bound to a room's command channel
    pub fn new(id: SessionId, room: mpsc::Sender<RoomCommand>) -> Self {
        Self {
            id,
            name: String::new(),
            room,
            read_msg: Message::empty(),
            state: ReadState::AwaitingHeader,
        }
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current inbound state
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Run the inbound state machine until the session closes
    ///
    /// A clean close by the peer between frames returns `Ok(())`. Framing
    /// and transport errors close the session and are returned.
    pub async fn run<R>(&mut self, reader: &mut R) -> Result<(), AppError>
    where
        R: AsyncRead + Unpin,
    {
        while self.state != ReadState::Closed {
            match self.step(reader).await {
                Ok(next) => self.state = next,
                Err(e) => {
                    self.state = ReadState::Closed;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Advance one state
    async fn step<R>(&mut self, reader: &mut R) -> Result<ReadState, AppError>
    where
        R: AsyncRead + Unpin,
    {
        match self.state {
            ReadState::AwaitingHeader => {
                let buf = self.read_msg.header_mut();
                let mut filled = 0;
                while filled < HEADER_SIZE {
                    let n = reader.read(&mut buf[filled..]).await?;
                    if n == 0 {
                        if filled == 0 {
                            debug!("Session {} closed by peer", self.id);
                            return Ok(ReadState::Closed);
                        }
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            format!("connection closed after {} header bytes", filled),
                        )
                        .into());
                    }
                    filled += n;
                }
                let header = self.read_msg.decode_header()?;
                Ok(ReadState::AwaitingBody(header))
            }
            ReadState::AwaitingBody(_) => {
                reader.read_exact(self.read_msg.body_mut()).await?;
                Ok(ReadState::Dispatching)
            }
            ReadState::Dispatching => {
                self.dispatch().await?;
                Ok(ReadState::AwaitingHeader)
            }
            ReadState::Closed => Ok(ReadState::Closed),
        }
    }

    /// Interpret the frame in the read buffer
    ///
    /// Payload decode failures are logged and the frame is dropped. Only a
    /// lost room is fatal here.
    async fn dispatch(&mut self) -> Result<(), AppError> {
        match self.read_msg.message_type() {
            Some(MessageType::BindName) => match BindName::from_message(&self.read_msg) {
                Ok(bind) => {
                    info!("Session {} bound name '{}'", self.id, bind.name);
                    self.name = bind.name;
                }
                Err(e) => {
                    warn!("Invalid bind-name payload from {}: {}", self.id, e);
                }
            },
            Some(MessageType::ChatInfo) => {
                let chat = match ChatInfo::from_message(&self.read_msg) {
                    Ok(chat) => chat,
                    Err(e) => {
                        warn!("Invalid chat payload from {}: {}", self.id, e);
                        return Ok(());
                    }
                };
                let info = RoomInfo::now(self.name.clone(), chat.information);
                let message = match info.to_message() {
                    Ok(message) => message,
                    Err(e) => {
                        error!("Failed to encode room info: {}", e);
                        return Ok(());
                    }
                };
                if message.body_length() > MAX_BODY_LENGTH as usize {
                    warn!(
                        "Dropping chat from {}: room info body is {} bytes (max {})",
                        self.id,
                        message.body_length(),
                        MAX_BODY_LENGTH
                    );
                    return Ok(());
                }
                self.room
                    .send(RoomCommand::Deliver { message })
                    .await
                    .map_err(|_| AppError::ChannelSend)?;
            }
            _ => {
                debug!(
                    "Ignoring frame with type tag {} from {}",
                    self.read_msg.type_tag(),
                    self.id
                );
            }
        }
        Ok(())
    }
}

/// Handle a new connection with the default outbound queue depth
pub async fn handle_connection<S>(
    stream: S,
    cmd_tx: mpsc::Sender<RoomCommand>,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    handle_connection_with_depth(stream, cmd_tx, DEFAULT_OUTBOUND_QUEUE_DEPTH).await
}

/// Handle a new connection
///
/// Joins the room, then races the inbound state machine against the write
/// loop. Whichever ends first closes the session; the session always leaves
/// the room before returning.
pub async fn handle_connection_with_depth<S>(
    stream: S,
    cmd_tx: mpsc::Sender<RoomCommand>,
    queue_depth: usize,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let session_id = SessionId::new();
    let (mut reader, writer) = tokio::io::split(stream);

    // Create the outbound queue; the room holds the only sender
    let (msg_tx, msg_rx) = mpsc::channel::<Message>(queue_depth);

    if cmd_tx
        .send(RoomCommand::Join {
            session_id,
            sender: msg_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register session {} - room closed", session_id);
        return Err(AppError::ChannelSend);
    }

    let mut write_task = tokio::spawn(write_loop(writer, msg_rx));
    let mut session = Session::new(session_id, cmd_tx.clone());

    let result = tokio::select! {
        read = session.run(&mut reader) => {
            debug!("Read loop completed for {}", session_id);
            read
        }
        write = &mut write_task => {
            debug!("Write loop completed for {}", session_id);
            match write {
                Ok(result) => result,
                Err(e) => {
                    error!("Write task for {} failed: {}", session_id, e);
                    Ok(())
                }
            }
        }
    };
    write_task.abort();

    let _ = cmd_tx
        .send(RoomCommand::Leave {
            session_id: session.id(),
            name: session.name().to_string(),
        })
        .await;

    info!("Session {} disconnected", session_id);
    result
}

/// Drain the outbound queue one frame at a time
///
/// Ends when the room drops its sender or a write fails.
async fn write_loop<W>(mut writer: W, mut queue: mpsc::Receiver<Message>) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = queue.recv().await {
        frame::write_message(&mut writer, &msg).await?;
    }
    let _ = writer.shutdown().await;
    Ok(())
}
