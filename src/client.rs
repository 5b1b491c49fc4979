//! Chat client
//!
//! Connects to a server, sends `bindname` / `chat` commands and hands every
//! received room-info record to a caller-supplied sink.

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::frame::{self, Message, MessageType};
use crate::message::{BindName, ChatInfo, Payload, RoomInfo};

/// Parse one input line of the form `<command> <rest-of-line>`
///
/// Returns `None` for lines without a command, or with an unknown one.
pub fn parse_command(line: &str) -> Option<Message> {
    let (command, rest) = match line.find(' ') {
        Some(0) | None => return None,
        Some(pos) => (&line[..pos], &line[pos + 1..]),
    };

    let encoded = match command {
        "bindname" => BindName {
            name: rest.to_string(),
        }
        .to_message(),
        "chat" => ChatInfo {
            information: rest.to_string(),
        }
        .to_message(),
        _ => return None,
    };

    match encoded {
        Ok(msg) => Some(msg),
        Err(e) => {
            warn!("Failed to encode command '{}': {}", command, e);
            None
        }
    }
}

/// Render a room-info record for display
pub fn format_room_info(info: &RoomInfo) -> String {
    let time = chrono::DateTime::from_timestamp_millis(info.time)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| info.time.to_string());
    format!(
        "{}  client: '{}' says: '{}'",
        time, info.name, info.information
    )
}

/// Connected chat client
///
/// Outbound messages go through an unbounded FIFO drained by one writer
/// task; inbound frames are read by a reader task.
pub struct ChatClient {
    outbound: mpsc::UnboundedSender<Message>,
    writer: JoinHandle<Result<(), AppError>>,
    reader: JoinHandle<()>,
}

impl ChatClient {
    /// Connect and start the reader and writer tasks
    ///
    /// `on_room_info` is called for every decoded room-info frame, in
    /// arrival order.
    pub async fn connect<A, F>(addr: A, mut on_room_info: F) -> Result<Self, AppError>
    where
        A: ToSocketAddrs,
        F: FnMut(RoomInfo) + Send + 'static,
    {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (mut read_half, mut write_half) = stream.into_split();

        let (outbound, mut queue) = mpsc::unbounded_channel::<Message>();

        let writer = tokio::spawn(async move {
            while let Some(msg) = queue.recv().await {
                frame::write_message(&mut write_half, &msg).await?;
            }
            write_half.shutdown().await?;
            Ok::<(), AppError>(())
        });

        let reader = tokio::spawn(async move {
            loop {
                let msg = match frame::read_message(&mut read_half).await {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!("Reader stopped: {}", e);
                        break;
                    }
                };
                match msg.message_type() {
                    Some(MessageType::RoomInfo) => match RoomInfo::from_message(&msg) {
                        Ok(info) => on_room_info(info),
                        Err(e) => warn!("Invalid room info from server: {}", e),
                    },
                    _ => debug!("Ignoring frame with type tag {}", msg.type_tag()),
                }
            }
        });

        Ok(Self {
            outbound,
            writer,
            reader,
        })
    }

    /// Queue a message for sending
    pub fn write(&self, msg: Message) -> Result<(), AppError> {
        self.outbound.send(msg).map_err(|_| AppError::ChannelSend)
    }

    /// Flush queued messages, shut down the write side and stop reading
    pub async fn close(self) -> Result<(), AppError> {
        drop(self.outbound);
        let result = match self.writer.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Writer task failed: {}", e);
                Ok(())
            }
        };
        self.reader.abort();
        result
    }
}
