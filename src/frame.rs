//! Frame codec
//!
//! Every frame on the wire is a fixed 8-byte header followed by the body:
//! ```text
//! ┌──────────────┬──────────────┬─────────────────────┐
//! │ Body length  │ Type tag     │ Body                │
//! │ 4 bytes u32  │ 4 bytes i32  │ body length bytes   │
//! └──────────────┴──────────────┴─────────────────────┘
//! ```
//!
//! Both header fields are big-endian. A header declaring a body longer than
//! [`MAX_BODY_LENGTH`] is rejected before any body byte is read.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::AppError;

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Maximum accepted body length (fits a single TCP segment payload).
pub const MAX_BODY_LENGTH: u32 = 1460;

/// Known type tags
///
/// Frames with any other tag are still valid frames; sessions ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageType {
    /// Client → Server: bind a display name to the session
    BindName = 1,
    /// Client → Server: chat text to broadcast
    ChatInfo = 2,
    /// Server → Client: broadcast record `{name, text, timestamp}`
    RoomInfo = 3,
}

impl MessageType {
    /// Look up a known type from its wire tag
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            1 => Some(Self::BindName),
            2 => Some(Self::ChatInfo),
            3 => Some(Self::RoomInfo),
            _ => None,
        }
    }

    /// Wire tag of this type
    pub fn tag(self) -> i32 {
        self as i32
    }
}

impl From<MessageType> for i32 {
    fn from(ty: MessageType) -> Self {
        ty.tag()
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Number of body bytes following the header.
    pub body_length: u32,
    /// Type tag selecting how the body is interpreted.
    pub type_tag: i32,
}

impl Header {
    /// Create a new header.
    pub fn new(body_length: u32, type_tag: i32) -> Self {
        Self {
            body_length,
            type_tag,
        }
    }

    /// Encode header to bytes (Big Endian).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.body_length.to_be_bytes());
        buf[4..8].copy_from_slice(&self.type_tag.to_be_bytes());
        buf
    }

    /// Decode header from exactly `HEADER_SIZE` bytes (Big Endian).
    ///
    /// Fails with [`AppError::BadFrame`] when the declared body length
    /// exceeds [`MAX_BODY_LENGTH`]. The body is never inspected.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Result<Self, AppError> {
        let header = Self {
            body_length: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            type_tag: i32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        };
        if header.body_length > MAX_BODY_LENGTH {
            return Err(AppError::BadFrame {
                body_length: header.body_length,
                max: MAX_BODY_LENGTH,
            });
        }
        Ok(header)
    }
}

/// One complete frame held contiguously in memory
///
/// The header and body share a single buffer so the whole frame can be
/// written in one call. Also used as the reusable read buffer of a session:
/// the header region is filled first, then the buffer is resized for the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: Header,
    data: Vec<u8>,
}

impl Message {
    /// Encode a frame from a type tag and raw body bytes.
    ///
    /// No length limit is enforced here; peers reject oversized bodies.
    pub fn new(type_tag: impl Into<i32>, body: &[u8]) -> Self {
        let header = Header::new(body.len() as u32, type_tag.into());
        let mut data = Vec::with_capacity(HEADER_SIZE + body.len());
        data.extend_from_slice(&header.encode());
        data.extend_from_slice(body);
        Self { header, data }
    }

    /// Empty read buffer sized for a header.
    pub fn empty() -> Self {
        Self {
            header: Header::default(),
            data: vec![0u8; HEADER_SIZE],
        }
    }

    /// Raw type tag from the header
    pub fn type_tag(&self) -> i32 {
        self.header.type_tag
    }

    /// Known message type, `None` for unrecognised tags
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_tag(self.header.type_tag)
    }

    /// Declared body length
    pub fn body_length(&self) -> usize {
        self.header.body_length as usize
    }

    /// Whole-frame length (header + body)
    pub fn length(&self) -> usize {
        HEADER_SIZE + self.body_length()
    }

    /// Decoded header
    pub fn header(&self) -> Header {
        self.header
    }

    /// Encoded header region
    pub fn header_bytes(&self) -> &[u8] {
        &self.data[..HEADER_SIZE]
    }

    /// Body region
    pub fn body(&self) -> &[u8] {
        &self.data[HEADER_SIZE..]
    }

    /// Whole frame as one contiguous region
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Shrink to the header region and expose it for reading into.
    pub(crate) fn header_mut(&mut self) -> &mut [u8] {
        self.data.resize(HEADER_SIZE, 0);
        &mut self.data[..HEADER_SIZE]
    }

    /// Decode the header region and validate the declared body length.
    pub(crate) fn decode_header(&mut self) -> Result<Header, AppError> {
        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&self.data[..HEADER_SIZE]);
        self.header = Header::decode(&raw)?;
        Ok(self.header)
    }

    /// Grow to the declared body length and expose the body for reading into.
    pub(crate) fn body_mut(&mut self) -> &mut [u8] {
        let len = self.length();
        self.data.resize(len, 0);
        &mut self.data[HEADER_SIZE..]
    }
}

/// Read one frame: exactly `HEADER_SIZE` bytes, then exactly the declared body.
///
/// Returns `BadFrame` without touching the body when the header is oversized.
pub async fn read_message<R>(reader: &mut R) -> Result<Message, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut msg = Message::empty();
    reader.read_exact(msg.header_mut()).await?;
    msg.decode_header()?;
    reader.read_exact(msg.body_mut()).await?;
    Ok(msg)
}

/// Write one whole frame as a single contiguous region.
pub async fn write_message<W>(writer: &mut W, msg: &Message) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(msg.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
