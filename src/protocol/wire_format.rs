//! Wire format encoding and decoding.
//!
//! Message envelope (strict binary form):
//! ```text
//! ┌──────────────────┬──────────┬───────────┬──────────┐
//! │ Version | Type   │ Name len │ Name      │ Seq ID   │
//! │ 4 bytes          │ 4 bytes  │ N bytes   │ 4 bytes  │
//! │ int32 BE         │ uint32 BE│ UTF-8     │ int32 BE │
//! └──────────────────┴──────────┴───────────┴──────────┘
//! ```
//!
//! Struct frame:
//! ```text
//! ┌──────────┬──────────────────┐
//! │ Length   │ MsgPack body     │
//! │ uint32 BE│ Length bytes     │
//! └──────────┴──────────────────┘
//! ```
//!
//! Message end carries no bytes. All multi-byte integers are Big Endian.

use bytes::{BufMut, BytesMut};

use crate::error::{Result, TrackerError};

/// Protocol version marker in the upper 16 bits of the first envelope word.
pub const VERSION_1: u32 = 0x8001_0000;

/// Mask selecting the version marker.
pub const VERSION_MASK: u32 = 0xffff_0000;

/// Mask selecting the message type.
pub const TYPE_MASK: u32 = 0x0000_00ff;

/// Size of the struct frame length prefix.
pub const STRUCT_PREFIX_SIZE: usize = 4;

/// Default maximum struct frame body (16 MiB).
pub const DEFAULT_MAX_STRUCT_SIZE: u32 = 16 * 1024 * 1024;

/// Default maximum method name length in bytes.
pub const DEFAULT_MAX_NAME_LENGTH: u32 = 1024;

/// Kind of an RPC message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Request expecting a reply.
    Call = 1,
    /// Normal reply to a call.
    Reply = 2,
    /// Reply carrying an application exception.
    Exception = 3,
    /// Request without a reply.
    Oneway = 4,
}

impl TryFrom<u8> for MessageType {
    type Error = TrackerError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(MessageType::Call),
            2 => Ok(MessageType::Reply),
            3 => Ok(MessageType::Exception),
            4 => Ok(MessageType::Oneway),
            other => Err(TrackerError::Protocol(format!(
                "Unknown message type {}",
                other
            ))),
        }
    }
}

/// Decoded message envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIdentifier {
    /// Method name.
    pub name: String,
    /// Message kind.
    pub message_type: MessageType,
    /// Sequence identifier chosen by the caller.
    pub seq_id: i32,
}

impl MessageIdentifier {
    /// Create a new envelope.
    pub fn new(name: impl Into<String>, message_type: MessageType, seq_id: i32) -> Self {
        Self {
            name: name.into(),
            message_type,
            seq_id,
        }
    }

    /// Number of bytes this envelope occupies on the wire.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        4 + 4 + self.name.len() + 4
    }

    /// Encode the envelope onto the end of `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.put_u32(version_word(self.message_type));
        buf.put_u32(self.name.len() as u32);
        buf.put_slice(self.name.as_bytes());
        buf.put_i32(self.seq_id);
    }
}

/// Build the first envelope word for a message type.
#[inline]
pub fn version_word(message_type: MessageType) -> u32 {
    VERSION_1 | message_type as u32
}

/// Validate the first envelope word and extract the message type.
///
/// In strict mode the version marker must be exactly [`VERSION_1`].
pub fn parse_version_word(word: u32, strict: bool) -> Result<MessageType> {
    if strict && word & VERSION_MASK != VERSION_1 {
        return Err(TrackerError::Protocol(format!(
            "Bad envelope version 0x{:08x}",
            word & VERSION_MASK
        )));
    }
    MessageType::try_from((word & TYPE_MASK) as u8)
}

/// Check a method name length against the configured limit.
pub fn validate_name_length(len: u32, max_name_length: u32) -> Result<()> {
    if len > max_name_length {
        return Err(TrackerError::Protocol(format!(
            "Method name length {} exceeds maximum {}",
            len, max_name_length
        )));
    }
    Ok(())
}

/// Check a struct frame body length against the configured limit.
pub fn validate_struct_size(len: usize, max_struct_size: u32) -> Result<()> {
    if len > max_struct_size as usize {
        return Err(TrackerError::Protocol(format!(
            "Struct size {} exceeds maximum {}",
            len, max_struct_size
        )));
    }
    Ok(())
}

/// Turn raw name bytes into a method name.
pub fn decode_name(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw)
        .map_err(|_| TrackerError::Protocol("Method name is not valid UTF-8".to_string()))
}

/// Append a length-prefixed struct frame to `buf`.
pub fn encode_struct_frame(buf: &mut BytesMut, body: &[u8]) {
    buf.reserve(STRUCT_PREFIX_SIZE + body.len());
    buf.put_u32(body.len() as u32);
    buf.put_slice(body);
}
