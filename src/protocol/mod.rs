//! Protocol module - message envelopes, struct frames, application exceptions.
//!
//! The tracker only depends on the narrow framing contract expressed by
//! [`InputProtocol`] and [`OutputProtocol`]: begin/end a message envelope,
//! move one struct frame, flush. [`BinaryInputProtocol`] and
//! [`BinaryOutputProtocol`] implement it over tokio streams.

mod binary;
mod exception;
mod wire_format;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::MsgPackCodec;
use crate::error::Result;

pub use binary::{BinaryInputProtocol, BinaryOutputProtocol, ProtocolConfig};
pub use exception::{ApplicationErrorKind, ApplicationException};
pub use wire_format::{
    encode_struct_frame, parse_version_word, version_word, MessageIdentifier, MessageType,
    DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_STRUCT_SIZE, STRUCT_PREFIX_SIZE, VERSION_1,
};

/// Reading side of the RPC framing contract.
#[async_trait]
pub trait InputProtocol: Send {
    /// Read a message envelope.
    async fn read_message_begin(&mut self) -> Result<MessageIdentifier>;

    /// Finish reading a message.
    async fn read_message_end(&mut self) -> Result<()>;

    /// Read one struct frame body.
    async fn read_struct_frame(&mut self) -> Result<Bytes>;
}

/// Writing side of the RPC framing contract.
#[async_trait]
pub trait OutputProtocol: Send {
    /// Write a message envelope.
    async fn write_message_begin(&mut self, ident: &MessageIdentifier) -> Result<()>;

    /// Finish writing a message.
    async fn write_message_end(&mut self) -> Result<()>;

    /// Write one struct frame body.
    async fn write_struct_frame(&mut self, body: &[u8]) -> Result<()>;

    /// Push everything written so far to the peer.
    async fn flush(&mut self) -> Result<()>;
}

/// Decode one struct frame into `T`.
pub async fn read_struct<T>(iprot: &mut dyn InputProtocol) -> Result<T>
where
    T: DeserializeOwned,
{
    let body = iprot.read_struct_frame().await?;
    MsgPackCodec::decode(&body)
}

/// Write a complete `Exception` message carrying `exception`, then flush.
pub async fn write_exception_reply(
    oprot: &mut dyn OutputProtocol,
    name: &str,
    seq_id: i32,
    exception: &ApplicationException,
) -> Result<()> {
    oprot
        .write_message_begin(&MessageIdentifier::new(name, MessageType::Exception, seq_id))
        .await?;
    write_struct(oprot, exception).await?;
    oprot.write_message_end().await?;
    oprot.flush().await
}

/// Encode `value` as one struct frame.
pub async fn write_struct<T>(oprot: &mut dyn OutputProtocol, value: &T) -> Result<()>
where
    T: Serialize + Sync,
{
    let body = MsgPackCodec::encode(value)?;
    oprot.write_struct_frame(&body).await
}
