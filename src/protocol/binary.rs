//! Binary protocol over tokio streams.
//!
//! [`BinaryOutputProtocol`] accumulates a whole message in a `BytesMut`
//! buffer and hands it to the writer in a single `write_all` on
//! [`flush`](OutputProtocol::flush). [`BinaryInputProtocol`] reads fields
//! straight off the stream.
//!
//! # Example
//!
//! ```
//! use rpc_tracker::protocol::{
//!     BinaryInputProtocol, BinaryOutputProtocol, InputProtocol, MessageIdentifier,
//!     MessageType, OutputProtocol,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> rpc_tracker::Result<()> {
//! let (a, b) = tokio::io::duplex(1024);
//! let mut oprot = BinaryOutputProtocol::new(a);
//! let mut iprot = BinaryInputProtocol::new(b);
//!
//! oprot
//!     .write_message_begin(&MessageIdentifier::new("ping", MessageType::Call, 1))
//!     .await?;
//! oprot.write_message_end().await?;
//! oprot.flush().await?;
//!
//! let ident = iprot.read_message_begin().await?;
//! assert_eq!(ident.name, "ping");
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::wire_format::{
    decode_name, encode_struct_frame, parse_version_word, validate_name_length,
    validate_struct_size, MessageIdentifier, DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_STRUCT_SIZE,
};
use super::{InputProtocol, OutputProtocol};
use crate::error::Result;

/// Limits and checks applied by the binary protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Maximum struct frame body size in bytes.
    pub max_struct_size: u32,
    /// Maximum method name length in bytes.
    pub max_name_length: u32,
    /// Require the envelope version marker on read.
    pub strict_read: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_struct_size: DEFAULT_MAX_STRUCT_SIZE,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            strict_read: true,
        }
    }
}

impl ProtocolConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum struct frame body size.
    pub fn max_struct_size(mut self, size: u32) -> Self {
        self.max_struct_size = size;
        self
    }

    /// Set the maximum method name length.
    pub fn max_name_length(mut self, len: u32) -> Self {
        self.max_name_length = len;
        self
    }

    /// Enable or disable strict envelope version checking.
    pub fn strict_read(mut self, strict: bool) -> Self {
        self.strict_read = strict;
        self
    }
}

/// Reading half of the binary protocol.
pub struct BinaryInputProtocol<R> {
    reader: R,
    config: ProtocolConfig,
}

impl<R> BinaryInputProtocol<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Wrap a reader with the default configuration.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ProtocolConfig::default())
    }

    /// Wrap a reader with a custom configuration.
    pub fn with_config(reader: R, config: ProtocolConfig) -> Self {
        Self { reader, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[async_trait]
impl<R> InputProtocol for BinaryInputProtocol<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_message_begin(&mut self) -> Result<MessageIdentifier> {
        let word = self.reader.read_u32().await?;
        let message_type = parse_version_word(word, self.config.strict_read)?;

        let name_len = self.reader.read_u32().await?;
        validate_name_length(name_len, self.config.max_name_length)?;
        let mut raw = vec![0u8; name_len as usize];
        self.reader.read_exact(&mut raw).await?;
        let name = decode_name(raw)?;

        let seq_id = self.reader.read_i32().await?;
        Ok(MessageIdentifier {
            name,
            message_type,
            seq_id,
        })
    }

    async fn read_message_end(&mut self) -> Result<()> {
        Ok(())
    }

    async fn read_struct_frame(&mut self) -> Result<Bytes> {
        let len = self.reader.read_u32().await? as usize;
        validate_struct_size(len, self.config.max_struct_size)?;
        let mut body = BytesMut::zeroed(len);
        self.reader.read_exact(&mut body).await?;
        Ok(body.freeze())
    }
}

/// Writing half of the binary protocol.
pub struct BinaryOutputProtocol<W> {
    writer: W,
    buffer: BytesMut,
    config: ProtocolConfig,
}

impl<W> BinaryOutputProtocol<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a writer with the default configuration.
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, ProtocolConfig::default())
    }

    /// Wrap a writer with a custom configuration.
    pub fn with_config(writer: W, config: ProtocolConfig) -> Self {
        Self {
            writer,
            buffer: BytesMut::with_capacity(4 * 1024),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Bytes written but not yet flushed.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Unwrap the underlying writer, dropping unflushed bytes.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> OutputProtocol for BinaryOutputProtocol<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_message_begin(&mut self, ident: &MessageIdentifier) -> Result<()> {
        validate_name_length(ident.name.len() as u32, self.config.max_name_length)?;
        ident.encode_into(&mut self.buffer);
        Ok(())
    }

    async fn write_message_end(&mut self) -> Result<()> {
        Ok(())
    }

    async fn write_struct_frame(&mut self, body: &[u8]) -> Result<()> {
        validate_struct_size(body.len(), self.config.max_struct_size)?;
        encode_struct_frame(&mut self.buffer, body);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            let out = self.buffer.split();
            self.writer.write_all(&out).await?;
        }
        self.writer.flush().await?;
        Ok(())
    }
}
