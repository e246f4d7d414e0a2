//! Error types for rpc-tracker.

use thiserror::Error;

use crate::protocol::ApplicationException;

/// Main error type for all tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Wire-level protocol error (bad envelope, oversized frame, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Application exception, either detected locally or reported by the peer.
    #[error("Application exception: {0}")]
    Application(#[from] ApplicationException),
}

impl TrackerError {
    /// Returns the application exception carried by this error, if any.
    pub fn as_application(&self) -> Option<&ApplicationException> {
        match self {
            TrackerError::Application(x) => Some(x),
            _ => None,
        }
    }
}

/// Result type alias using TrackerError.
pub type Result<T> = std::result::Result<T, TrackerError>;
