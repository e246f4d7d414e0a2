//! Application exceptions.
//!
//! An application exception is a protocol-level error frame, distinct from a
//! transport error. It travels as the body of an `Exception` message and
//! carries a machine-readable [`ApplicationErrorKind`] plus a message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable application error codes.
///
/// The numeric values are fixed for wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ApplicationErrorKind {
    /// Unclassified failure.
    Unknown,
    /// The peer does not implement the method.
    UnknownMethod,
    /// Unexpected message type.
    InvalidMessageType,
    /// Reply carried a different method name.
    WrongMethodName,
    /// Reply carried a different sequence id.
    BadSequenceId,
    /// Reply had no result.
    MissingResult,
    /// Peer-side internal error.
    InternalError,
    /// Malformed request body.
    ProtocolError,
    /// Unsupported transform.
    InvalidTransform,
    /// Unsupported protocol.
    InvalidProtocol,
    /// Unsupported client type.
    UnsupportedClientType,
}

impl ApplicationErrorKind {
    /// Numeric wire code.
    pub fn code(self) -> i32 {
        match self {
            ApplicationErrorKind::Unknown => 0,
            ApplicationErrorKind::UnknownMethod => 1,
            ApplicationErrorKind::InvalidMessageType => 2,
            ApplicationErrorKind::WrongMethodName => 3,
            ApplicationErrorKind::BadSequenceId => 4,
            ApplicationErrorKind::MissingResult => 5,
            ApplicationErrorKind::InternalError => 6,
            ApplicationErrorKind::ProtocolError => 7,
            ApplicationErrorKind::InvalidTransform => 8,
            ApplicationErrorKind::InvalidProtocol => 9,
            ApplicationErrorKind::UnsupportedClientType => 10,
        }
    }
}

impl From<i32> for ApplicationErrorKind {
    fn from(code: i32) -> Self {
        match code {
            1 => ApplicationErrorKind::UnknownMethod,
            2 => ApplicationErrorKind::InvalidMessageType,
            3 => ApplicationErrorKind::WrongMethodName,
            4 => ApplicationErrorKind::BadSequenceId,
            5 => ApplicationErrorKind::MissingResult,
            6 => ApplicationErrorKind::InternalError,
            7 => ApplicationErrorKind::ProtocolError,
            8 => ApplicationErrorKind::InvalidTransform,
            9 => ApplicationErrorKind::InvalidProtocol,
            10 => ApplicationErrorKind::UnsupportedClientType,
            _ => ApplicationErrorKind::Unknown,
        }
    }
}

impl From<ApplicationErrorKind> for i32 {
    fn from(kind: ApplicationErrorKind) -> Self {
        kind.code()
    }
}

/// A protocol-level error frame with a code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationException {
    /// Error code.
    #[serde(rename = "type", default = "unknown_kind")]
    pub kind: ApplicationErrorKind,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

fn unknown_kind() -> ApplicationErrorKind {
    ApplicationErrorKind::Unknown
}

impl ApplicationException {
    /// Create a new application exception.
    pub fn new(kind: ApplicationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApplicationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            write!(f, "{:?}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ApplicationException {}
