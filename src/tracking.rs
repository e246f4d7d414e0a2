//! Tracking records exchanged on the wire.
//!
//! - [`UpgradeArgs`] / [`UpgradeReply`] - the handshake call and its reply
//! - [`RequestHeader`] / [`ResponseHeader`] - optional per-call metadata frames
//!
//! All records are plain data framed through [`TrackingStruct`], one
//! MessagePack struct frame each. Every field has a default so frames from
//! peers that omit a field still decode.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::{
    read_struct, write_struct, ApplicationException, InputProtocol, OutputProtocol,
};

/// A record that travels as a single struct frame.
#[async_trait]
pub trait TrackingStruct: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Read one frame and decode it.
    async fn read(iprot: &mut dyn InputProtocol) -> Result<Self> {
        read_struct(iprot).await
    }

    /// Encode `self` as one frame.
    async fn write(&self, oprot: &mut dyn OutputProtocol) -> Result<()> {
        write_struct(oprot, self).await
    }
}

/// Handshake request payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeArgs {
    /// Initiator's identifier.
    #[serde(default)]
    pub app_id: String,
    /// Version the initiator advertises (0 = let the responder decide).
    #[serde(default)]
    pub version: i32,
}

impl UpgradeArgs {
    /// Create handshake arguments.
    pub fn new(app_id: impl Into<String>, version: i32) -> Self {
        Self {
            app_id: app_id.into(),
            version,
        }
    }
}

/// Handshake reply payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeReply {
    /// Version decided by the responder (0 = implicit default).
    #[serde(default)]
    pub version: i32,
}

impl UpgradeReply {
    /// Create a handshake reply.
    pub fn new(version: i32) -> Self {
        Self { version }
    }
}

/// Metadata frame sent ahead of a call's request payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub seq: String,
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

/// Metadata frame sent ahead of a call's response payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl TrackingStruct for UpgradeArgs {}
impl TrackingStruct for UpgradeReply {}
impl TrackingStruct for RequestHeader {}
impl TrackingStruct for ResponseHeader {}
impl TrackingStruct for ApplicationException {}
