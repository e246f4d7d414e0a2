//! Tracker module - version handshake and conditional header framing.
//!
//! Provides:
//! - [`HandShaker`] - the one-time version handshake, both directions
//! - [`Tracker`] - handshake plus per-call header framing
//! - [`SimpleTracker`] - the negotiating implementation
//! - [`NoopTracker`] - a peer that never upgrades
//!
//! # Flow
//!
//! 1. One tracker is created per connection (see [`TrackerFactory`])
//! 2. The initiator calls [`HandShaker::negotiation`]; the responder's message
//!    loop routes the call (see [`is_tracking_message`]) to
//!    [`HandShaker::try_upgrade`]
//! 3. Every data call is bracketed by the `try_*_header` operations, which
//!    only touch the stream when the negotiated version allows it

mod context;
mod hooks;
mod noop;
mod simple;
mod version;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{InputProtocol, MessageIdentifier, MessageType, OutputProtocol};

pub use context::CallContext;
pub use hooks::Hooks;
pub use noop::NoopTracker;
pub use simple::{SimpleTracker, SimpleTrackerFactory, TrackerBuilder};
pub use version::{
    VersionState, TRACKING_API_NAME, VERSION_DEFAULT, VERSION_MAX, VERSION_REQUEST_HEADER,
    VERSION_REQUEST_RESPONSE_HEADER,
};

/// The version handshake.
#[async_trait]
pub trait HandShaker: Send + Sync {
    /// Run the handshake as initiator: send the upgrade call with `seq_id`
    /// and merge the responder's answer.
    async fn negotiation(
        &self,
        seq_id: i32,
        iprot: &mut dyn InputProtocol,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()>;

    /// Answer an upgrade call whose envelope (with `seq_id`) has already
    /// been read by the caller's message loop.
    ///
    /// `Ok(())` means a reply was written and the version merged.
    async fn try_upgrade(
        &self,
        seq_id: i32,
        iprot: &mut dyn InputProtocol,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()>;

    /// Whether request headers are exchanged on this connection.
    fn request_header_supported(&self) -> bool;

    /// Whether response headers are exchanged on this connection.
    fn response_header_supported(&self) -> bool;
}

/// Handshake plus per-call header framing.
#[async_trait]
pub trait Tracker: HandShaker {
    /// Request id to place in outbound request headers.
    fn request_id(&self, ctx: &CallContext) -> String;

    /// Read the request header of an inbound call, if negotiated.
    async fn try_read_request_header(&self, iprot: &mut dyn InputProtocol) -> Result<()>;

    /// Write the request header of an outbound call, if negotiated.
    async fn try_write_request_header(
        &self,
        ctx: &CallContext,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()>;

    /// Read the response header of a reply, if negotiated.
    async fn try_read_response_header(&self, iprot: &mut dyn InputProtocol) -> Result<()>;

    /// Write the response header of a reply, if negotiated.
    async fn try_write_response_header(
        &self,
        ctx: &CallContext,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()>;
}

/// Creates one tracker per connection.
pub trait TrackerFactory: Send + Sync {
    /// Tracker type produced.
    type Tracker: Tracker;

    /// Build a fresh tracker.
    fn new_tracker(&self) -> Self::Tracker;
}

/// Whether an inbound envelope is the handshake call.
pub fn is_tracking_message(ident: &MessageIdentifier) -> bool {
    ident.name == TRACKING_API_NAME && ident.message_type == MessageType::Call
}
