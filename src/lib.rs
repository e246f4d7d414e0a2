//! # rpc-tracker
//!
//! Version-negotiated tracking headers for binary RPC connections.
//!
//! Two peers sharing a message-framing protocol do not know up front whether
//! the other side understands optional per-call metadata frames. A one-time
//! handshake, sent as an ordinary RPC call named
//! [`TRACKING_API_NAME`], settles on the highest version both sides support:
//!
//! | Version | Request header | Response header |
//! |---------|----------------|-----------------|
//! | 0 | - | - |
//! | 1 | yes | - |
//! | 2 | yes | yes |
//!
//! After the handshake every call is bracketed by the `try_*_header`
//! operations of [`Tracker`], which touch the stream only when the
//! negotiated version allows it.
//!
//! ## Example
//!
//! ```
//! use rpc_tracker::protocol::{BinaryInputProtocol, BinaryOutputProtocol, InputProtocol};
//! use rpc_tracker::{is_tracking_message, HandShaker, Hooks, SimpleTracker};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> rpc_tracker::Result<()> {
//! let (client_out, server_in) = tokio::io::duplex(4096);
//! let (server_out, client_in) = tokio::io::duplex(4096);
//!
//! let server = tokio::spawn(async move {
//!     let mut iprot = BinaryInputProtocol::new(server_in);
//!     let mut oprot = BinaryOutputProtocol::new(server_out);
//!     let tracker = SimpleTracker::new("", "accounts", Hooks::silent());
//!
//!     let ident = iprot.read_message_begin().await?;
//!     assert!(is_tracking_message(&ident));
//!     tracker.try_upgrade(ident.seq_id, &mut iprot, &mut oprot).await?;
//!     Ok::<_, rpc_tracker::TrackerError>(tracker.version())
//! });
//!
//! let client = SimpleTracker::new("billing", "accounts", Hooks::silent());
//! let mut iprot = BinaryInputProtocol::new(client_in);
//! let mut oprot = BinaryOutputProtocol::new(client_out);
//! client.negotiation(1, &mut iprot, &mut oprot).await?;
//!
//! assert_eq!(client.version(), 1);
//! assert_eq!(server.await.unwrap()?, 1);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod tracker;
pub mod tracking;

pub use error::{Result, TrackerError};
pub use tracker::{
    is_tracking_message, CallContext, HandShaker, Hooks, NoopTracker, SimpleTracker,
    SimpleTrackerFactory, Tracker, TrackerBuilder, TrackerFactory, VersionState,
    TRACKING_API_NAME, VERSION_DEFAULT, VERSION_MAX, VERSION_REQUEST_HEADER,
    VERSION_REQUEST_RESPONSE_HEADER,
};
