//! Negotiated version state.
//!
//! The version ladder:
//!
//! | Version | Capability |
//! |---------|------------|
//! | 0 | No tracking headers |
//! | 1 | Request header before each call |
//! | 2 | Request and response headers |
//!
//! Each level implies every level below it. Once a connection agrees on a
//! level it never goes back down.

use parking_lot::RwLock;

/// Method name of the handshake RPC.
pub const TRACKING_API_NAME: &str = "ElemeThriftTrackingAPI";

/// No headers; also "let the peer decide" on the wire.
pub const VERSION_DEFAULT: i32 = 0;

/// Request headers supported.
pub const VERSION_REQUEST_HEADER: i32 = 1;

/// Request and response headers supported.
pub const VERSION_REQUEST_RESPONSE_HEADER: i32 = 2;

/// Highest version this build understands.
pub const VERSION_MAX: i32 = VERSION_REQUEST_RESPONSE_HEADER;

/// Lock-guarded version integer for one connection.
///
/// Reads take the shared lock, merges take the exclusive lock. The value
/// only ever moves up and never exceeds [`VERSION_MAX`].
#[derive(Debug)]
pub struct VersionState {
    version: RwLock<i32>,
}

impl VersionState {
    /// Create a state at [`VERSION_DEFAULT`].
    pub fn new() -> Self {
        Self {
            version: RwLock::new(VERSION_DEFAULT),
        }
    }

    /// Current negotiated version.
    #[inline]
    pub fn get(&self) -> i32 {
        *self.version.read()
    }

    /// Merge a candidate version.
    ///
    /// `VERSION_DEFAULT` is replaced by `default_version` first. Candidates
    /// below the held value or above [`VERSION_MAX`] are dropped silently.
    /// Returns whether the candidate was stored.
    pub fn try_set(&self, version: i32, default_version: i32) -> bool {
        let candidate = if version == VERSION_DEFAULT {
            default_version
        } else {
            version
        };

        let mut held = self.version.write();
        if candidate < *held || candidate > VERSION_MAX {
            tracing::warn!(
                candidate,
                held = *held,
                "Rejected tracking version update"
            );
            return false;
        }
        if candidate != *held {
            tracing::debug!(from = *held, to = candidate, "Tracking version changed");
        }
        *held = candidate;
        true
    }

    /// Whether request headers are exchanged.
    #[inline]
    pub fn request_header_supported(&self) -> bool {
        self.get() >= VERSION_REQUEST_HEADER
    }

    /// Whether response headers are exchanged.
    #[inline]
    pub fn response_header_supported(&self) -> bool {
        self.get() >= VERSION_REQUEST_RESPONSE_HEADER
    }
}

impl Default for VersionState {
    fn default() -> Self {
        Self::new()
    }
}
