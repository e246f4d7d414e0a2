//! Observation hooks.
//!
//! Hooks receive each decoded tracking record for observation only; they
//! cannot influence the protocol. [`Hooks::default`] logs the record through
//! `tracing`, [`Hooks::silent`] drops it.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use rpc_tracker::Hooks;
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = seen.clone();
//! let hooks = Hooks::silent().on_request_header(move |_header| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//! # let _ = hooks;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::tracking::{RequestHeader, ResponseHeader, UpgradeArgs};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Callback slots invoked when tracking records are observed.
#[derive(Clone)]
pub struct Hooks {
    handshake_request: Callback<UpgradeArgs>,
    request_header: Callback<RequestHeader>,
    response_header: Callback<ResponseHeader>,
}

impl Hooks {
    /// Hooks that ignore every record.
    pub fn silent() -> Self {
        Self {
            handshake_request: Arc::new(|_| {}),
            request_header: Arc::new(|_| {}),
            response_header: Arc::new(|_| {}),
        }
    }

    /// Replace the handshake-request callback.
    pub fn on_handshake_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&UpgradeArgs) + Send + Sync + 'static,
    {
        self.handshake_request = Arc::new(f);
        self
    }

    /// Replace the request-header callback.
    pub fn on_request_header<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestHeader) + Send + Sync + 'static,
    {
        self.request_header = Arc::new(f);
        self
    }

    /// Replace the response-header callback.
    pub fn on_response_header<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResponseHeader) + Send + Sync + 'static,
    {
        self.response_header = Arc::new(f);
        self
    }

    pub(crate) fn handshake_request(&self, args: &UpgradeArgs) {
        (self.handshake_request)(args);
    }

    pub(crate) fn request_header(&self, header: &RequestHeader) {
        (self.request_header)(header);
    }

    pub(crate) fn response_header(&self, header: &ResponseHeader) {
        (self.response_header)(header);
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            handshake_request: Arc::new(|args| {
                tracing::info!(?args, "Tracking handshake request");
            }),
            request_header: Arc::new(|header| {
                tracing::info!(?header, "Tracking request header");
            }),
            response_header: Arc::new(|header| {
                tracing::info!(?header, "Tracking response header");
            }),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}
