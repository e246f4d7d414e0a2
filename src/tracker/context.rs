//! Per-call context for header framing.
//!
//! Carries the values the tracker needs to fill outbound headers: a request
//! id, a call sequence token, request metadata and response metadata. Every
//! field is optional; a missing field yields an empty value, never an error.
//!
//! # Example
//!
//! ```
//! use rpc_tracker::CallContext;
//!
//! let ctx = CallContext::new()
//!     .with_request_id("req-42")
//!     .insert_request_meta("tenant", "acme");
//!
//! assert_eq!(ctx.request_id(), "req-42");
//! assert_eq!(ctx.seq(), "");
//! assert_eq!(ctx.request_meta().get("tenant").map(String::as_str), Some("acme"));
//! assert!(ctx.response_meta().is_empty());
//! ```

use std::collections::HashMap;

/// Call-scoped values supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    request_id: Option<String>,
    seq: Option<String>,
    request_meta: Option<HashMap<String, String>>,
    response_meta: Option<HashMap<String, String>>,
}

impl CallContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Set the call sequence token.
    pub fn with_seq(mut self, seq: impl Into<String>) -> Self {
        self.seq = Some(seq.into());
        self
    }

    /// Replace the outbound request metadata.
    pub fn with_request_meta(mut self, meta: HashMap<String, String>) -> Self {
        self.request_meta = Some(meta);
        self
    }

    /// Replace the outbound response metadata.
    pub fn with_response_meta(mut self, meta: HashMap<String, String>) -> Self {
        self.response_meta = Some(meta);
        self
    }

    /// Add one request metadata entry.
    pub fn insert_request_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_meta
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add one response metadata entry.
    pub fn insert_response_meta(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.response_meta
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Request id, or `""` when none was supplied.
    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or_default()
    }

    /// Sequence token, or `""` when none was supplied.
    pub fn seq(&self) -> &str {
        self.seq.as_deref().unwrap_or_default()
    }

    /// Request metadata, empty when none was supplied.
    pub fn request_meta(&self) -> HashMap<String, String> {
        self.request_meta.clone().unwrap_or_default()
    }

    /// Response metadata, empty when none was supplied.
    pub fn response_meta(&self) -> HashMap<String, String> {
        self.response_meta.clone().unwrap_or_default()
    }
}
