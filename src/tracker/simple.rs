//! The negotiating tracker.
//!
//! [`SimpleTracker`] runs the version handshake in either direction and then
//! gates header framing on the agreed version.
//!
//! # Example
//!
//! ```ignore
//! use rpc_tracker::{Hooks, SimpleTracker, Tracker};
//!
//! // initiator
//! let tracker = SimpleTracker::new("billing", "accounts", Hooks::default());
//! tracker.negotiation(1, &mut iprot, &mut oprot).await?;
//!
//! // every call afterwards
//! tracker.try_write_request_header(&ctx, &mut oprot).await?;
//! // ... call payload ...
//! tracker.try_read_response_header(&mut iprot).await?;
//! ```

use async_trait::async_trait;

use super::context::CallContext;
use super::hooks::Hooks;
use super::version::{
    VersionState, TRACKING_API_NAME, VERSION_DEFAULT, VERSION_MAX, VERSION_REQUEST_HEADER,
};
use super::{HandShaker, Tracker, TrackerFactory};
use crate::error::Result;
use crate::protocol::{
    write_exception_reply, ApplicationErrorKind, ApplicationException, InputProtocol,
    MessageIdentifier, MessageType, OutputProtocol,
};
use crate::tracking::{RequestHeader, ResponseHeader, TrackingStruct, UpgradeArgs, UpgradeReply};

/// Tracker that negotiates up to [`VERSION_MAX`].
#[derive(Debug)]
pub struct SimpleTracker {
    version: VersionState,
    client: String,
    server: String,
    hooks: Hooks,
}

impl SimpleTracker {
    /// Create a tracker for one connection.
    pub fn new(client: impl Into<String>, server: impl Into<String>, hooks: Hooks) -> Self {
        Self {
            version: VersionState::new(),
            client: client.into(),
            server: server.into(),
            hooks,
        }
    }

    /// Create a tracker builder.
    pub fn builder() -> TrackerBuilder {
        TrackerBuilder::new()
    }

    /// Client identifier sent in upgrade requests.
    pub fn client(&self) -> &str {
        &self.client
    }

    /// Server identifier.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Currently negotiated version.
    pub fn version(&self) -> i32 {
        self.version.get()
    }

    /// Merge a candidate version (see [`VersionState::try_set`]).
    pub(crate) fn try_set_version(&self, version: i32, default_version: i32) -> bool {
        self.version.try_set(version, default_version)
    }
}

#[async_trait]
impl HandShaker for SimpleTracker {
    async fn negotiation(
        &self,
        seq_id: i32,
        iprot: &mut dyn InputProtocol,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()> {
        let args = UpgradeArgs::new(self.client.clone(), self.version.get());
        oprot
            .write_message_begin(&MessageIdentifier::new(
                TRACKING_API_NAME,
                MessageType::Call,
                seq_id,
            ))
            .await?;
        args.write(oprot).await?;
        oprot.write_message_end().await?;
        oprot.flush().await?;

        let ident = iprot.read_message_begin().await?;
        if ident.name != TRACKING_API_NAME {
            return Err(ApplicationException::new(
                ApplicationErrorKind::WrongMethodName,
                "tracker negotiation failed: wrong method name",
            )
            .into());
        }
        if ident.seq_id != seq_id {
            return Err(ApplicationException::new(
                ApplicationErrorKind::BadSequenceId,
                "tracker negotiation failed: out of sequence response",
            )
            .into());
        }
        match ident.message_type {
            MessageType::Reply => {}
            MessageType::Exception => {
                let exception = ApplicationException::read(iprot).await?;
                iprot.read_message_end().await?;
                return Err(exception.into());
            }
            _ => {
                return Err(ApplicationException::new(
                    ApplicationErrorKind::InvalidMessageType,
                    "tracker negotiation failed: invalid message type",
                )
                .into());
            }
        }

        let reply = UpgradeReply::read(iprot).await?;
        iprot.read_message_end().await?;
        self.version.try_set(reply.version, VERSION_REQUEST_HEADER);

        tracing::debug!(
            client = %self.client,
            server = %self.server,
            replied = reply.version,
            version = self.version.get(),
            "Tracking negotiation complete"
        );
        Ok(())
    }

    async fn try_upgrade(
        &self,
        seq_id: i32,
        iprot: &mut dyn InputProtocol,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()> {
        let args = match UpgradeArgs::read(iprot).await {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(seq_id, error = %e, "Malformed tracking upgrade request");
                let _ = iprot.read_message_end().await;
                let exception =
                    ApplicationException::new(ApplicationErrorKind::ProtocolError, e.to_string());
                if let Err(write_err) =
                    write_exception_reply(oprot, TRACKING_API_NAME, seq_id, &exception).await
                {
                    tracing::warn!(seq_id, error = %write_err, "Failed to send upgrade error reply");
                }
                return Err(e);
            }
        };
        if let Err(e) = iprot.read_message_end().await {
            tracing::debug!(seq_id, error = %e, "Ignoring error after upgrade request");
        }

        self.hooks.handshake_request(&args);

        let reply = if args.version > VERSION_DEFAULT {
            let version = args.version.min(VERSION_MAX);
            self.version.try_set(version, version);
            UpgradeReply::new(version)
        } else {
            self.version.try_set(args.version, VERSION_REQUEST_HEADER);
            UpgradeReply::new(VERSION_DEFAULT)
        };

        oprot
            .write_message_begin(&MessageIdentifier::new(
                TRACKING_API_NAME,
                MessageType::Reply,
                seq_id,
            ))
            .await?;
        reply.write(oprot).await?;
        oprot.write_message_end().await?;
        oprot.flush().await?;

        tracing::debug!(
            app_id = %args.app_id,
            requested = args.version,
            version = self.version.get(),
            "Tracking upgrade answered"
        );
        Ok(())
    }

    fn request_header_supported(&self) -> bool {
        self.version.request_header_supported()
    }

    fn response_header_supported(&self) -> bool {
        self.version.response_header_supported()
    }
}

#[async_trait]
impl Tracker for SimpleTracker {
    fn request_id(&self, ctx: &CallContext) -> String {
        ctx.request_id().to_string()
    }

    async fn try_read_request_header(&self, iprot: &mut dyn InputProtocol) -> Result<()> {
        if !self.request_header_supported() {
            return Ok(());
        }
        let header = RequestHeader::read(iprot).await?;
        self.hooks.request_header(&header);
        Ok(())
    }

    async fn try_write_request_header(
        &self,
        ctx: &CallContext,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()> {
        if !self.request_header_supported() {
            return Ok(());
        }
        let header = RequestHeader {
            request_id: self.request_id(ctx),
            seq: ctx.seq().to_string(),
            meta: ctx.request_meta(),
        };
        header.write(oprot).await
    }

    async fn try_read_response_header(&self, iprot: &mut dyn InputProtocol) -> Result<()> {
        if !self.response_header_supported() {
            return Ok(());
        }
        let header = ResponseHeader::read(iprot).await?;
        self.hooks.response_header(&header);
        Ok(())
    }

    async fn try_write_response_header(
        &self,
        ctx: &CallContext,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()> {
        if !self.response_header_supported() {
            return Ok(());
        }
        let header = ResponseHeader {
            meta: ctx.response_meta(),
        };
        header.write(oprot).await
    }
}

/// Builder for [`SimpleTracker`].
#[derive(Debug, Clone, Default)]
pub struct TrackerBuilder {
    client: String,
    server: String,
    hooks: Hooks,
}

impl TrackerBuilder {
    /// Create a builder with empty identifiers and default hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client identifier.
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Set the server identifier.
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the hooks.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Build a single tracker.
    pub fn build(self) -> SimpleTracker {
        SimpleTracker::new(self.client, self.server, self.hooks)
    }

    /// Build a factory producing one tracker per connection.
    pub fn into_factory(self) -> SimpleTrackerFactory {
        SimpleTrackerFactory::new(self.client, self.server, self.hooks)
    }
}

/// Produces a fresh [`SimpleTracker`] per connection.
#[derive(Debug, Clone)]
pub struct SimpleTrackerFactory {
    client: String,
    server: String,
    hooks: Hooks,
}

impl SimpleTrackerFactory {
    /// Create a factory.
    pub fn new(client: impl Into<String>, server: impl Into<String>, hooks: Hooks) -> Self {
        Self {
            client: client.into(),
            server: server.into(),
            hooks,
        }
    }
}

impl TrackerFactory for SimpleTrackerFactory {
    type Tracker = SimpleTracker;

    fn new_tracker(&self) -> SimpleTracker {
        SimpleTracker::new(self.client.clone(), self.server.clone(), self.hooks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::protocol::{read_struct, write_struct, BinaryInputProtocol, BinaryOutputProtocol};
    use crate::tracker::VERSION_REQUEST_RESPONSE_HEADER;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

    /// Protocol that records every call and fails all reads.
    #[derive(Default)]
    struct CountingProtocol {
        calls: usize,
    }

    #[async_trait]
    impl InputProtocol for CountingProtocol {
        async fn read_message_begin(&mut self) -> Result<MessageIdentifier> {
            self.calls += 1;
            Err(TrackerError::Protocol("unexpected read".to_string()))
        }

        async fn read_message_end(&mut self) -> Result<()> {
            self.calls += 1;
            Ok(())
        }

        async fn read_struct_frame(&mut self) -> Result<Bytes> {
            self.calls += 1;
            Err(TrackerError::Protocol("unexpected read".to_string()))
        }
    }

    #[async_trait]
    impl OutputProtocol for CountingProtocol {
        async fn write_message_begin(&mut self, _ident: &MessageIdentifier) -> Result<()> {
            self.calls += 1;
            Ok(())
        }

        async fn write_message_end(&mut self) -> Result<()> {
            self.calls += 1;
            Ok(())
        }

        async fn write_struct_frame(&mut self, _body: &[u8]) -> Result<()> {
            self.calls += 1;
            Ok(())
        }

        async fn flush(&mut self) -> Result<()> {
            self.calls += 1;
            Ok(())
        }
    }

    type Peer = (
        BinaryInputProtocol<DuplexStream>,
        BinaryOutputProtocol<DuplexStream>,
    );

    /// Two connected protocol pairs: (ours, theirs).
    fn pipe() -> (Peer, Peer) {
        let (a_out, b_in) = duplex(4096);
        let (b_out, a_in) = duplex(4096);
        (
            (BinaryInputProtocol::new(a_in), BinaryOutputProtocol::new(a_out)),
            (BinaryInputProtocol::new(b_in), BinaryOutputProtocol::new(b_out)),
        )
    }

    fn tracker() -> SimpleTracker {
        SimpleTracker::new("client-app", "server-app", Hooks::silent())
    }

    /// Queue a reply on `oprot` before negotiation starts.
    async fn queue_reply(
        oprot: &mut BinaryOutputProtocol<DuplexStream>,
        name: &str,
        message_type: MessageType,
        seq_id: i32,
        version: i32,
    ) {
        oprot
            .write_message_begin(&MessageIdentifier::new(name, message_type, seq_id))
            .await
            .unwrap();
        write_struct(oprot, &UpgradeReply::new(version)).await.unwrap();
        oprot.write_message_end().await.unwrap();
        oprot.flush().await.unwrap();
    }

    #[test]
    fn test_new_tracker_defaults() {
        let t = tracker();
        assert_eq!(t.client(), "client-app");
        assert_eq!(t.server(), "server-app");
        assert_eq!(t.version(), VERSION_DEFAULT);
        assert!(!t.request_header_supported());
        assert!(!t.response_header_supported());
    }

    #[test]
    fn test_try_set_version_sequence() {
        let t = tracker();
        for v in [0, 1, 2, 3, 1] {
            t.try_set_version(v, v);
        }
        assert_eq!(t.version(), 2);
    }

    #[test]
    fn test_default_falls_back_to_request_header() {
        let t = tracker();
        t.try_set_version(VERSION_DEFAULT, VERSION_REQUEST_HEADER);
        assert!(t.request_header_supported());
        assert!(!t.response_header_supported());
    }

    #[test]
    fn test_builder_and_factory() {
        let t = SimpleTracker::builder()
            .client("c")
            .server("s")
            .hooks(Hooks::silent())
            .build();
        assert_eq!(t.client(), "c");
        assert_eq!(t.server(), "s");

        let factory = TrackerBuilder::new().client("c2").into_factory();
        let first = factory.new_tracker();
        let second = factory.new_tracker();
        first.try_set_version(2, 2);

        assert_eq!(first.client(), "c2");
        assert_eq!(first.version(), 2);
        assert_eq!(second.version(), VERSION_DEFAULT);
    }

    #[test]
    fn test_request_id_from_context() {
        let t = tracker();
        assert_eq!(t.request_id(&CallContext::new()), "");
        assert_eq!(
            t.request_id(&CallContext::new().with_request_id("abc")),
            "abc"
        );
    }

    #[tokio::test]
    async fn test_negotiation_accepts_default_reply() {
        let ((mut iprot, mut oprot), (_peer_in, mut peer_out)) = pipe();
        queue_reply(&mut peer_out, TRACKING_API_NAME, MessageType::Reply, 5, 0).await;

        let t = tracker();
        t.negotiation(5, &mut iprot, &mut oprot).await.unwrap();

        assert_eq!(t.version(), VERSION_REQUEST_HEADER);
    }

    #[tokio::test]
    async fn test_negotiation_sends_upgrade_args() {
        let ((mut iprot, mut oprot), (mut peer_in, mut peer_out)) = pipe();
        queue_reply(&mut peer_out, TRACKING_API_NAME, MessageType::Reply, 9, 2).await;

        let t = tracker();
        t.negotiation(9, &mut iprot, &mut oprot).await.unwrap();

        let ident = peer_in.read_message_begin().await.unwrap();
        assert_eq!(ident.name, TRACKING_API_NAME);
        assert_eq!(ident.message_type, MessageType::Call);
        assert_eq!(ident.seq_id, 9);
        let args: UpgradeArgs = read_struct(&mut peer_in).await.unwrap();
        assert_eq!(args, UpgradeArgs::new("client-app", VERSION_DEFAULT));

        assert_eq!(t.version(), VERSION_REQUEST_RESPONSE_HEADER);
    }

    #[tokio::test]
    async fn test_negotiation_wrong_method_name() {
        let ((mut iprot, mut oprot), (_peer_in, mut peer_out)) = pipe();
        queue_reply(&mut peer_out, "SomethingElse", MessageType::Reply, 1, 2).await;

        let t = tracker();
        let err = t.negotiation(1, &mut iprot, &mut oprot).await.unwrap_err();

        let x = err.as_application().unwrap();
        assert_eq!(x.kind, ApplicationErrorKind::WrongMethodName);
        assert!(x.message.contains("wrong method name"));
        assert_eq!(t.version(), VERSION_DEFAULT);
    }

    #[tokio::test]
    async fn test_negotiation_bad_sequence_id() {
        let ((mut iprot, mut oprot), (_peer_in, mut peer_out)) = pipe();
        queue_reply(&mut peer_out, TRACKING_API_NAME, MessageType::Reply, 2, 2).await;

        let t = tracker();
        let err = t.negotiation(1, &mut iprot, &mut oprot).await.unwrap_err();

        assert_eq!(
            err.as_application().unwrap().kind,
            ApplicationErrorKind::BadSequenceId
        );
        assert_eq!(t.version(), VERSION_DEFAULT);
    }

    #[tokio::test]
    async fn test_negotiation_invalid_message_type() {
        let ((mut iprot, mut oprot), (_peer_in, mut peer_out)) = pipe();
        queue_reply(&mut peer_out, TRACKING_API_NAME, MessageType::Call, 1, 2).await;

        let t = tracker();
        let err = t.negotiation(1, &mut iprot, &mut oprot).await.unwrap_err();

        assert_eq!(
            err.as_application().unwrap().kind,
            ApplicationErrorKind::InvalidMessageType
        );
    }

    #[tokio::test]
    async fn test_negotiation_surfaces_peer_exception() {
        let ((mut iprot, mut oprot), (_peer_in, mut peer_out)) = pipe();
        let exception = ApplicationException::new(ApplicationErrorKind::InternalError, "boom");
        write_exception_reply(&mut peer_out, TRACKING_API_NAME, 4, &exception)
            .await
            .unwrap();

        let t = tracker();
        let err = t.negotiation(4, &mut iprot, &mut oprot).await.unwrap_err();

        assert_eq!(err.as_application(), Some(&exception));
        assert_eq!(t.version(), VERSION_DEFAULT);
    }

    #[tokio::test]
    async fn test_negotiation_rejects_version_above_max() {
        let ((mut iprot, mut oprot), (_peer_in, mut peer_out)) = pipe();
        queue_reply(&mut peer_out, TRACKING_API_NAME, MessageType::Reply, 1, 7).await;

        let t = tracker();
        t.negotiation(1, &mut iprot, &mut oprot).await.unwrap();

        assert_eq!(t.version(), VERSION_DEFAULT);
    }

    #[tokio::test]
    async fn test_try_upgrade_invokes_hook_and_replies() {
        let ((mut iprot, mut oprot), (mut peer_in, mut peer_out)) = pipe();
        write_struct(&mut peer_out, &UpgradeArgs::new("caller", 2))
            .await
            .unwrap();
        peer_out.flush().await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hooks =
            Hooks::silent().on_handshake_request(move |args| sink.lock().unwrap().push(args.clone()));
        let t = SimpleTracker::new("server-side", "server-side", hooks);

        t.try_upgrade(11, &mut iprot, &mut oprot).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![UpgradeArgs::new("caller", 2)]);
        assert_eq!(t.version(), VERSION_REQUEST_RESPONSE_HEADER);

        let ident = peer_in.read_message_begin().await.unwrap();
        assert_eq!(
            ident,
            MessageIdentifier::new(TRACKING_API_NAME, MessageType::Reply, 11)
        );
        let reply: UpgradeReply = read_struct(&mut peer_in).await.unwrap();
        assert_eq!(reply.version, 2);
    }

    #[tokio::test]
    async fn test_try_upgrade_default_request_keeps_reply_default() {
        let ((mut iprot, mut oprot), (mut peer_in, mut peer_out)) = pipe();
        write_struct(&mut peer_out, &UpgradeArgs::new("caller", 0))
            .await
            .unwrap();
        peer_out.flush().await.unwrap();

        let t = tracker();
        t.try_upgrade(1, &mut iprot, &mut oprot).await.unwrap();

        assert_eq!(t.version(), VERSION_REQUEST_HEADER);
        peer_in.read_message_begin().await.unwrap();
        let reply: UpgradeReply = read_struct(&mut peer_in).await.unwrap();
        assert_eq!(reply.version, VERSION_DEFAULT);
    }

    #[tokio::test]
    async fn test_try_upgrade_clamps_to_max() {
        let ((mut iprot, mut oprot), (mut peer_in, mut peer_out)) = pipe();
        write_struct(&mut peer_out, &UpgradeArgs::new("future-peer", 5))
            .await
            .unwrap();
        peer_out.flush().await.unwrap();

        let t = tracker();
        t.try_upgrade(1, &mut iprot, &mut oprot).await.unwrap();

        assert_eq!(t.version(), VERSION_MAX);
        peer_in.read_message_begin().await.unwrap();
        let reply: UpgradeReply = read_struct(&mut peer_in).await.unwrap();
        assert_eq!(reply.version, VERSION_MAX);
    }

    #[tokio::test]
    async fn test_try_upgrade_decode_failure_replies_with_exception() {
        let ((mut iprot, mut oprot), (mut peer_in, mut peer_out)) = pipe();
        peer_out.write_struct_frame(b"\xc1garbage").await.unwrap();
        peer_out.flush().await.unwrap();

        let t = tracker();
        let err = t.try_upgrade(3, &mut iprot, &mut oprot).await.unwrap_err();
        assert!(matches!(err, TrackerError::MsgPackDecode(_)));
        assert_eq!(t.version(), VERSION_DEFAULT);

        let ident = peer_in.read_message_begin().await.unwrap();
        assert_eq!(ident.message_type, MessageType::Exception);
        assert_eq!(ident.seq_id, 3);
        let exception: ApplicationException = read_struct(&mut peer_in).await.unwrap();
        assert_eq!(exception.kind, ApplicationErrorKind::ProtocolError);
        assert_eq!(exception.message, err.to_string());
    }

    #[tokio::test]
    async fn test_try_upgrade_write_failure() {
        let (mut peer_raw, server_in) = duplex(4096);
        let (server_out, peer_read) = duplex(4096);
        drop(peer_read);

        let mut framed = BinaryOutputProtocol::new(Vec::new());
        write_struct(&mut framed, &UpgradeArgs::new("caller", 1))
            .await
            .unwrap();
        peer_raw.write_all(framed.pending()).await.unwrap();

        let mut iprot = BinaryInputProtocol::new(server_in);
        let mut oprot = BinaryOutputProtocol::new(server_out);
        let t = tracker();

        let err = t.try_upgrade(1, &mut iprot, &mut oprot).await.unwrap_err();
        assert!(matches!(err, TrackerError::Io(_)));
    }

    #[tokio::test]
    async fn test_headers_skipped_without_negotiation() {
        let t = tracker();
        let ctx = CallContext::new().insert_request_meta("k", "v");
        let mut proto = CountingProtocol::default();

        t.try_write_request_header(&ctx, &mut proto).await.unwrap();
        t.try_read_request_header(&mut proto).await.unwrap();
        t.try_write_response_header(&ctx, &mut proto).await.unwrap();
        t.try_read_response_header(&mut proto).await.unwrap();

        assert_eq!(proto.calls, 0);
    }

    #[tokio::test]
    async fn test_response_header_skipped_at_version_one() {
        let t = tracker();
        t.try_set_version(VERSION_REQUEST_HEADER, VERSION_REQUEST_HEADER);
        let mut proto = CountingProtocol::default();

        t.try_write_response_header(&CallContext::new(), &mut proto)
            .await
            .unwrap();
        t.try_read_response_header(&mut proto).await.unwrap();
        assert_eq!(proto.calls, 0);

        t.try_write_request_header(&CallContext::new(), &mut proto)
            .await
            .unwrap();
        assert_eq!(proto.calls, 1);
    }

    #[tokio::test]
    async fn test_request_header_written_from_context() {
        let ((mut iprot, _), (_, mut peer_out)) = pipe();
        let t = tracker();
        t.try_set_version(VERSION_REQUEST_HEADER, VERSION_REQUEST_HEADER);

        let ctx = CallContext::new()
            .with_request_id("req-1")
            .with_seq("1.2")
            .insert_request_meta("tenant", "acme");
        t.try_write_request_header(&ctx, &mut peer_out).await.unwrap();
        peer_out.flush().await.unwrap();

        let header: RequestHeader = read_struct(&mut iprot).await.unwrap();
        assert_eq!(header.request_id, "req-1");
        assert_eq!(header.seq, "1.2");
        assert_eq!(header.meta["tenant"], "acme");
    }

    #[tokio::test]
    async fn test_read_headers_invoke_hooks() {
        let ((mut iprot, _), (_, mut peer_out)) = pipe();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responses = Arc::new(Mutex::new(Vec::new()));
        let (r1, r2) = (requests.clone(), responses.clone());
        let hooks = Hooks::silent()
            .on_request_header(move |h| r1.lock().unwrap().push(h.clone()))
            .on_response_header(move |h| r2.lock().unwrap().push(h.clone()));
        let t = SimpleTracker::new("c", "s", hooks);
        t.try_set_version(VERSION_MAX, VERSION_MAX);

        let mut request = RequestHeader::default();
        request.request_id = "r".to_string();
        let mut response = ResponseHeader::default();
        response.meta.insert("status".to_string(), "ok".to_string());
        write_struct(&mut peer_out, &request).await.unwrap();
        write_struct(&mut peer_out, &response).await.unwrap();
        peer_out.flush().await.unwrap();

        t.try_read_request_header(&mut iprot).await.unwrap();
        t.try_read_response_header(&mut iprot).await.unwrap();

        assert_eq!(*requests.lock().unwrap(), vec![request]);
        assert_eq!(*responses.lock().unwrap(), vec![response]);
    }

    #[tokio::test]
    async fn test_read_header_propagates_decode_error() {
        let ((mut iprot, _), (_, mut peer_out)) = pipe();
        let t = tracker();
        t.try_set_version(VERSION_MAX, VERSION_MAX);

        peer_out.write_struct_frame(b"\xc1").await.unwrap();
        peer_out.flush().await.unwrap();

        assert!(t.try_read_request_header(&mut iprot).await.is_err());
    }
}
