//! A tracker that never upgrades.
//!
//! Behaves like a peer built without the tracking API: the handshake is
//! answered with an `UnknownMethod` exception, and no headers are ever
//! exchanged. Useful for wiring call sites against [`Tracker`] while
//! tracking is switched off.

use async_trait::async_trait;

use super::context::CallContext;
use super::version::TRACKING_API_NAME;
use super::{HandShaker, Tracker, TrackerFactory};
use crate::error::Result;
use crate::protocol::{
    write_exception_reply, ApplicationErrorKind, ApplicationException, InputProtocol,
    OutputProtocol,
};

/// Tracker pinned at version 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl NoopTracker {
    /// Create a no-op tracker.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HandShaker for NoopTracker {
    async fn negotiation(
        &self,
        _seq_id: i32,
        _iprot: &mut dyn InputProtocol,
        _oprot: &mut dyn OutputProtocol,
    ) -> Result<()> {
        Ok(())
    }

    async fn try_upgrade(
        &self,
        seq_id: i32,
        iprot: &mut dyn InputProtocol,
        oprot: &mut dyn OutputProtocol,
    ) -> Result<()> {
        let read = iprot.read_struct_frame().await;
        if read.is_ok() {
            if let Err(e) = iprot.read_message_end().await {
                tracing::debug!(seq_id, error = %e, "Ignoring error after upgrade request");
            }
        }
        tracing::debug!(seq_id, "Refusing tracking upgrade");

        let exception = ApplicationException::new(
            ApplicationErrorKind::UnknownMethod,
            "tracking API not supported",
        );
        let reply = write_exception_reply(oprot, TRACKING_API_NAME, seq_id, &exception).await;
        match read {
            Ok(_) => reply,
            Err(e) => {
                if let Err(write_err) = reply {
                    tracing::warn!(seq_id, error = %write_err, "Failed to send upgrade error reply");
                }
                Err(e)
            }
        }
    }

    fn request_header_supported(&self) -> bool {
        false
    }

    fn response_header_supported(&self) -> bool {
        false
    }
}

#[async_trait]
impl Tracker for NoopTracker {
    fn request_id(&self, ctx: &CallContext) -> String {
        ctx.request_id().to_string()
    }

    async fn try_read_request_header(&self, _iprot: &mut dyn InputProtocol) -> Result<()> {
        Ok(())
    }

    async fn try_write_request_header(
        &self,
        _ctx: &CallContext,
        _oprot: &mut dyn OutputProtocol,
    ) -> Result<()> {
        Ok(())
    }

    async fn try_read_response_header(&self, _iprot: &mut dyn InputProtocol) -> Result<()> {
        Ok(())
    }

    async fn try_write_response_header(
        &self,
        _ctx: &CallContext,
        _oprot: &mut dyn OutputProtocol,
    ) -> Result<()> {
        Ok(())
    }
}

impl TrackerFactory for NoopTracker {
    type Tracker = NoopTracker;

    fn new_tracker(&self) -> NoopTracker {
        NoopTracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::protocol::{
        read_struct, write_struct, BinaryInputProtocol, BinaryOutputProtocol, MessageType,
        ProtocolConfig,
    };
    use crate::tracking::UpgradeArgs;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_try_upgrade_answers_unknown_method() {
        let (peer_out_raw, ours_in) = duplex(1024);
        let (ours_out, peer_in_raw) = duplex(1024);
        let mut peer_out = BinaryOutputProtocol::new(peer_out_raw);
        let mut peer_in = BinaryInputProtocol::new(peer_in_raw);
        let mut iprot = BinaryInputProtocol::new(ours_in);
        let mut oprot = BinaryOutputProtocol::new(ours_out);

        write_struct(&mut peer_out, &UpgradeArgs::new("caller", 2))
            .await
            .unwrap();
        peer_out.flush().await.unwrap();

        let tracker = NoopTracker::new();
        tracker.try_upgrade(8, &mut iprot, &mut oprot).await.unwrap();

        let ident = peer_in.read_message_begin().await.unwrap();
        assert_eq!(ident.name, TRACKING_API_NAME);
        assert_eq!(ident.message_type, MessageType::Exception);
        assert_eq!(ident.seq_id, 8);
        let exception: ApplicationException = read_struct(&mut peer_in).await.unwrap();
        assert_eq!(exception.kind, ApplicationErrorKind::UnknownMethod);
        assert!(!tracker.request_header_supported());
    }

    #[tokio::test]
    async fn test_try_upgrade_replies_when_request_unreadable() {
        let (peer_out_raw, ours_in) = duplex(1024);
        let (ours_out, peer_in_raw) = duplex(1024);
        let mut peer_out = BinaryOutputProtocol::new(peer_out_raw);
        let mut peer_in = BinaryInputProtocol::new(peer_in_raw);
        let mut iprot =
            BinaryInputProtocol::with_config(ours_in, ProtocolConfig::new().max_struct_size(4));
        let mut oprot = BinaryOutputProtocol::new(ours_out);

        peer_out.write_struct_frame(b"0123456789").await.unwrap();
        peer_out.flush().await.unwrap();

        let err = NoopTracker::new()
            .try_upgrade(8, &mut iprot, &mut oprot)
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Protocol(_)));

        let ident = peer_in.read_message_begin().await.unwrap();
        assert_eq!(ident.message_type, MessageType::Exception);
        assert_eq!(ident.seq_id, 8);
        let exception: ApplicationException = read_struct(&mut peer_in).await.unwrap();
        assert_eq!(exception.kind, ApplicationErrorKind::UnknownMethod);
    }

    #[tokio::test]
    async fn test_negotiation_is_silent() {
        let (a, _b) = duplex(64);
        let (_c, d) = duplex(64);
        let mut oprot = BinaryOutputProtocol::new(a);
        let mut iprot = BinaryInputProtocol::new(d);

        let tracker = NoopTracker.new_tracker();
        tracker.negotiation(1, &mut iprot, &mut oprot).await.unwrap();
        tracker
            .try_write_request_header(&CallContext::new(), &mut oprot)
            .await
            .unwrap();

        assert!(oprot.pending().is_empty());
        assert!(!tracker.response_header_supported());
        assert_eq!(
            tracker.request_id(&CallContext::new().with_request_id("x")),
            "x"
        );
    }
}
