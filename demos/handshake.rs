//! Handshake demo - client and server negotiate over an in-memory pipe.
//!
//! This example demonstrates:
//! - Routing the tracking call in a server's message loop
//! - Negotiating from the client side
//! - Bracketing one call with request/response headers
//!
//! ```text
//! cargo run --example handshake
//! ```

use rpc_tracker::protocol::{
    BinaryInputProtocol, BinaryOutputProtocol, InputProtocol, MessageIdentifier, MessageType,
    OutputProtocol,
};
use rpc_tracker::{is_tracking_message, CallContext, HandShaker, Hooks, SimpleTracker, Tracker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (client_out, server_in) = tokio::io::duplex(64 * 1024);
    let (server_out, client_in) = tokio::io::duplex(64 * 1024);

    let server = tokio::spawn(async move {
        let hooks = Hooks::silent()
            .on_handshake_request(|args| println!("server: upgrade request {:?}", args))
            .on_request_header(|header| println!("server: request header {:?}", header));
        let tracker = SimpleTracker::new("", "accounts", hooks);
        let mut iprot = BinaryInputProtocol::new(server_in);
        let mut oprot = BinaryOutputProtocol::new(server_out);

        loop {
            let ident = match iprot.read_message_begin().await {
                Ok(ident) => ident,
                Err(_) => return Ok::<_, rpc_tracker::TrackerError>(()),
            };
            if is_tracking_message(&ident) {
                tracker.try_upgrade(ident.seq_id, &mut iprot, &mut oprot).await?;
                continue;
            }

            tracker.try_read_request_header(&mut iprot).await?;
            let body = iprot.read_struct_frame().await?;
            iprot.read_message_end().await?;

            oprot
                .write_message_begin(&MessageIdentifier::new(
                    ident.name,
                    MessageType::Reply,
                    ident.seq_id,
                ))
                .await?;
            let ctx = CallContext::new().insert_response_meta("served-by", "accounts");
            tracker.try_write_response_header(&ctx, &mut oprot).await?;
            oprot.write_struct_frame(&body).await?;
            oprot.write_message_end().await?;
            oprot.flush().await?;
        }
    });

    let hooks = Hooks::silent()
        .on_response_header(|header| println!("client: response header {:?}", header));
    let tracker = SimpleTracker::new("billing", "accounts", hooks);
    let mut iprot = BinaryInputProtocol::new(client_in);
    let mut oprot = BinaryOutputProtocol::new(client_out);

    tracker.negotiation(1, &mut iprot, &mut oprot).await?;
    println!("client: negotiated version {}", tracker.version());

    let ctx = CallContext::new()
        .with_request_id("req-1")
        .with_seq("1")
        .insert_request_meta("caller", "billing");
    oprot
        .write_message_begin(&MessageIdentifier::new("echo", MessageType::Call, 2))
        .await?;
    tracker.try_write_request_header(&ctx, &mut oprot).await?;
    oprot.write_struct_frame(b"hello").await?;
    oprot.write_message_end().await?;
    oprot.flush().await?;

    iprot.read_message_begin().await?;
    tracker.try_read_response_header(&mut iprot).await?;
    let body = iprot.read_struct_frame().await?;
    println!("client: echo {:?}", String::from_utf8_lossy(&body));

    drop(oprot);
    server.await??;
    Ok(())
}
