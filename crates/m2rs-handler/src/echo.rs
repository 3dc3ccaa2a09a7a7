//! Echo handler: answers each request with its path, headers and body as JSON.
//! Useful to prove the request/reply path end to end.

use m2rs_core::error::{M2Error, Result};
use m2rs_core::protocol::envelope::RequestEnvelope;
use m2rs_core::protocol::json::dump_json;
use m2rs_core::{Tag, Variant};

use crate::connection::Connection;
use crate::transport::{InboundEndpoint, OutboundEndpoint};

/// JSON document describing `req`.
pub fn echo_body(req: &RequestEnvelope) -> Result<String> {
    let mut doc = Variant::new(Tag::Dict);
    doc.dict_set("path", Variant::String(req.path.clone()))?;
    doc.dict_set("conn_id", Variant::String(req.connection_id.clone()))?;
    doc.dict_set("headers", req.headers.clone())?;
    if let Some(body) = req.body_bytes() {
        doc.dict_set("body", Variant::from(String::from_utf8_lossy(body).into_owned()))?;
    }
    dump_json(&doc)
}

/// Serve requests until the transport is torn down. Returns the number of replies sent.
pub fn run<I, O>(conn: &mut Connection<I, O>) -> Result<u64>
where
    I: InboundEndpoint,
    O: OutboundEndpoint,
{
    let mut served = 0;
    loop {
        let req = match conn.recv() {
            Ok(req) => req,
            Err(M2Error::Terminated) => return Ok(served),
            Err(e @ M2Error::Transport(_)) => return Err(e),
            // already logged by recv; keep serving
            Err(_) => continue,
        };

        if req.is_disconnect() {
            tracing::debug!(conn_id = %String::from_utf8_lossy(&req.connection_id), "client disconnected");
            continue;
        }

        let sent = match echo_body(&req) {
            Ok(body) => conn.reply_http(
                &req,
                body.as_bytes(),
                200,
                "OK",
                &[("Content-Type", "application/json")],
            ),
            Err(e) => {
                tracing::warn!(error = %e, "request cannot be echoed as JSON");
                conn.reply_http(&req, b"", 400, "Bad Request", &[])
            }
        };

        match sent {
            Ok(()) => served += 1,
            Err(M2Error::Terminated) => return Ok(served),
            Err(e) => tracing::warn!(error = %e, "reply failed"),
        }
    }
}
