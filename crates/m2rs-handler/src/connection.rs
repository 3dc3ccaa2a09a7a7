//! Handler connection: one inbound pull endpoint plus one outbound publish endpoint.
//!
//! A `Connection` is driven by a single thread. `recv` blocks until a request
//! arrives; a malformed request is reported as an error and the connection
//! stays usable. Dropping the connection (or calling `close`) releases both
//! endpoints.

use bytes::Bytes;

use m2rs_core::error::{M2Error, Result};
use m2rs_core::protocol::envelope::{
    format_http, format_reply, format_reply_many, parse_envelope_with, ParseOptions,
    RequestEnvelope,
};

use crate::config::HandlerSection;
use crate::transport::{InboundEndpoint, OutboundEndpoint, Transport};

/// Size cap applied when none is configured (256 KiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 256 * 1024;

pub struct Connection<I, O> {
    identity: Option<Bytes>,
    inbound_addr: String,
    outbound_addr: String,
    inbound: I,
    outbound: O,
    parse_opts: ParseOptions,
    max_message_bytes: usize,
}

impl<I, O> Connection<I, O>
where
    I: InboundEndpoint,
    O: OutboundEndpoint,
{
    /// Connect the inbound endpoint to `inbound_addr` and the outbound one to `outbound_addr`.
    ///
    /// If the second endpoint fails, the first is released before returning.
    pub fn open<T>(
        transport: &T,
        identity: Option<&[u8]>,
        inbound_addr: &str,
        outbound_addr: &str,
    ) -> Result<Self>
    where
        T: Transport<Inbound = I, Outbound = O>,
    {
        let inbound = transport.pull(identity, inbound_addr).map_err(|e| {
            tracing::warn!(addr = %inbound_addr, error = %e, "inbound endpoint failed");
            e
        })?;
        // on error `inbound` drops here, closing it
        let outbound = transport.publish(outbound_addr).map_err(|e| {
            tracing::warn!(addr = %outbound_addr, error = %e, "outbound endpoint failed");
            e
        })?;

        tracing::info!(
            inbound = %inbound_addr,
            outbound = %outbound_addr,
            identity = ?identity.map(String::from_utf8_lossy),
            "handler connection open"
        );

        Ok(Self {
            identity: identity.map(Bytes::copy_from_slice),
            inbound_addr: inbound_addr.to_string(),
            outbound_addr: outbound_addr.to_string(),
            inbound,
            outbound,
            parse_opts: ParseOptions::default(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        })
    }

    /// Open using a validated config section.
    pub fn from_config<T>(transport: &T, cfg: &HandlerSection) -> Result<Self>
    where
        T: Transport<Inbound = I, Outbound = O>,
    {
        let conn = Self::open(
            transport,
            cfg.sender_id.as_deref().map(str::as_bytes),
            &cfg.recv_addr,
            &cfg.send_addr,
        )?;
        Ok(conn
            .with_parse_options(cfg.parse_options())
            .with_max_message_bytes(cfg.max_message_bytes))
    }

    pub fn with_parse_options(mut self, opts: ParseOptions) -> Self {
        self.parse_opts = opts;
        self
    }

    pub fn with_max_message_bytes(mut self, limit: usize) -> Self {
        self.max_message_bytes = limit;
        self
    }

    pub fn identity(&self) -> Option<&[u8]> {
        self.identity.as_deref()
    }

    pub fn inbound_addr(&self) -> &str {
        &self.inbound_addr
    }

    pub fn outbound_addr(&self) -> &str {
        &self.outbound_addr
    }

    /// Block for the next request and parse it.
    pub fn recv(&mut self) -> Result<RequestEnvelope> {
        let raw = self.inbound.recv()?;

        if raw.len() > self.max_message_bytes {
            tracing::warn!(
                size = raw.len(),
                limit = self.max_message_bytes,
                "dropping oversized request"
            );
            return Err(M2Error::TooLarge {
                size: raw.len(),
                limit: self.max_message_bytes,
            });
        }

        match parse_envelope_with(&raw, &self.parse_opts) {
            Ok(req) => {
                tracing::debug!(
                    sender = %String::from_utf8_lossy(&req.sender_id),
                    conn_id = %String::from_utf8_lossy(&req.connection_id),
                    path = %String::from_utf8_lossy(&req.path),
                    "request"
                );
                Ok(req)
            }
            Err(e) => {
                tracing::warn!(error = %e, size = raw.len(), "dropping malformed request");
                Err(e)
            }
        }
    }

    /// Send `payload` to one connection id (or several, already space-joined).
    pub fn send(&mut self, sender_id: &[u8], connection_id: &[u8], payload: &[u8]) -> Result<()> {
        let msg = format_reply(sender_id, connection_id, payload)?;
        self.outbound.send(&msg)
    }

    /// Send one `payload` to every id in `conn_ids`.
    pub fn deliver(&mut self, sender_id: &[u8], conn_ids: &[&[u8]], payload: &[u8]) -> Result<()> {
        let msg = format_reply_many(sender_id, conn_ids, payload)?;
        self.outbound.send(&msg)
    }

    /// Reply to the client that sent `req`.
    pub fn reply(&mut self, req: &RequestEnvelope, payload: &[u8]) -> Result<()> {
        self.send(&req.sender_id, &req.connection_id, payload)
    }

    pub fn reply_http(
        &mut self,
        req: &RequestEnvelope,
        body: &[u8],
        code: u16,
        status: &str,
        headers: &[(&str, &str)],
    ) -> Result<()> {
        let payload = format_http(body, code, status, headers);
        self.reply(req, &payload)
    }

    /// Ask the server to close the client connection (empty payload).
    pub fn reply_close(&mut self, req: &RequestEnvelope) -> Result<()> {
        self.reply(req, b"")
    }

    /// Release both endpoints.
    pub fn close(self) {
        tracing::info!(
            inbound = %self.inbound_addr,
            outbound = %self.outbound_addr,
            "handler connection closed"
        );
    }
}
