//! Request/reply envelopes.
//!
//! Request wire layout (one transport message):
//!
//! ```text
//! <sender_id> <connection_id> <path> <tnetstring-headers><tnetstring-body?>
//! ```
//!
//! Reply wire layout:
//!
//! ```text
//! <sender_id> <len>:<connection_id>, <payload>
//! ```
//!
//! The three leading tokens carry no escaping, so an empty token or a token
//! with an embedded space cannot be told apart from a framing error and is
//! rejected.

use bytes::{BufMut, Bytes, BytesMut};

use super::{json, tnetstring, DEFAULT_MAX_DEPTH};
use crate::error::{M2Error, Result};
use crate::variant::Variant;

/// Most connection ids Mongrel2 accepts in one reply.
pub const MAX_CONN_IDS: usize = 128;

/// How the header value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderFormat {
    /// Headers must be a TNetstring dict.
    #[default]
    TNetstring,
    /// Also accept a TNetstring string holding a JSON object.
    Auto,
}

/// Options for [`parse_envelope_with`].
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub header_format: HeaderFormat,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            header_format: HeaderFormat::TNetstring,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One parsed request. Owns copies of every field, independent of the receive buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    /// Identity of the Mongrel2 server that sent the request.
    pub sender_id: Bytes,
    /// Client connection the request arrived on.
    pub connection_id: Bytes,
    /// Path that matched the route.
    pub path: Bytes,
    /// Always a `Variant::Dict`.
    pub headers: Variant,
    /// Second TNetstring value, if present.
    pub body: Option<Variant>,
}

impl RequestEnvelope {
    pub fn header(&self, name: &str) -> Option<&Variant> {
        self.headers.dict_get(name.as_bytes())
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.dict_get_str(name.as_bytes())
    }

    /// Raw body bytes when the body is string-tagged.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_ref().and_then(Variant::as_bytes)
    }

    pub fn path_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.path).ok()
    }

    /// Mongrel2 reports a closed client as a `JSON` method request whose
    /// body is `{"type":"disconnect"}`.
    pub fn is_disconnect(&self) -> bool {
        if self.header_str("METHOD") != Some("JSON") {
            return false;
        }
        let Some(text) = self.body.as_ref().and_then(Variant::as_str) else {
            return false;
        };
        json::parse_json(text)
            .map(|msg| msg.dict_get_str(b"type") == Some("disconnect"))
            .unwrap_or(false)
    }
}

/// Parse one raw request message with default options.
pub fn parse_envelope(raw: &[u8]) -> Result<RequestEnvelope> {
    parse_envelope_with(raw, &ParseOptions::default())
}

pub fn parse_envelope_with(raw: &[u8], opts: &ParseOptions) -> Result<RequestEnvelope> {
    let (sender_id, rest) = split_token(raw, "sender id")?;
    let (connection_id, rest) = split_token(rest, "connection id")?;
    let (path, rest) = split_token(rest, "path")?;

    let (headers, rest) = tnetstring::parse_prefix_with_depth(rest, opts.max_depth)?;
    let headers = match (headers, opts.header_format) {
        (h @ Variant::Dict(_), _) => h,
        (Variant::String(text), HeaderFormat::Auto) => json_headers(&text, opts.max_depth)?,
        (other, _) => {
            return Err(M2Error::TypeMismatch {
                expected: "dict headers",
                found: other.tag().name(),
            })
        }
    };

    let body = if rest.is_empty() {
        None
    } else {
        let (body, trailing) = tnetstring::parse_prefix_with_depth(rest, opts.max_depth)?;
        if !trailing.is_empty() {
            return Err(M2Error::malformed(format!(
                "{} trailing bytes after body",
                trailing.len()
            )));
        }
        Some(body)
    };

    Ok(RequestEnvelope {
        sender_id: Bytes::copy_from_slice(sender_id),
        connection_id: Bytes::copy_from_slice(connection_id),
        path: Bytes::copy_from_slice(path),
        headers,
        body,
    })
}

fn json_headers(text: &[u8], max_depth: usize) -> Result<Variant> {
    let text = std::str::from_utf8(text)
        .map_err(|_| M2Error::malformed("JSON headers are not valid UTF-8"))?;
    match json::parse_json_with_depth(text, max_depth)? {
        h @ Variant::Dict(_) => Ok(h),
        other => Err(M2Error::TypeMismatch {
            expected: "dict headers",
            found: other.tag().name(),
        }),
    }
}

/// Split a space-terminated token off the front of `buf`.
fn split_token<'a>(buf: &'a [u8], field: &str) -> Result<(&'a [u8], &'a [u8])> {
    let mut parts = buf.splitn(2, |&b| b == b' ');
    let token = parts.next().unwrap_or_default();
    let rest = parts
        .next()
        .ok_or_else(|| M2Error::malformed(format!("{field}: no terminating space")))?;
    if token.is_empty() {
        return Err(M2Error::malformed(format!("{field}: empty token")));
    }
    Ok((token, rest))
}

fn check_token(token: &[u8], field: &str) -> Result<()> {
    if token.is_empty() {
        return Err(M2Error::malformed(format!("{field}: empty token")));
    }
    if token.contains(&b' ') {
        return Err(M2Error::malformed(format!("{field}: embedded space")));
    }
    Ok(())
}

/// Frame a reply: `<sender_id> <len>:<connection_id>, <payload>`.
///
/// `connection_id` is opaque here and may already hold several space-joined ids.
pub fn format_reply(sender_id: &[u8], connection_id: &[u8], payload: &[u8]) -> Result<Bytes> {
    check_token(sender_id, "sender id")?;

    let len = connection_id.len().to_string();
    let mut out = BytesMut::with_capacity(
        sender_id.len() + 1 + len.len() + 1 + connection_id.len() + 2 + payload.len(),
    );
    out.put_slice(sender_id);
    out.put_u8(b' ');
    out.put_slice(len.as_bytes());
    out.put_u8(b':');
    out.put_slice(connection_id);
    out.put_slice(b", ");
    out.put_slice(payload);
    Ok(out.freeze())
}

/// Frame one reply addressed to several clients.
pub fn format_reply_many(sender_id: &[u8], conn_ids: &[&[u8]], payload: &[u8]) -> Result<Bytes> {
    if conn_ids.is_empty() {
        return Err(M2Error::malformed("no connection ids"));
    }
    if conn_ids.len() > MAX_CONN_IDS {
        return Err(M2Error::malformed(format!(
            "{} connection ids exceed the limit of {MAX_CONN_IDS}",
            conn_ids.len()
        )));
    }
    for id in conn_ids {
        check_token(id, "connection id")?;
    }

    let joined = conn_ids.join(&b' ');
    format_reply(sender_id, &joined, payload)
}

/// Build a minimal HTTP/1.1 response to carry as a reply payload.
pub fn format_http(body: &[u8], code: u16, status: &str, headers: &[(&str, &str)]) -> Bytes {
    let mut head = format!("HTTP/1.1 {code} {status}\r\nContent-Length: {}\r\n", body.len());
    for (k, v) in headers {
        head.push_str(k);
        head.push_str(": ");
        head.push_str(v);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let mut out = BytesMut::with_capacity(head.len() + body.len());
    out.put_slice(head.as_bytes());
    out.put_slice(body);
    out.freeze()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn split_token_needs_terminator() {
        assert_eq!(split_token(b"a b", "f").unwrap(), (&b"a"[..], &b"b"[..]));
        assert_eq!(split_token(b"a ", "f").unwrap(), (&b"a"[..], &b""[..]));
        assert!(split_token(b"abc", "f").is_err());
        assert!(split_token(b" abc", "f").is_err());
        assert!(split_token(b"", "f").is_err());
    }

    #[test]
    fn http_response_layout() {
        let out = format_http(b"hi", 200, "OK", &[("Content-Type", "text/plain")]);
        assert_eq!(
            &out[..],
            &b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nContent-Type: text/plain\r\n\r\nhi"[..]
        );
    }
}
