//! Protocol modules.
//!
//! - `tnetstring`: length-prefixed, type-tagged values (`LEN:PAYLOAD<TAG>`).
//! - `json`: JSON text to and from `Variant`, for diagnostics and JSON headers.
//! - `envelope`: the `SENDER CONN_ID PATH HEADERS[BODY]` request framing and
//!   the `SENDER LEN:CONN_ID, PAYLOAD` reply framing.
//!
//! All parsers work on bounds-checked slices and report malformed input as
//! `M2Error` instead of panicking or reading outside the buffer.

pub mod envelope;
pub mod json;
pub mod tnetstring;

/// Nesting limit applied when no explicit limit is given.
pub const DEFAULT_MAX_DEPTH: usize = 64;
