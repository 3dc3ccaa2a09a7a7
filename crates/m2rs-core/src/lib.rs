//! m2rs core: transport-agnostic pieces of the Mongrel2 handler protocol.
//!
//! This crate holds the `Variant` value model, the TNetstring and JSON codecs,
//! and request/reply envelope framing. It performs no I/O so it can be driven
//! by any transport (see `m2rs-handler`).
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are denied here. Every malformed input
//! surfaces as `M2Error`, and a failed parse never hands back a partial tree.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod variant;

/// Shared result type.
pub use error::{ErrorCode, M2Error, Result};
pub use protocol::envelope::{format_reply, parse_envelope, RequestEnvelope};
pub use variant::{Dict, Tag, Variant};
