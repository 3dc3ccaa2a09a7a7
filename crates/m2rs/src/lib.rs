//! Top-level facade crate for m2rs.
//!
//! Re-exports the protocol core and the handler library so users can depend on a single crate.

pub mod core {
    pub use m2rs_core::*;
}

pub mod handler {
    pub use m2rs_handler::*;
}
