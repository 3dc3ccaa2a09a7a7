//! m2rs handler library entry.
//!
//! Wires the protocol core to a message transport: a `Connection` owns one
//! pull endpoint for requests and one publish endpoint for replies. Ships an
//! in-process transport (tests, embedding) and, behind the `zmq` feature, the
//! ZeroMQ transport Mongrel2 speaks.

pub mod config;
pub mod connection;
pub mod echo;
pub mod transport;

pub use connection::Connection;
