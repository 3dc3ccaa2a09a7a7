//! Transport layer.
//!
//! A Connection needs two endpoints: a pull-style inbound endpoint that
//! yields whole request messages, and a publish-style outbound endpoint for
//! replies. Addresses are opaque strings interpreted by the transport.
//! Closing an endpoint is dropping it.

pub mod inproc;
#[cfg(feature = "zmq")]
pub mod zeromq;

use bytes::Bytes;
use m2rs_core::Result;

pub use inproc::InProcTransport;
#[cfg(feature = "zmq")]
pub use zeromq::ZmqTransport;

/// Receiving side of a Connection.
pub trait InboundEndpoint {
    /// Block until one message arrives.
    ///
    /// Fails with `M2Error::Terminated` once the transport is torn down.
    fn recv(&mut self) -> Result<Bytes>;
}

/// Sending side of a Connection.
pub trait OutboundEndpoint {
    fn send(&mut self, msg: &[u8]) -> Result<()>;
}

/// Factory for connected endpoints.
pub trait Transport {
    type Inbound: InboundEndpoint;
    type Outbound: OutboundEndpoint;

    /// Pull endpoint connected to `addr`, tagged with `identity` when given.
    fn pull(&self, identity: Option<&[u8]>, addr: &str) -> Result<Self::Inbound>;

    /// Publish endpoint connected to `addr`.
    fn publish(&self, addr: &str) -> Result<Self::Outbound>;
}
