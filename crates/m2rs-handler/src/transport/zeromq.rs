//! ZeroMQ transport (feature `zmq`), the transport Mongrel2 itself speaks.
//!
//! Requests arrive on a PULL socket connected to the server's PUSH address;
//! replies leave on a PUB socket connected to the server's SUB address.

use bytes::Bytes;

use m2rs_core::error::{M2Error, Result};

use super::{InboundEndpoint, OutboundEndpoint, Transport};

fn map_err(e: zmq::Error) -> M2Error {
    match e {
        zmq::Error::ETERM => M2Error::Terminated,
        other => M2Error::Transport(other.to_string()),
    }
}

/// Owns (a handle to) a ZeroMQ context.
#[derive(Clone)]
pub struct ZmqTransport {
    ctx: zmq::Context,
}

impl Default for ZmqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ZmqTransport {
    pub fn new() -> Self {
        Self {
            ctx: zmq::Context::new(),
        }
    }

    pub fn with_context(ctx: zmq::Context) -> Self {
        Self { ctx }
    }

    /// Terminate the context; blocked receives on its sockets fail with `Terminated`.
    pub fn terminate(&mut self) -> Result<()> {
        self.ctx.destroy().map_err(map_err)
    }
}

impl Transport for ZmqTransport {
    type Inbound = ZmqPull;
    type Outbound = ZmqPub;

    fn pull(&self, identity: Option<&[u8]>, addr: &str) -> Result<ZmqPull> {
        let socket = self.ctx.socket(zmq::PULL).map_err(map_err)?;
        if let Some(id) = identity {
            socket.set_identity(id).map_err(map_err)?;
        }
        socket.connect(addr).map_err(map_err)?;
        Ok(ZmqPull { socket })
    }

    fn publish(&self, addr: &str) -> Result<ZmqPub> {
        let socket = self.ctx.socket(zmq::PUB).map_err(map_err)?;
        socket.connect(addr).map_err(map_err)?;
        Ok(ZmqPub { socket })
    }
}

pub struct ZmqPull {
    socket: zmq::Socket,
}

impl InboundEndpoint for ZmqPull {
    fn recv(&mut self) -> Result<Bytes> {
        self.socket.recv_bytes(0).map(Bytes::from).map_err(map_err)
    }
}

pub struct ZmqPub {
    socket: zmq::Socket,
}

impl OutboundEndpoint for ZmqPub {
    fn send(&mut self, msg: &[u8]) -> Result<()> {
        self.socket.send(msg, 0).map_err(map_err)
    }
}
