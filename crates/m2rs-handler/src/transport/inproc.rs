//! In-process transport.
//!
//! Push/pull addresses own one shared unbounded queue: requests pushed before
//! a handler connects wait for it, and each request goes to one puller.
//! Publish addresses fan out instead: every [`SubSocket`] gets its own
//! channel, each reply is copied to all live subscribers, and a reply with
//! no subscriber is dropped.
//!
//! [`InProcTransport::terminate`] closes every channel, which releases any
//! thread blocked in `recv` with `M2Error::Terminated`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use bytes::Bytes;
use dashmap::DashMap;

use m2rs_core::error::{M2Error, Result};

use super::{InboundEndpoint, OutboundEndpoint, Transport};

/// Address scheme accepted by this transport.
pub const INPROC_SCHEME: &str = "inproc://";

#[derive(Clone)]
struct Pipe {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
}

#[derive(Default)]
struct Registry {
    queues: DashMap<String, Pipe>,
    topics: DashMap<String, Vec<Sender<Bytes>>>,
    terminated: AtomicBool,
}

impl Registry {
    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    fn check(&self, addr: &str) -> Result<()> {
        if self.is_terminated() {
            return Err(M2Error::Terminated);
        }
        if !addr.starts_with(INPROC_SCHEME) || addr.len() == INPROC_SCHEME.len() {
            return Err(M2Error::Transport(format!(
                "unsupported in-process address: {addr:?}"
            )));
        }
        Ok(())
    }
}

/// Shared context; clones refer to the same address space.
#[derive(Clone, Default)]
pub struct InProcTransport {
    inner: Arc<Registry>,
}

impl InProcTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, addr: &str) -> Result<Pipe> {
        self.inner.check(addr)?;
        let pipe = self
            .inner
            .queues
            .entry(addr.to_string())
            .or_insert_with(|| {
                let (tx, rx) = async_channel::unbounded();
                Pipe { tx, rx }
            })
            .clone();
        // a terminate racing the insert may have missed this queue
        if self.inner.is_terminated() {
            pipe.tx.close();
            return Err(M2Error::Terminated);
        }
        Ok(pipe)
    }

    /// Server side: feed requests to handlers pulling from `addr`.
    pub fn push_socket(&self, addr: &str) -> Result<PushSocket> {
        let pipe = self.queue(addr)?;
        Ok(PushSocket { tx: pipe.tx })
    }

    /// Server side: receive every reply published to `addr` from now on.
    pub fn sub_socket(&self, addr: &str) -> Result<SubSocket> {
        self.inner.check(addr)?;
        let (tx, rx) = async_channel::unbounded();
        self.inner
            .topics
            .entry(addr.to_string())
            .or_default()
            .push(tx.clone());
        if self.inner.is_terminated() {
            tx.close();
            return Err(M2Error::Terminated);
        }
        Ok(SubSocket { rx })
    }

    /// Subscribers still attached to `addr`.
    pub fn connected_subscribers(&self, addr: &str) -> usize {
        self.inner
            .topics
            .get(addr)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Tear down every channel. Blocked and future receives fail with `Terminated`.
    pub fn terminate(&self) {
        self.inner.terminated.store(true, Ordering::SeqCst);
        for entry in self.inner.queues.iter() {
            entry.value().tx.close();
        }
        for entry in self.inner.topics.iter() {
            for tx in entry.value() {
                tx.close();
            }
        }
        tracing::debug!(
            queues = self.inner.queues.len(),
            topics = self.inner.topics.len(),
            "in-process transport terminated"
        );
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

impl Transport for InProcTransport {
    type Inbound = InProcPull;
    type Outbound = InProcPub;

    fn pull(&self, identity: Option<&[u8]>, addr: &str) -> Result<InProcPull> {
        let pipe = self.queue(addr)?;
        Ok(InProcPull {
            rx: pipe.rx,
            identity: identity.map(Bytes::copy_from_slice),
        })
    }

    fn publish(&self, addr: &str) -> Result<InProcPub> {
        self.inner.check(addr)?;
        Ok(InProcPub {
            addr: addr.to_string(),
            inner: Arc::clone(&self.inner),
        })
    }
}

pub struct InProcPull {
    rx: Receiver<Bytes>,
    identity: Option<Bytes>,
}

impl InProcPull {
    pub fn identity(&self) -> Option<&[u8]> {
        self.identity.as_deref()
    }
}

impl InboundEndpoint for InProcPull {
    fn recv(&mut self) -> Result<Bytes> {
        self.rx.recv_blocking().map_err(|_| M2Error::Terminated)
    }
}

pub struct InProcPub {
    addr: String,
    inner: Arc<Registry>,
}

impl OutboundEndpoint for InProcPub {
    fn send(&mut self, msg: &[u8]) -> Result<()> {
        if self.inner.is_terminated() {
            return Err(M2Error::Terminated);
        }
        let Some(mut subs) = self.inner.topics.get_mut(&self.addr) else {
            tracing::trace!(addr = %self.addr, "no subscriber, reply dropped");
            return Ok(());
        };
        let msg = Bytes::copy_from_slice(msg);
        // unbounded channels only refuse when the subscriber is gone
        subs.retain(|tx| tx.try_send(msg.clone()).is_ok());
        if subs.is_empty() {
            tracing::trace!(addr = %self.addr, "no subscriber, reply dropped");
        }
        Ok(())
    }
}

/// Producer half used by the server side.
pub struct PushSocket {
    tx: Sender<Bytes>,
}

impl PushSocket {
    pub fn send(&self, msg: impl Into<Bytes>) -> Result<()> {
        self.tx
            .send_blocking(msg.into())
            .map_err(|_| M2Error::Terminated)
    }

    /// Handler endpoints currently pulling from this address.
    pub fn connected_pullers(&self) -> usize {
        // the registry keeps one receiver of its own
        self.tx.receiver_count().saturating_sub(1)
    }
}

/// Consumer half used by the server side.
pub struct SubSocket {
    rx: Receiver<Bytes>,
}

impl SubSocket {
    pub fn recv(&self) -> Result<Bytes> {
        self.rx.recv_blocking().map_err(|_| M2Error::Terminated)
    }

    /// Non-blocking read; `None` when nothing is queued.
    pub fn try_recv(&self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_foreign_addresses() {
        let t = InProcTransport::new();
        assert!(t.pull(None, "tcp://127.0.0.1:9999").is_err());
        assert!(t.publish("inproc://").is_err());
        assert!(t.publish("inproc://replies").is_ok());
    }

    #[test]
    fn terminate_blocks_new_endpoints() {
        let t = InProcTransport::new();
        t.terminate();
        assert!(t.is_terminated());
        assert!(matches!(t.push_socket("inproc://x"), Err(M2Error::Terminated)));
        assert!(matches!(t.sub_socket("inproc://y"), Err(M2Error::Terminated)));
        assert!(matches!(t.publish("inproc://y"), Err(M2Error::Terminated)));
    }

    #[test]
    fn pull_endpoint_keeps_identity() {
        let t = InProcTransport::new();
        let tagged = t.pull(Some(b"handler-7"), "inproc://q").unwrap();
        assert_eq!(tagged.identity(), Some(&b"handler-7"[..]));
        let anon = t.pull(None, "inproc://q").unwrap();
        assert_eq!(anon.identity(), None);
    }

    #[test]
    fn terminate_closes_subscribers() {
        let t = InProcTransport::new();
        let sub = t.sub_socket("inproc://r").unwrap();
        let mut publ = t.publish("inproc://r").unwrap();
        publ.send(b"last").unwrap();
        t.terminate();

        // queued replies drain first
        assert_eq!(&sub.recv().unwrap()[..], b"last");
        assert!(matches!(sub.recv(), Err(M2Error::Terminated)));
        assert!(matches!(publ.send(b"x"), Err(M2Error::Terminated)));
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let t = InProcTransport::new();
        let keep = t.sub_socket("inproc://r").unwrap();
        let gone = t.sub_socket("inproc://r").unwrap();
        assert_eq!(t.connected_subscribers("inproc://r"), 2);

        drop(gone);
        assert_eq!(t.connected_subscribers("inproc://r"), 1);

        let mut publ = t.publish("inproc://r").unwrap();
        publ.send(b"x").unwrap();
        assert_eq!(&keep.recv().unwrap()[..], b"x");
        assert_eq!(t.inner.topics.get("inproc://r").map(|s| s.len()), Some(1));
    }
}
