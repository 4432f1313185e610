//! Request/response exchange over the netfilter socket.

use std::future::Future;
use std::os::unix::io::RawFd;
use std::path::Path;

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{MessageIter, NLM_F_ACK, NLM_F_DUMP, NlMsgError, NlMsgType};
use super::socket::NetlinkSocket;

/// Send one request, receive the messages it produced.
///
/// This is the seam between the ipset codec and the kernel. [`Connection`]
/// implements it over a real socket; tests plug in an in-memory kernel.
///
/// Implementations return every data message answering the request, each
/// as a complete netlink message (header included), in the order received.
/// ACK and DONE frames are consumed, never returned. A non-zero error frame
/// becomes [`Error::Kernel`].
pub trait Transport: Send + Sync {
    /// Run one exchange.
    fn query(&self, request: MessageBuilder) -> impl Future<Output = Result<Vec<Vec<u8>>>> + Send;
}

/// Netlink connection to the netfilter subsystem.
pub struct Connection {
    socket: NetlinkSocket,
}

impl Connection {
    /// Open a connection in the caller's network namespace.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
        })
    }

    /// Open a connection in the namespace referred to by `ns_fd`.
    pub fn new_in_namespace(ns_fd: RawFd) -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new_in_namespace(ns_fd)?,
        })
    }

    /// Open a connection in the namespace at `ns_path`.
    ///
    /// ```ignore
    /// // For a named namespace (created via `ip netns add fw`)
    /// let conn = Connection::new_in_namespace_path("/var/run/netns/fw")?;
    /// ```
    pub fn new_in_namespace_path<P: AsRef<Path>>(ns_path: P) -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new_in_namespace_path(ns_path)?,
        })
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }
}

impl Transport for Connection {
    async fn query(&self, mut request: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.next_seq();
        request.set_seq(seq);
        request.set_pid(self.socket.pid());

        let mut collector = ResponseCollector::new(seq, request.flags());
        let msg = request.finish();
        self.socket.send(&msg).await?;

        loop {
            let data = self.socket.recv_msg().await?;
            if collector.feed(&data)? {
                return Ok(collector.into_responses());
            }
        }
    }
}

/// Accumulates the messages answering one request.
///
/// The exchange ends on an ACK when one was requested, on `NLMSG_DONE` for
/// dumps, and otherwise on the first data message.
#[derive(Debug)]
pub(crate) struct ResponseCollector {
    seq: u32,
    ack: bool,
    dump: bool,
    responses: Vec<Vec<u8>>,
}

impl ResponseCollector {
    pub(crate) fn new(seq: u32, request_flags: u16) -> Self {
        Self {
            seq,
            ack: request_flags & NLM_F_ACK != 0,
            dump: request_flags & NLM_F_DUMP == NLM_F_DUMP,
            responses: Vec::new(),
        }
    }

    /// Process one received datagram. Returns true once the exchange is over.
    pub(crate) fn feed(&mut self, data: &[u8]) -> Result<bool> {
        for result in MessageIter::new(data) {
            let (header, message, payload) = result?;

            if header.nlmsg_seq != self.seq {
                tracing::trace!(
                    seq = header.nlmsg_seq,
                    expected = self.seq,
                    "dropping message with foreign sequence number"
                );
                continue;
            }

            match header.nlmsg_type {
                NlMsgType::NOOP => continue,
                NlMsgType::ERROR => {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno(err.error));
                    }
                    return Ok(true);
                }
                NlMsgType::DONE => return Ok(true),
                NlMsgType::OVERRUN => {
                    return Err(Error::InvalidMessage("netlink buffer overrun".into()));
                }
                _ => {
                    self.responses.push(message.to_vec());
                    if !self.ack && !self.dump {
                        return Ok(true);
                    }
                }
            }
        }

        Ok(false)
    }

    pub(crate) fn into_responses(self) -> Vec<Vec<u8>> {
        self.responses
    }
}
