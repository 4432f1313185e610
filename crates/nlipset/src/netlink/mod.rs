//! Async netlink plumbing for the netfilter subsystem.
//!
//! This layer knows nothing about ipset itself. It frames messages
//! ([`MessageBuilder`], [`netfilter::wrap`] / [`netfilter::unwrap`]),
//! represents attributes as an owned tree ([`Attribute`]) and exchanges
//! requests with the kernel through a [`Transport`].
//!
//! ```ignore
//! use nlipset::netlink::{Attribute, Connection, Transport};
//! use nlipset::netlink::netfilter::{self, Header, ProtoFamily};
//! use nlipset::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};
//!
//! let conn = Connection::new()?;
//!
//! // Flush every set (IPSET_CMD_FLUSH, protocol attribute only)
//! let header = Header::ipset(ProtoFamily::Unspec, 4, NLM_F_REQUEST | NLM_F_ACK);
//! let request = netfilter::wrap(&header, &[Attribute::new(1, vec![6])])?;
//! conn.query(request).await?;
//! ```

pub mod attr;
mod builder;
pub mod connection;
mod error;
pub mod message;
pub mod netfilter;
mod socket;

pub use attr::{AttrValue, Attribute, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use connection::{Connection, Transport};
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use netfilter::ProtoFamily;
pub use socket::NetlinkSocket;
