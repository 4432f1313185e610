//! Netfilter (nfnetlink) message envelope.
//!
//! Every nfnetlink message is a netlink header followed by a 4-byte
//! `nfgenmsg` (family, version, resource id) and a flat attribute list. The
//! message type packs the subsystem id in the high byte and the
//! subsystem-specific command in the low byte.

use winnow::binary::{be_u16, le_u8};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

use super::attr::Attribute;
use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr};

type PResult<T> = std::result::Result<T, ErrMode<ContextError>>;

/// nfnetlink protocol version.
pub const NFNETLINK_V0: u8 = 0;

/// Subsystem id of ipset within nfnetlink.
pub const NFNL_SUBSYS_IPSET: u8 = 6;

/// Length of the nfgenmsg header.
pub const NFGENMSG_LEN: usize = 4;

/// Netfilter protocol family (NFPROTO_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtoFamily {
    /// Unspecified (0)
    #[default]
    Unspec,
    /// Dual-stack inet (1)
    Inet,
    /// IPv4 (2)
    Ipv4,
    /// ARP (3)
    Arp,
    /// Netdev (5)
    Netdev,
    /// Bridge (7)
    Bridge,
    /// IPv6 (10)
    Ipv6,
    /// DECnet (12)
    Decnet,
    /// Other family
    Other(u8),
}

impl ProtoFamily {
    /// Convert from the wire value.
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => Self::Unspec,
            1 => Self::Inet,
            2 => Self::Ipv4,
            3 => Self::Arp,
            5 => Self::Netdev,
            7 => Self::Bridge,
            10 => Self::Ipv6,
            12 => Self::Decnet,
            other => Self::Other(other),
        }
    }

    /// Get the family number.
    pub fn number(&self) -> u8 {
        match self {
            Self::Unspec => 0,
            Self::Inet => 1,
            Self::Ipv4 => 2,
            Self::Arp => 3,
            Self::Netdev => 5,
            Self::Bridge => 7,
            Self::Ipv6 => 10,
            Self::Decnet => 12,
            Self::Other(n) => *n,
        }
    }
}

impl From<ProtoFamily> for u8 {
    fn from(family: ProtoFamily) -> Self {
        family.number()
    }
}

/// nfgenmsg header (4 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NfGenMsg {
    family: u8,
    version: u8,
    res_id: u16,
}

impl NfGenMsg {
    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let family = le_u8.parse_next(input)?;
        let version = le_u8.parse_next(input)?;
        let res_id = be_u16.parse_next(input)?;
        Ok(Self {
            family,
            version,
            res_id,
        })
    }

    fn to_bytes(self) -> [u8; NFGENMSG_LEN] {
        let res_id = self.res_id.to_be_bytes();
        [self.family, self.version, res_id[0], res_id[1]]
    }
}

/// Decoded envelope of an nfnetlink message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol family from nfgenmsg.
    pub family: ProtoFamily,
    /// nfnetlink subsystem id.
    pub subsystem: u8,
    /// Subsystem command.
    pub message_type: u8,
    /// Netlink header flags.
    pub flags: u16,
}

impl Header {
    /// Header for an ipset command.
    pub fn ipset(family: ProtoFamily, command: u8, flags: u16) -> Self {
        Self {
            family,
            subsystem: NFNL_SUBSYS_IPSET,
            message_type: command,
            flags,
        }
    }

    /// Netlink message type (subsystem << 8 | command).
    pub fn nlmsg_type(&self) -> u16 {
        ((self.subsystem as u16) << 8) | self.message_type as u16
    }
}

/// Build an outbound message from an envelope header and attributes.
///
/// Fails if an attribute does not fit its 16-bit length field, as happens
/// with a very large element list.
pub fn wrap(header: &Header, attrs: &[Attribute]) -> Result<MessageBuilder> {
    let mut builder = MessageBuilder::new(header.nlmsg_type(), header.flags);
    let nfgen = NfGenMsg {
        family: header.family.number(),
        version: NFNETLINK_V0,
        res_id: 0,
    };
    builder.append_bytes(&nfgen.to_bytes());
    for attr in attrs {
        builder.append_attribute(attr)?;
    }
    Ok(builder)
}

/// Split an inbound message into its envelope header and attributes.
pub fn unwrap(message: &[u8]) -> Result<(Header, Vec<Attribute>)> {
    let nlh = NlMsgHdr::from_bytes(message)?;
    let len = nlh.nlmsg_len as usize;
    if len < NLMSG_HDRLEN + NFGENMSG_LEN {
        return Err(Error::Truncated {
            expected: NLMSG_HDRLEN + NFGENMSG_LEN,
            actual: len,
        });
    }
    if len > message.len() {
        return Err(Error::InvalidMessage(format!(
            "message length {} exceeds buffer of {} bytes",
            len,
            message.len()
        )));
    }

    let mut input = &message[NLMSG_HDRLEN..len];
    let nfgen = NfGenMsg::parse(&mut input).map_err(|_| Error::Truncated {
        expected: NFGENMSG_LEN,
        actual: len - NLMSG_HDRLEN,
    })?;

    let header = Header {
        family: ProtoFamily::from_u8(nfgen.family),
        subsystem: (nlh.nlmsg_type >> 8) as u8,
        message_type: (nlh.nlmsg_type & 0xff) as u8,
        flags: nlh.nlmsg_flags,
    };

    Ok((header, Attribute::parse_all(input)?))
}
