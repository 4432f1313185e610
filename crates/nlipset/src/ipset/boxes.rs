//! Typed field boxes.
//!
//! A box is one typed value that knows how to become a single wire
//! attribute and how to come back from one. Policies hold boxes as
//! `Option<Box>`: `None` means the field is absent and is never sent, while
//! `Some(U32Box(0))` is a present zero and is sent like any other value.
//!
//! Byte order is a property of the box type, not of the call site. The
//! `Be*` boxes and [`DurationBox`] write big-endian payloads flagged
//! `NLA_F_NET_BYTEORDER`; the plain integer boxes use host order.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::types::IpAddrAttr;
use crate::netlink::attr::get;
use crate::netlink::{Attribute, Error, Result};

/// Encode a field as one attribute under the given tag.
pub trait Marshal {
    fn marshal(&self, kind: u16) -> Attribute;
}

/// Decode a field from one attribute.
pub trait Unmarshal: Sized {
    fn unmarshal(attr: &Attribute) -> Result<Self>;
}

/// A typed, self-marshaling field value.
pub trait FieldBox: Marshal + Unmarshal {
    /// Value handed out to callers.
    type Value: Default;

    /// The contained value.
    fn value(&self) -> Self::Value;
}

/// Read an optional box, falling back to the zero value when absent.
///
/// ```ignore
/// use nlipset::ipset::BoxGet;
///
/// let header = conn.header("blocklist").await?;
/// assert_eq!(header.revision.get(), 4);
/// // absent fields read as zero
/// assert_eq!(header.base.base.protocol.get(), 6);
/// ```
pub trait BoxGet {
    type Output;

    fn get(&self) -> Self::Output;
}

impl<B: FieldBox> BoxGet for Option<B> {
    type Output = B::Value;

    fn get(&self) -> B::Value {
        self.as_ref().map(FieldBox::value).unwrap_or_default()
    }
}

macro_rules! int_box {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $ctor:ident, $encode:ident, $decode:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub $ty);

        impl $name {
            pub fn new(value: $ty) -> Self {
                Self(value)
            }
        }

        impl Marshal for $name {
            fn marshal(&self, kind: u16) -> Attribute {
                Attribute::$ctor(kind, self.0.$encode())
            }
        }

        impl Unmarshal for $name {
            fn unmarshal(attr: &Attribute) -> Result<Self> {
                $decode(attr.data()).map(Self)
            }
        }

        impl FieldBox for $name {
            type Value = $ty;

            fn value(&self) -> $ty {
                self.0
            }
        }

        impl From<$ty> for $name {
            fn from(value: $ty) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                self.0.serialize(serializer)
            }
        }
    };
}

int_box!(
    /// Unsigned 8-bit value.
    U8Box, u8, new, to_ne_bytes, get::u8
);
int_box!(
    /// Unsigned 16-bit value in host byte order.
    U16Box, u16, new, to_ne_bytes, get::u16_ne
);
int_box!(
    /// Unsigned 32-bit value in host byte order.
    U32Box, u32, new, to_ne_bytes, get::u32_ne
);
int_box!(
    /// Unsigned 64-bit value in host byte order.
    U64Box, u64, new, to_ne_bytes, get::u64_ne
);
int_box!(
    /// Unsigned 16-bit value in network byte order.
    BeU16Box, u16, net, to_be_bytes, get::u16_be
);
int_box!(
    /// Unsigned 32-bit value in network byte order.
    BeU32Box, u32, net, to_be_bytes, get::u32_be
);
int_box!(
    /// Unsigned 64-bit value in network byte order.
    BeU64Box, u64, net, to_be_bytes, get::u64_be
);

/// Null-terminated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StrBox(pub String);

impl StrBox {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Marshal for StrBox {
    fn marshal(&self, kind: u16) -> Attribute {
        let mut data = Vec::with_capacity(self.0.len() + 1);
        data.extend_from_slice(self.0.as_bytes());
        data.push(0);
        Attribute::new(kind, data)
    }
}

impl Unmarshal for StrBox {
    fn unmarshal(attr: &Attribute) -> Result<Self> {
        get::string(attr.data()).map(Self::new)
    }
}

impl FieldBox for StrBox {
    type Value = String;

    fn value(&self) -> String {
        self.0.clone()
    }
}

impl From<&str> for StrBox {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for StrBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Serialize for StrBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Hardware (MAC) address, or any other raw byte payload.
///
/// Bytes are copied verbatim in both directions; no length is enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MacBox(pub Vec<u8>);

impl MacBox {
    pub fn new(addr: impl Into<Vec<u8>>) -> Self {
        Self(addr.into())
    }
}

impl Marshal for MacBox {
    fn marshal(&self, kind: u16) -> Attribute {
        Attribute::new(kind, self.0.clone())
    }
}

impl Unmarshal for MacBox {
    fn unmarshal(attr: &Attribute) -> Result<Self> {
        Ok(Self(attr.data().to_vec()))
    }
}

impl FieldBox for MacBox {
    type Value = Vec<u8>;

    fn value(&self) -> Vec<u8> {
        self.0.clone()
    }
}

impl From<[u8; 6]> for MacBox {
    fn from(addr: [u8; 6]) -> Self {
        Self(addr.to_vec())
    }
}

impl fmt::Display for MacBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl Serialize for MacBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// IPv4 or IPv6 address.
///
/// On the wire this is a nested attribute with exactly one child tagged
/// [`IpAddrAttr::IPV4`] (4 bytes) or [`IpAddrAttr::IPV6`] (16 bytes).
/// IPv4-mapped IPv6 addresses are sent in the 4-byte form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpBox(pub IpAddr);

impl IpBox {
    pub fn new(addr: impl Into<IpAddr>) -> Self {
        Self(addr.into())
    }
}

impl Marshal for IpBox {
    fn marshal(&self, kind: u16) -> Attribute {
        let child = match self.0 {
            IpAddr::V4(v4) => Attribute::net(IpAddrAttr::IPV4, v4.octets()),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Attribute::net(IpAddrAttr::IPV4, v4.octets()),
                None => Attribute::net(IpAddrAttr::IPV6, v6.octets()),
            },
        };
        Attribute::nested(kind, vec![child])
    }
}

impl Unmarshal for IpBox {
    fn unmarshal(attr: &Attribute) -> Result<Self> {
        let children = attr.nested_children("ip address")?;
        let [child] = children else {
            return Err(Error::InvalidAttribute(format!(
                "ip address attribute (type {}) has {} children, expected 1",
                attr.kind(),
                children.len()
            )));
        };

        let data = child.data();
        if let Ok(octets) = <[u8; 4]>::try_from(data) {
            Ok(Self(IpAddr::V4(Ipv4Addr::from(octets))))
        } else if let Ok(octets) = <[u8; 16]>::try_from(data) {
            Ok(Self(IpAddr::V6(Ipv6Addr::from(octets))))
        } else {
            Err(Error::InvalidAttribute(format!(
                "ip address payload of {} bytes",
                data.len()
            )))
        }
    }
}

impl FieldBox for IpBox {
    type Value = Option<IpAddr>;

    fn value(&self) -> Option<IpAddr> {
        Some(self.0)
    }
}

impl From<IpAddr> for IpBox {
    fn from(addr: IpAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for IpBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for IpBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// Duration in whole seconds, sent as a network-order u32.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DurationBox {
    secs: u32,
}

impl DurationBox {
    /// Sub-second parts are truncated; durations above `u32::MAX` seconds
    /// saturate.
    pub fn new(duration: Duration) -> Self {
        Self {
            secs: u32::try_from(duration.as_secs()).unwrap_or(u32::MAX),
        }
    }

    pub fn from_secs(secs: u32) -> Self {
        Self { secs }
    }

    pub fn as_secs(&self) -> u32 {
        self.secs
    }
}

impl Marshal for DurationBox {
    fn marshal(&self, kind: u16) -> Attribute {
        Attribute::net(kind, self.secs.to_be_bytes())
    }
}

impl Unmarshal for DurationBox {
    fn unmarshal(attr: &Attribute) -> Result<Self> {
        get::u32_be(attr.data()).map(Self::from_secs)
    }
}

impl FieldBox for DurationBox {
    type Value = Duration;

    fn value(&self) -> Duration {
        Duration::from_secs(self.secs as u64)
    }
}

impl From<Duration> for DurationBox {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}

impl fmt::Display for DurationBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.secs)
    }
}

impl Serialize for DurationBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.secs)
    }
}
