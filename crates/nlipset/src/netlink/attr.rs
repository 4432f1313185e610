//! Netlink attribute (nlattr) handling.
//!
//! Two levels live here: the raw header ([`NlAttr`]) with typed payload
//! getters, and the owned [`Attribute`] tree that the ipset codec marshals
//! into and unmarshals from.

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Largest attribute, header included, that `nla_len` can describe.
pub const NLA_MAX_LEN: usize = u16::MAX as usize;

/// Check that an attribute of `len` bytes fits the 16-bit length field.
pub(crate) fn checked_len(attr_type: u16, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| {
        Error::InvalidMessage(format!(
            "attribute too large: type {} needs {} bytes, limit is {}",
            attr_type & NLA_TYPE_MASK,
            len,
            NLA_MAX_LEN
        ))
    })
}

/// Netlink attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    ///
    /// Fails when header and payload together exceed [`NLA_MAX_LEN`].
    pub fn new(attr_type: u16, data_len: usize) -> Result<Self> {
        Ok(Self {
            nla_len: checked_len(attr_type, NLA_HDRLEN + data_len)?,
            nla_type: attr_type,
        })
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Check if this is a nested attribute.
    pub fn is_nested(&self) -> bool {
        self.nla_type & NLA_F_NESTED != 0
    }

    /// Check if the payload is in network byte order.
    pub fn is_net_byte_order(&self) -> bool {
        self.nla_type & NLA_F_NET_BYTEORDER != 0
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse from bytes. The buffer need not be aligned.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        if data.is_empty() {
            return Err(Error::InvalidAttribute("empty u8 attribute".into()));
        }
        Ok(data[0])
    }

    fn array<const N: usize>(data: &[u8], what: &str) -> Result<[u8; N]> {
        data.get(..N)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::InvalidAttribute(format!("truncated {} attribute", what)))
    }

    /// Extract a u16 value (native endian).
    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        array(data, "u16").map(u16::from_ne_bytes)
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        array(data, "u32").map(u32::from_ne_bytes)
    }

    /// Extract a u64 value (native endian).
    pub fn u64_ne(data: &[u8]) -> Result<u64> {
        array(data, "u64").map(u64::from_ne_bytes)
    }

    /// Extract a u16 value (big endian / network order).
    pub fn u16_be(data: &[u8]) -> Result<u16> {
        array(data, "u16").map(u16::from_be_bytes)
    }

    /// Extract a u32 value (big endian / network order).
    pub fn u32_be(data: &[u8]) -> Result<u32> {
        array(data, "u32").map(u32::from_be_bytes)
    }

    /// Extract a u64 value (big endian / network order).
    pub fn u64_be(data: &[u8]) -> Result<u64> {
        array(data, "u64").map(u64::from_be_bytes)
    }

    /// Extract a null-terminated string.
    ///
    /// Everything from the first NUL byte on is padding and ignored.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }
}

/// Payload of an [`Attribute`]: raw bytes or child attributes, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Scalar or blob payload.
    Data(Vec<u8>),
    /// Nested attribute list.
    Nested(Vec<Attribute>),
}

/// An owned netlink attribute, possibly nested.
///
/// This is the generic wire unit of the netfilter attribute format: a type
/// tag, a network-byte-order marker and either a payload or an ordered list
/// of children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    kind: u16,
    net_byte_order: bool,
    value: AttrValue,
}

impl Attribute {
    /// Create a scalar attribute with a host-order (or order-free) payload.
    pub fn new(kind: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind & NLA_TYPE_MASK,
            net_byte_order: false,
            value: AttrValue::Data(data.into()),
        }
    }

    /// Create a scalar attribute whose payload is in network byte order.
    pub fn net(kind: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            net_byte_order: true,
            ..Self::new(kind, data)
        }
    }

    /// Create a nested attribute.
    pub fn nested(kind: u16, children: Vec<Attribute>) -> Self {
        Self {
            kind: kind & NLA_TYPE_MASK,
            net_byte_order: false,
            value: AttrValue::Nested(children),
        }
    }

    /// Attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.kind
    }

    /// Check if this is a nested attribute.
    pub fn is_nested(&self) -> bool {
        matches!(self.value, AttrValue::Nested(_))
    }

    /// Check if the payload is flagged as network byte order.
    pub fn is_net_byte_order(&self) -> bool {
        self.net_byte_order
    }

    /// The payload value.
    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    /// Scalar payload; empty for nested attributes.
    pub fn data(&self) -> &[u8] {
        match &self.value {
            AttrValue::Data(data) => data,
            AttrValue::Nested(_) => &[],
        }
    }

    /// Child attributes; empty for scalar attributes.
    pub fn children(&self) -> &[Attribute] {
        match &self.value {
            AttrValue::Nested(children) => children,
            AttrValue::Data(_) => &[],
        }
    }

    /// Child attributes, failing if this attribute is not nested.
    pub fn nested_children(&self, what: &str) -> Result<&[Attribute]> {
        match &self.value {
            AttrValue::Nested(children) => Ok(children),
            AttrValue::Data(_) => Err(Error::InvalidAttribute(format!(
                "{} attribute (type {}) is not nested",
                what, self.kind
            ))),
        }
    }

    /// Type field as written on the wire, flags included.
    pub fn wire_type(&self) -> u16 {
        let mut ty = self.kind;
        if self.is_nested() {
            ty |= NLA_F_NESTED;
        }
        if self.net_byte_order {
            ty |= NLA_F_NET_BYTEORDER;
        }
        ty
    }

    /// Append this attribute, recursively, to a message.
    ///
    /// Fails if this attribute or any nest below it is larger than
    /// [`NLA_MAX_LEN`]. The builder is left partially written in that case.
    pub fn write_to(&self, builder: &mut MessageBuilder) -> Result<()> {
        match &self.value {
            AttrValue::Data(data) => builder.append_attr(self.wire_type(), data),
            AttrValue::Nested(children) => {
                let nest = builder.nest_start(self.kind);
                for child in children {
                    child.write_to(builder)?;
                }
                builder.nest_end(nest)
            }
        }
    }

    /// Parse every attribute in `data`.
    ///
    /// Attributes flagged `NLA_F_NESTED` are parsed recursively. A header
    /// whose length is shorter than the header itself or runs past the end
    /// of the buffer is an error; trailing bytes too short to hold a header
    /// are ignored.
    pub fn parse_all(mut data: &[u8]) -> Result<Vec<Attribute>> {
        let mut attrs = Vec::new();

        while data.len() >= NLA_HDRLEN {
            let header = NlAttr::from_bytes(data)?;
            let len = header.nla_len as usize;
            if len < NLA_HDRLEN || len > data.len() {
                return Err(Error::InvalidAttribute(format!(
                    "attribute type {} has length {} with {} bytes remaining",
                    header.kind(),
                    len,
                    data.len()
                )));
            }

            let payload = &data[NLA_HDRLEN..len];
            let value = if header.is_nested() {
                AttrValue::Nested(Self::parse_all(payload)?)
            } else {
                AttrValue::Data(payload.to_vec())
            };
            attrs.push(Attribute {
                kind: header.kind(),
                net_byte_order: header.is_net_byte_order(),
                value,
            });

            data = &data[nla_align(len).min(data.len())..];
        }

        Ok(attrs)
    }
}
