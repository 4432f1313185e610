//! Command policies: the attribute shapes of requests and responses.
//!
//! Policies compose by embedding. Each one keeps the smaller policy it
//! extends in a `base` field; marshaling emits the base fields first and the
//! local fields after, and unmarshaling tries the local tags first and hands
//! everything else down to the base.

use serde::Serialize;

use super::attributes::{Attributes, MarshalAttributes, UnmarshalAttribute};
use super::boxes::{BeU32Box, StrBox, U8Box, Unmarshal};
use super::types::{IpsetAttr, PROTOCOL};
use crate::netlink::netfilter::ProtoFamily;
use crate::netlink::{Attribute, Result};

/// Fields shared by every command: the protocol version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BasePolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<U8Box>,
}

impl BasePolicy {
    /// Base policy announcing this client's protocol version.
    pub fn new() -> Self {
        Self {
            protocol: Some(U8Box(PROTOCOL)),
        }
    }
}

impl MarshalAttributes for BasePolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.append(IpsetAttr::PROTOCOL, self.protocol.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for BasePolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::PROTOCOL => self.protocol = Some(U8Box::unmarshal(attr)?),
            kind => tracing::trace!(kind, "ignoring unknown attribute"),
        }
        Ok(())
    }
}

/// Base policy plus a set name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamePolicy {
    #[serde(flatten)]
    pub base: BasePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<StrBox>,
}

impl NamePolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: BasePolicy::new(),
            name: Some(StrBox::new(name)),
        }
    }

    /// Set name, empty when absent.
    pub fn name(&self) -> &str {
        self.name.as_ref().map_or("", StrBox::as_str)
    }
}

impl MarshalAttributes for NamePolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::SETNAME, self.name.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for NamePolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::SETNAME => self.name = Some(StrBox::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}

/// Set header: name, type, revision and family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderPolicy {
    #[serde(flatten)]
    pub base: NamePolicy,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<StrBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<U8Box>,
}

impl HeaderPolicy {
    pub fn new(
        base: NamePolicy,
        type_name: impl Into<String>,
        revision: u8,
        family: ProtoFamily,
    ) -> Self {
        Self {
            base,
            type_name: Some(StrBox::new(type_name)),
            revision: Some(U8Box(revision)),
            family: Some(U8Box(family.number())),
        }
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// Set type name (e.g. `hash:ip`), empty when absent.
    pub fn type_name(&self) -> &str {
        self.type_name.as_ref().map_or("", StrBox::as_str)
    }

    pub fn revision(&self) -> u8 {
        self.revision.map_or(0, |r| r.0)
    }

    pub fn family(&self) -> ProtoFamily {
        ProtoFamily::from_u8(self.family.map_or(0, |f| f.0))
    }
}

impl MarshalAttributes for HeaderPolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::TYPENAME, self.type_name.as_ref());
        attrs.append(IpsetAttr::REVISION, self.revision.as_ref());
        attrs.append(IpsetAttr::FAMILY, self.family.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for HeaderPolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::TYPENAME => self.type_name = Some(StrBox::unmarshal(attr)?),
            IpsetAttr::REVISION => self.revision = Some(U8Box::unmarshal(attr)?),
            IpsetAttr::FAMILY => self.family = Some(U8Box::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}

/// Rename and swap: source name plus destination name.
///
/// The destination travels in the type name slot (`IPSET_ATTR_SETNAME2`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovePolicy {
    pub base: NamePolicy,
    pub to: Option<StrBox>,
}

impl MovePolicy {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            base: NamePolicy::new(from),
            to: Some(StrBox::new(to)),
        }
    }

    pub fn from_name(&self) -> &str {
        self.base.name()
    }

    pub fn to_name(&self) -> &str {
        self.to.as_ref().map_or("", StrBox::as_str)
    }
}

impl MarshalAttributes for MovePolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::SETNAME2, self.to.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for MovePolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::SETNAME2 => self.to = Some(StrBox::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}

/// List request restricted by command flags (see [`cmd_flags`](super::types::cmd_flags)).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpPolicy {
    pub base: NamePolicy,
    pub flags: Option<BeU32Box>,
}

impl DumpPolicy {
    pub fn new(base: NamePolicy, flags: u32) -> Self {
        Self {
            base,
            flags: Some(BeU32Box(flags)),
        }
    }
}

impl MarshalAttributes for DumpPolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::FLAGS, self.flags.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for DumpPolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::FLAGS => self.flags = Some(BeU32Box::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}

/// Set type query: type name and family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypePolicy {
    #[serde(flatten)]
    pub base: BasePolicy,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<StrBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<U8Box>,
}

impl TypePolicy {
    pub fn new(type_name: impl Into<String>, family: ProtoFamily) -> Self {
        Self {
            base: BasePolicy::new(),
            type_name: Some(StrBox::new(type_name)),
            family: Some(U8Box(family.number())),
        }
    }
}

impl MarshalAttributes for TypePolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::TYPENAME, self.type_name.as_ref());
        attrs.append(IpsetAttr::FAMILY, self.family.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for TypePolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::TYPENAME => self.type_name = Some(StrBox::unmarshal(attr)?),
            IpsetAttr::FAMILY => self.family = Some(U8Box::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}

/// Reply to a type query: the type plus its supported revision range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeResponsePolicy {
    #[serde(flatten)]
    pub base: TypePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_min: Option<U8Box>,
}

impl MarshalAttributes for TypeResponsePolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::REVISION, self.revision.as_ref());
        attrs.append(IpsetAttr::REVISION_MIN, self.revision_min.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for TypeResponsePolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::REVISION => self.revision = Some(U8Box::unmarshal(attr)?),
            IpsetAttr::REVISION_MIN => self.revision_min = Some(U8Box::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}

/// Reply to a protocol query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolResponsePolicy {
    #[serde(flatten)]
    pub base: BasePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_min: Option<U8Box>,
}

impl MarshalAttributes for ProtocolResponsePolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::PROTOCOL_MIN, self.protocol_min.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for ProtocolResponsePolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::PROTOCOL_MIN => self.protocol_min = Some(U8Box::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}
