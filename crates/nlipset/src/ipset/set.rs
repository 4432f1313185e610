//! Set creation data and list responses.

use std::time::Duration;

use serde::Serialize;

use super::attributes::{Attributes, MarshalAttributes, UnmarshalAttribute, unmarshal_attributes};
use super::boxes::{BeU32Box, DurationBox, Marshal, U8Box, Unmarshal};
use super::entry::Entries;
use super::policy::HeaderPolicy;
use super::types::{CadtAttr, IpsetAttr};
use crate::netlink::{Attribute, Result};

/// Per-set settings, nested under DATA.
///
/// `elements`, `references` and `memsize` are reported by the kernel in list
/// and header replies and are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadt_flags: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_size: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_mask: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_elem: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proto: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<DurationBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memsize: Option<BeU32Box>,
}

impl CreateData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set flags such as [`WITH_COUNTERS`](super::types::cadt_flags::WITH_COUNTERS).
    pub fn cadt_flags(mut self, flags: u32) -> Self {
        self.cadt_flags = Some(BeU32Box(flags));
        self
    }

    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = Some(BeU32Box(size));
        self
    }

    pub fn mark_mask(mut self, mask: u32) -> Self {
        self.mark_mask = Some(BeU32Box(mask));
        self
    }

    pub fn max_elem(mut self, max: u32) -> Self {
        self.max_elem = Some(BeU32Box(max));
        self
    }

    pub fn netmask(mut self, prefix: u8) -> Self {
        self.netmask = Some(U8Box(prefix));
        self
    }

    pub fn probes(mut self, probes: u8) -> Self {
        self.probes = Some(U8Box(probes));
        self
    }

    pub fn proto(mut self, proto: u8) -> Self {
        self.proto = Some(U8Box(proto));
        self
    }

    pub fn resize(mut self, percent: u8) -> Self {
        self.resize = Some(U8Box(percent));
        self
    }

    /// Maximum size of a `list:set` set.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(BeU32Box(size));
        self
    }

    /// Default element timeout; enables timeout support on the set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(DurationBox::new(timeout));
        self
    }
}

impl Marshal for CreateData {
    fn marshal(&self, kind: u16) -> Attribute {
        let mut attrs = Attributes::new();
        attrs.append(CadtAttr::CADT_FLAGS, self.cadt_flags.as_ref());
        attrs.append(CadtAttr::HASHSIZE, self.hash_size.as_ref());
        attrs.append(CadtAttr::MARKMASK, self.mark_mask.as_ref());
        attrs.append(CadtAttr::MAXELEM, self.max_elem.as_ref());
        attrs.append(CadtAttr::NETMASK, self.netmask.as_ref());
        attrs.append(CadtAttr::PROBES, self.probes.as_ref());
        attrs.append(CadtAttr::PROTO, self.proto.as_ref());
        attrs.append(CadtAttr::RESIZE, self.resize.as_ref());
        attrs.append(CadtAttr::SIZE, self.size.as_ref());
        attrs.append(CadtAttr::TIMEOUT, self.timeout.as_ref());
        Attribute::nested(kind, attrs.into_vec())
    }
}

impl UnmarshalAttribute for CreateData {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            CadtAttr::CADT_FLAGS => self.cadt_flags = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::HASHSIZE => self.hash_size = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::MARKMASK => self.mark_mask = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::MAXELEM => self.max_elem = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::NETMASK => self.netmask = Some(U8Box::unmarshal(attr)?),
            CadtAttr::PROBES => self.probes = Some(U8Box::unmarshal(attr)?),
            CadtAttr::PROTO => self.proto = Some(U8Box::unmarshal(attr)?),
            CadtAttr::RESIZE => self.resize = Some(U8Box::unmarshal(attr)?),
            CadtAttr::SIZE => self.size = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::TIMEOUT => self.timeout = Some(DurationBox::unmarshal(attr)?),
            CadtAttr::ELEMENTS => self.elements = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::REFERENCES => self.references = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::MEMSIZE => self.memsize = Some(BeU32Box::unmarshal(attr)?),
            kind => tracing::trace!(kind, "ignoring unknown set data attribute"),
        }
        Ok(())
    }
}

impl Unmarshal for CreateData {
    fn unmarshal(attr: &Attribute) -> Result<Self> {
        let mut data = CreateData::new();
        unmarshal_attributes(attr.nested_children("set data")?, &mut data)?;
        Ok(data)
    }
}

/// Create and replace requests: the header plus the set data block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePolicy {
    pub base: HeaderPolicy,
    pub data: Option<CreateData>,
}

impl CreatePolicy {
    pub fn new(base: HeaderPolicy, data: CreateData) -> Self {
        Self {
            base,
            data: Some(data),
        }
    }
}

impl MarshalAttributes for CreatePolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::DATA, self.data.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for CreatePolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::DATA => self.data = Some(CreateData::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}

/// One message of a list dump: header, set data and (part of) the members.
///
/// Large sets are split over several messages; each carries the same header
/// and its own slice of the elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetPolicy {
    #[serde(flatten)]
    pub base: HeaderPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CreateData>,
    #[serde(skip_serializing_if = "Entries::is_empty")]
    pub entries: Entries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_no: Option<BeU32Box>,
}

impl SetPolicy {
    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn type_name(&self) -> &str {
        self.base.type_name()
    }
}

impl MarshalAttributes for SetPolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::DATA, self.data.as_ref());
        attrs.append(IpsetAttr::ADT, self.entries.present());
        attrs.append(IpsetAttr::LINENO, self.line_no.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for SetPolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::DATA => self.data = Some(CreateData::unmarshal(attr)?),
            IpsetAttr::ADT => self.entries = Entries::unmarshal(attr)?,
            IpsetAttr::LINENO => self.line_no = Some(BeU32Box::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}
