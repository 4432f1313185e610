//! Set elements and the add/del/test request shapes that carry them.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use serde::Serialize;

use super::attributes::{Attributes, MarshalAttributes, UnmarshalAttribute, unmarshal_attributes};
use super::boxes::{
    BeU16Box, BeU32Box, BeU64Box, DurationBox, IpBox, MacBox, Marshal, StrBox, U8Box, Unmarshal,
};
use super::policy::NamePolicy;
use super::types::{AdtAttr, CadtAttr, IpsetAttr};
use crate::netlink::{Attribute, Result};

/// One set element.
///
/// Build it with the setters before add, delete or test; list responses
/// produce it with only the fields the kernel reported.
///
/// ```ignore
/// let entry = Entry::new()
///     .ip("10.0.0.0".parse::<IpAddr>()?)
///     .cidr(24)
///     .timeout(Duration::from_secs(600))
///     .comment("office");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Entry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_to: Option<IpBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<BeU16Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_to: Option<BeU16Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<DurationBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proto: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadt_flags: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_no: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_mask: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ether: Option<MacBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<StrBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_ref: Option<StrBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip2: Option<IpBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr2: Option<U8Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip2_to: Option<IpBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iface: Option<StrBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<BeU64Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packets: Option<BeU64Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<StrBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skbmark: Option<BeU64Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skbprio: Option<BeU32Box>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skbqueue: Option<BeU16Box>,
}

impl Entry {
    /// Create an entry with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ip(mut self, addr: impl Into<IpAddr>) -> Self {
        self.ip = Some(IpBox::new(addr));
        self
    }

    /// Upper bound of an address range starting at [`ip`](Self::ip).
    pub fn ip_to(mut self, addr: impl Into<IpAddr>) -> Self {
        self.ip_to = Some(IpBox::new(addr));
        self
    }

    pub fn cidr(mut self, cidr: u8) -> Self {
        self.cidr = Some(U8Box(cidr));
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(BeU16Box(port));
        self
    }

    pub fn port_to(mut self, port: u16) -> Self {
        self.port_to = Some(BeU16Box(port));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(DurationBox::new(timeout));
        self
    }

    /// IP protocol number (e.g. 6 for TCP).
    pub fn proto(mut self, proto: u8) -> Self {
        self.proto = Some(U8Box(proto));
        self
    }

    /// Element flags, see [`cadt_flags`](super::types::cadt_flags).
    pub fn cadt_flags(mut self, flags: u32) -> Self {
        self.cadt_flags = Some(BeU32Box(flags));
        self
    }

    pub fn line_no(mut self, line_no: u32) -> Self {
        self.line_no = Some(BeU32Box(line_no));
        self
    }

    pub fn mark(mut self, mark: u32) -> Self {
        self.mark = Some(BeU32Box(mark));
        self
    }

    pub fn mark_mask(mut self, mask: u32) -> Self {
        self.mark_mask = Some(BeU32Box(mask));
        self
    }

    pub fn ether(mut self, addr: impl Into<Vec<u8>>) -> Self {
        self.ether = Some(MacBox::new(addr));
        self
    }

    /// Member set name, for `list:set` sets.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(StrBox::new(name));
        self
    }

    /// Reference set name for `before`/`after` placement in `list:set` sets.
    pub fn name_ref(mut self, name: impl Into<String>) -> Self {
        self.name_ref = Some(StrBox::new(name));
        self
    }

    pub fn ip2(mut self, addr: impl Into<IpAddr>) -> Self {
        self.ip2 = Some(IpBox::new(addr));
        self
    }

    pub fn cidr2(mut self, cidr: u8) -> Self {
        self.cidr2 = Some(U8Box(cidr));
        self
    }

    pub fn ip2_to(mut self, addr: impl Into<IpAddr>) -> Self {
        self.ip2_to = Some(IpBox::new(addr));
        self
    }

    pub fn iface(mut self, iface: impl Into<String>) -> Self {
        self.iface = Some(StrBox::new(iface));
        self
    }

    pub fn bytes(mut self, bytes: u64) -> Self {
        self.bytes = Some(BeU64Box(bytes));
        self
    }

    pub fn packets(mut self, packets: u64) -> Self {
        self.packets = Some(BeU64Box(packets));
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(StrBox::new(comment));
        self
    }

    pub fn skbmark(mut self, mark: u64) -> Self {
        self.skbmark = Some(BeU64Box(mark));
        self
    }

    pub fn skbprio(mut self, prio: u32) -> Self {
        self.skbprio = Some(BeU32Box(prio));
        self
    }

    pub fn skbqueue(mut self, queue: u16) -> Self {
        self.skbqueue = Some(BeU16Box(queue));
        self
    }

    /// The element's fields, in tag order.
    pub fn marshal_fields(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.append(CadtAttr::IP, self.ip.as_ref());
        attrs.append(CadtAttr::IP_TO, self.ip_to.as_ref());
        attrs.append(CadtAttr::CIDR, self.cidr.as_ref());
        attrs.append(CadtAttr::PORT, self.port.as_ref());
        attrs.append(CadtAttr::PORT_TO, self.port_to.as_ref());
        attrs.append(CadtAttr::TIMEOUT, self.timeout.as_ref());
        attrs.append(CadtAttr::PROTO, self.proto.as_ref());
        attrs.append(CadtAttr::CADT_FLAGS, self.cadt_flags.as_ref());
        attrs.append(CadtAttr::LINENO, self.line_no.as_ref());
        attrs.append(CadtAttr::MARK, self.mark.as_ref());
        attrs.append(CadtAttr::MARKMASK, self.mark_mask.as_ref());
        attrs.append(AdtAttr::ETHER, self.ether.as_ref());
        attrs.append(AdtAttr::NAME, self.name.as_ref());
        attrs.append(AdtAttr::NAMEREF, self.name_ref.as_ref());
        attrs.append(AdtAttr::IP2, self.ip2.as_ref());
        attrs.append(AdtAttr::CIDR2, self.cidr2.as_ref());
        attrs.append(AdtAttr::IP2_TO, self.ip2_to.as_ref());
        attrs.append(AdtAttr::IFACE, self.iface.as_ref());
        attrs.append(AdtAttr::BYTES, self.bytes.as_ref());
        attrs.append(AdtAttr::PACKETS, self.packets.as_ref());
        attrs.append(AdtAttr::COMMENT, self.comment.as_ref());
        attrs.append(AdtAttr::SKBMARK, self.skbmark.as_ref());
        attrs.append(AdtAttr::SKBPRIO, self.skbprio.as_ref());
        attrs.append(AdtAttr::SKBQUEUE, self.skbqueue.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for Entry {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            CadtAttr::IP => self.ip = Some(IpBox::unmarshal(attr)?),
            CadtAttr::IP_TO => self.ip_to = Some(IpBox::unmarshal(attr)?),
            CadtAttr::CIDR => self.cidr = Some(U8Box::unmarshal(attr)?),
            CadtAttr::PORT => self.port = Some(BeU16Box::unmarshal(attr)?),
            CadtAttr::PORT_TO => self.port_to = Some(BeU16Box::unmarshal(attr)?),
            CadtAttr::TIMEOUT => self.timeout = Some(DurationBox::unmarshal(attr)?),
            CadtAttr::PROTO => self.proto = Some(U8Box::unmarshal(attr)?),
            CadtAttr::CADT_FLAGS => self.cadt_flags = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::LINENO => self.line_no = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::MARK => self.mark = Some(BeU32Box::unmarshal(attr)?),
            CadtAttr::MARKMASK => self.mark_mask = Some(BeU32Box::unmarshal(attr)?),
            AdtAttr::ETHER => self.ether = Some(MacBox::unmarshal(attr)?),
            AdtAttr::NAME => self.name = Some(StrBox::unmarshal(attr)?),
            AdtAttr::NAMEREF => self.name_ref = Some(StrBox::unmarshal(attr)?),
            AdtAttr::IP2 => self.ip2 = Some(IpBox::unmarshal(attr)?),
            AdtAttr::CIDR2 => self.cidr2 = Some(U8Box::unmarshal(attr)?),
            AdtAttr::IP2_TO => self.ip2_to = Some(IpBox::unmarshal(attr)?),
            AdtAttr::IFACE => self.iface = Some(StrBox::unmarshal(attr)?),
            AdtAttr::BYTES => self.bytes = Some(BeU64Box::unmarshal(attr)?),
            AdtAttr::PACKETS => self.packets = Some(BeU64Box::unmarshal(attr)?),
            AdtAttr::COMMENT => self.comment = Some(StrBox::unmarshal(attr)?),
            AdtAttr::SKBMARK => self.skbmark = Some(BeU64Box::unmarshal(attr)?),
            AdtAttr::SKBPRIO => self.skbprio = Some(BeU32Box::unmarshal(attr)?),
            AdtAttr::SKBQUEUE => self.skbqueue = Some(BeU16Box::unmarshal(attr)?),
            kind => tracing::trace!(kind, "ignoring unknown element attribute"),
        }
        Ok(())
    }
}

impl Marshal for Entry {
    fn marshal(&self, kind: u16) -> Attribute {
        Attribute::nested(kind, self.marshal_fields().into_vec())
    }
}

impl Unmarshal for Entry {
    fn unmarshal(attr: &Attribute) -> Result<Self> {
        let mut entry = Entry::new();
        unmarshal_attributes(attr.nested_children("element data")?, &mut entry)?;
        Ok(entry)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Ordered element list.
///
/// On the wire this is one nested ADT attribute holding a nested DATA
/// attribute per element. Decoding keeps the kernel's order, which is
/// bucket order for hash sets rather than insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Entries(Vec<Entry>);

impl Entries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Entry] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Entry> {
        self.0
    }

    /// Number the elements 0, 1, 2, ... by position.
    ///
    /// The kernel echoes the number of the element that failed, which ties
    /// an error back to one element of a batch.
    pub fn numbered(mut self) -> Self {
        for (i, entry) in self.0.iter_mut().enumerate() {
            entry.line_no = Some(BeU32Box(i as u32));
        }
        self
    }

    /// `None` when there are no elements, so an empty list is never sent.
    pub fn present(&self) -> Option<&Self> {
        (!self.is_empty()).then_some(self)
    }
}

impl Marshal for Entries {
    fn marshal(&self, kind: u16) -> Attribute {
        let children = self
            .0
            .iter()
            .map(|entry| entry.marshal(IpsetAttr::DATA))
            .collect();
        Attribute::nested(kind, children)
    }
}

impl Unmarshal for Entries {
    fn unmarshal(attr: &Attribute) -> Result<Self> {
        attr.nested_children("element list")?
            .iter()
            .map(Entry::unmarshal)
            .collect()
    }
}

impl From<Vec<Entry>> for Entries {
    fn from(entries: Vec<Entry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<Entry> for Entries {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Entries {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Entries {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Add and delete requests: set name, line number and the elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryAddDelPolicy {
    pub base: NamePolicy,
    pub line_no: Option<BeU32Box>,
    pub entries: Entries,
}

impl EntryAddDelPolicy {
    /// Build the request, numbering the elements by position.
    pub fn new(base: NamePolicy, line_no: u32, entries: Entries) -> Self {
        Self {
            base,
            line_no: Some(BeU32Box(line_no)),
            entries: entries.numbered(),
        }
    }
}

impl MarshalAttributes for EntryAddDelPolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::ADT, self.entries.present());
        attrs.append(IpsetAttr::LINENO, self.line_no.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for EntryAddDelPolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::LINENO => self.line_no = Some(BeU32Box::unmarshal(attr)?),
            IpsetAttr::ADT => self.entries = Entries::unmarshal(attr)?,
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}

/// Test request: set name and one element under DATA.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestPolicy {
    pub base: NamePolicy,
    pub entry: Option<Entry>,
}

impl TestPolicy {
    pub fn new(base: NamePolicy, entry: Entry) -> Self {
        Self {
            base,
            entry: Some(entry),
        }
    }
}

impl MarshalAttributes for TestPolicy {
    fn marshal_attributes(&self) -> Attributes {
        let mut attrs = self.base.marshal_attributes();
        attrs.append(IpsetAttr::DATA, self.entry.as_ref());
        attrs
    }
}

impl UnmarshalAttribute for TestPolicy {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()> {
        match attr.kind() {
            IpsetAttr::DATA => self.entry = Some(Entry::unmarshal(attr)?),
            _ => return self.base.unmarshal_attribute(attr),
        }
        Ok(())
    }
}
