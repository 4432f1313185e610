//! Attribute lists and the policy (un)marshaling traits.

use super::boxes::Marshal;
use crate::netlink::netfilter;
use crate::netlink::{Attribute, Result};

/// Ordered list of wire attributes under construction.
///
/// Fields are appended conditionally: an absent field adds nothing, so the
/// order of `append` calls is the wire order of the fields that are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `field` under `kind` if it is present.
    pub fn append<M: Marshal>(&mut self, kind: u16, field: Option<&M>) {
        if let Some(field) = field {
            self.0.push(field.marshal(kind));
        }
    }

    /// Append an already built attribute.
    pub fn push(&mut self, attr: Attribute) {
        self.0.push(attr);
    }

    /// Tags in wire order.
    pub fn kinds(&self) -> Vec<u16> {
        self.0.iter().map(Attribute::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Attribute] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Attribute> {
        self.0
    }
}

impl IntoIterator for Attributes {
    type Item = Attribute;
    type IntoIter = std::vec::IntoIter<Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A request shape: produces the attribute list of one command.
pub trait MarshalAttributes {
    fn marshal_attributes(&self) -> Attributes;
}

/// A response shape: consumes the attributes of one message, one at a time.
///
/// Implementations handle the tags they own and hand every other tag to the
/// policy they embed. Tags nobody owns are ignored.
pub trait UnmarshalAttribute {
    fn unmarshal_attribute(&mut self, attr: &Attribute) -> Result<()>;
}

/// Feed every attribute of `attrs` to `policy`, in wire order.
pub fn unmarshal_attributes<U: UnmarshalAttribute + ?Sized>(
    attrs: &[Attribute],
    policy: &mut U,
) -> Result<()> {
    for attr in attrs {
        policy.unmarshal_attribute(attr)?;
    }
    Ok(())
}

/// Decode one complete netlink message into `policy`.
pub fn unmarshal_message<U: UnmarshalAttribute + ?Sized>(message: &[u8], policy: &mut U) -> Result<()> {
    let (_, attrs) = netfilter::unwrap(message)?;
    unmarshal_attributes(&attrs, policy)
}
