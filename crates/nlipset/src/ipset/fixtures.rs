//! Kernel replies captured from a 6.x kernel, used by the decoder tests.

/// IPSET_CMD_PROTOCOL reply: protocol 7, minimum protocol 6.
pub(crate) const PROTOCOL_REPLY: &[u8] = &[
    // nlmsghdr: len 36, type (6 << 8) | 1, flags 0, seq 1, pid 0
    0x24, 0x00, 0x00, 0x00, 0x01, 0x06, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // nfgenmsg: unspec, v0, res_id 0
    0x00, 0x00, 0x00, 0x00,
    // PROTOCOL = 7
    0x05, 0x00, 0x01, 0x00, 0x07, 0x00, 0x00, 0x00,
    // PROTOCOL_MIN = 6
    0x05, 0x00, 0x0a, 0x00, 0x06, 0x00, 0x00, 0x00,
];

/// IPSET_CMD_HEADER reply for a `hash:mac` set named "foo".
pub(crate) const HEADER_REPLY: &[u8] = &[
    // nlmsghdr: len 68, type (6 << 8) | 12, flags 0, seq 2, pid 0
    0x44, 0x00, 0x00, 0x00, 0x0c, 0x06, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    // PROTOCOL = 7
    0x05, 0x00, 0x01, 0x00, 0x07, 0x00, 0x00, 0x00,
    // SETNAME = "foo"
    0x08, 0x00, 0x02, 0x00, b'f', b'o', b'o', 0x00,
    // TYPENAME = "hash:mac"
    0x0d, 0x00, 0x03, 0x00, b'h', b'a', b's', b'h', b':', b'm', b'a', b'c', 0x00, 0x00, 0x00, 0x00,
    // REVISION = 0
    0x05, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00,
    // FAMILY = unspec
    0x05, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// One IPSET_CMD_LIST dump message for "foo" holding a single element.
pub(crate) const LIST_REPLY: &[u8] = &[
    // nlmsghdr: len 132, type (6 << 8) | 7, flags NLM_F_MULTI, seq 3, pid 0
    0x84, 0x00, 0x00, 0x00, 0x07, 0x06, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x00, 0x07, 0x00, 0x00, 0x00,
    0x08, 0x00, 0x02, 0x00, b'f', b'o', b'o', 0x00,
    0x0d, 0x00, 0x03, 0x00, b'h', b'a', b's', b'h', b':', b'm', b'a', b'c', 0x00, 0x00, 0x00, 0x00,
    0x05, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x05, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00,
    // DATA (nested)
    0x2c, 0x00, 0x07, 0x80,
    //   HASHSIZE = 1024 (net)
    0x08, 0x00, 0x12, 0x40, 0x00, 0x00, 0x04, 0x00,
    //   MAXELEM = 65536 (net)
    0x08, 0x00, 0x13, 0x40, 0x00, 0x01, 0x00, 0x00,
    //   ELEMENTS = 1 (net)
    0x08, 0x00, 0x18, 0x40, 0x00, 0x00, 0x00, 0x01,
    //   REFERENCES = 0 (net)
    0x08, 0x00, 0x19, 0x40, 0x00, 0x00, 0x00, 0x00,
    //   MEMSIZE = 200 (net)
    0x08, 0x00, 0x1a, 0x40, 0x00, 0x00, 0x00, 0xc8,
    // ADT (nested)
    0x14, 0x00, 0x08, 0x80,
    //   DATA (nested)
    0x10, 0x00, 0x07, 0x80,
    //     ETHER = de:ad:be:ef:00:01
    0x0a, 0x00, 0x11, 0x00, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x00, 0x00,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipset::attributes::unmarshal_message;
    use crate::ipset::boxes::{BeU32Box, BoxGet};
    use crate::ipset::policy::{HeaderPolicy, ProtocolResponsePolicy};
    use crate::ipset::set::SetPolicy;
    use crate::netlink::netfilter::{self, ProtoFamily};

    #[test]
    fn protocol_reply() {
        let mut reply = ProtocolResponsePolicy::default();
        unmarshal_message(PROTOCOL_REPLY, &mut reply).unwrap();
        assert_eq!(reply.base.protocol.get(), 7);
        assert_eq!(reply.protocol_min.get(), 6);
    }

    #[test]
    fn header_reply() {
        let (header, _) = netfilter::unwrap(HEADER_REPLY).unwrap();
        assert_eq!(header.message_type, 12);

        let mut reply = HeaderPolicy::default();
        unmarshal_message(HEADER_REPLY, &mut reply).unwrap();
        assert_eq!(reply.name(), "foo");
        assert_eq!(reply.type_name(), "hash:mac");
        assert_eq!(reply.revision(), 0);
        assert_eq!(reply.family(), ProtoFamily::Unspec);
    }

    #[test]
    fn list_reply() {
        let mut set = SetPolicy::default();
        unmarshal_message(LIST_REPLY, &mut set).unwrap();
        assert_eq!(set.name(), "foo");

        let data = set.data.as_ref().unwrap();
        assert_eq!(data.hash_size.get(), 1024);
        assert_eq!(data.max_elem.get(), 65536);
        assert_eq!(data.elements.get(), 1);
        assert_eq!(data.references, Some(BeU32Box(0)));
        assert_eq!(data.memsize.get(), 200);

        assert_eq!(set.entries.len(), 1);
        let entry = &set.entries.as_slice()[0];
        assert_eq!(entry.ether.get(), vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        assert_eq!(entry.to_string(), r#"{"ether":"de:ad:be:ef:00:01"}"#);
    }

    #[test]
    fn truncated_reply_is_rejected() {
        let mut reply = HeaderPolicy::default();
        assert!(unmarshal_message(&HEADER_REPLY[..40], &mut reply).is_err());
    }
}
