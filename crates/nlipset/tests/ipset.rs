//! End-to-end dispatcher tests against the in-memory kernel.

mod common;

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use common::{DUMP_CHUNK, FakeKernel};
use nlipset::ipset::errno::{IPSET_ERR_EXIST, IPSET_ERR_EXIST_SETNAME2, IPSET_ERR_FIND_TYPE};
use nlipset::ipset::types::{CadtAttr, IpsetAttr};
use nlipset::ipset::{BoxGet, Command, CreateData, Entry, IpsetConnection, cadt_flags};
use nlipset::netlink::ProtoFamily;
use nlipset::netlink::message::{NLM_F_ACK, NLM_F_CREATE, NLM_F_DUMP, NLM_F_EXCL, NLM_F_REQUEST};

const MAC_A: [u8; 6] = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
const MAC_B: [u8; 6] = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x02];

fn connect() -> IpsetConnection<FakeKernel> {
    IpsetConnection::with_transport(FakeKernel::new(), ProtoFamily::Unspec)
}

async fn create_foo(conn: &IpsetConnection<FakeKernel>) {
    conn.create("foo", "hash:mac", 0, ProtoFamily::Unspec, CreateData::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn create_sends_header_and_empty_data() {
    let conn = connect();
    create_foo(&conn).await;

    let (header, attrs) = conn.transport().last_request();
    assert_eq!(header.message_type, u8::from(Command::Create));
    assert_eq!(header.family, ProtoFamily::Unspec);
    assert_eq!(
        header.flags,
        NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_EXCL
    );

    let kinds: Vec<u16> = attrs.iter().map(|a| a.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            IpsetAttr::PROTOCOL,
            IpsetAttr::SETNAME,
            IpsetAttr::TYPENAME,
            IpsetAttr::REVISION,
            IpsetAttr::FAMILY,
            IpsetAttr::DATA
        ]
    );
    assert_eq!(attrs[1].data(), b"foo\0");
    assert_eq!(attrs[2].data(), b"hash:mac\0");
    assert_eq!(attrs[3].data(), &[0]);
    assert_eq!(attrs[4].data(), &[0]);
    assert!(attrs[5].is_nested());
    assert!(attrs[5].children().is_empty());

    let set = conn.transport().set("foo").unwrap();
    assert_eq!(set.type_name, "hash:mac");
}

#[tokio::test]
async fn create_twice_fails() {
    let conn = connect();
    create_foo(&conn).await;

    let err = conn
        .create("foo", "hash:mac", 0, ProtoFamily::Unspec, CreateData::new())
        .await
        .unwrap_err();
    assert!(err.is_already_exists());
    assert!(err.to_string().contains("create set foo"));

    // replace accepts an identical set
    conn.replace("foo", "hash:mac", 0, ProtoFamily::Unspec, CreateData::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_type_fails() {
    let conn = connect();
    let err = conn
        .create("foo", "hash:nope", 0, ProtoFamily::Ipv4, CreateData::new())
        .await
        .unwrap_err();
    assert_eq!(err.errno(), Some(IPSET_ERR_FIND_TYPE));
    assert!(err.to_string().contains("Kernel error received: set type not supported"));
}

#[tokio::test]
async fn create_data_reaches_kernel() {
    let conn = connect();
    let data = CreateData::new()
        .hash_size(1024)
        .max_elem(65536)
        .timeout(Duration::from_secs(600))
        .cadt_flags(cadt_flags::WITH_COMMENT);
    conn.create("timed", "hash:ip", 4, ProtoFamily::Ipv4, data)
        .await
        .unwrap();

    let set = conn.transport().set("timed").unwrap();
    assert_eq!(set.family, 2);
    assert_eq!(set.revision, 4);
    assert_eq!(set.data.timeout.get(), Duration::from_secs(600));
    assert_eq!(set.data.cadt_flags.get(), cadt_flags::WITH_COMMENT);

    let listed = conn.list_header("timed").await.unwrap().unwrap();
    let data = listed.data.unwrap();
    assert_eq!(data.hash_size.get(), 1024);
    assert_eq!(data.max_elem.get(), 65536);
    assert_eq!(data.elements.get(), 0);
    assert!(data.references.is_some());
}

#[tokio::test]
async fn add_then_list() {
    let conn = connect();
    create_foo(&conn).await;

    conn.add(
        "foo",
        [Entry::new().ether(MAC_A), Entry::new().ether(MAC_B)],
    )
    .await
    .unwrap();

    // line numbers on the wire, by position
    let (_, attrs) = conn.transport().last_request();
    let adt = attrs.iter().find(|a| a.kind() == IpsetAttr::ADT).unwrap();
    for (i, data) in adt.children().iter().enumerate() {
        let line = data
            .children()
            .iter()
            .find(|a| a.kind() == CadtAttr::LINENO)
            .unwrap();
        assert_eq!(line.data(), (i as u32).to_be_bytes());
    }

    let sets = conn.list("foo").await.unwrap();
    assert_eq!(sets.len(), 1);
    let set = &sets[0];
    assert_eq!(set.name(), "foo");
    assert_eq!(set.type_name(), "hash:mac");

    let macs: Vec<Vec<u8>> = set.entries.iter().map(|e| e.ether.get()).collect();
    assert_eq!(macs, vec![MAC_A.to_vec(), MAC_B.to_vec()]);
    for entry in &set.entries {
        assert!(entry.comment.is_none());
        assert!(entry.timeout.is_none());
        assert_eq!(entry.timeout.get(), Duration::ZERO);
        assert!(entry.line_no.is_none());
    }
    assert_eq!(set.data.as_ref().map(|d| d.elements.get()), Some(2));

    let (list, _) = conn.transport().last_request();
    assert_eq!(list.message_type, u8::from(Command::List));
    assert_eq!(list.flags, NLM_F_REQUEST | NLM_F_DUMP);
}

#[tokio::test]
async fn large_set_lists_as_several_messages() {
    let conn = connect();
    conn.create("big", "hash:ip", 4, ProtoFamily::Ipv4, CreateData::new())
        .await
        .unwrap();

    let count = DUMP_CHUNK * 2 + 1;
    let entries = (0..count).map(|i| Entry::new().ip(Ipv4Addr::new(10, 0, 0, i as u8)));
    conn.add("big", entries).await.unwrap();

    let sets = conn.list("big").await.unwrap();
    assert_eq!(sets.len(), 3);
    assert!(sets.iter().all(|s| s.name() == "big"));

    let addrs: Vec<Option<IpAddr>> = sets
        .iter()
        .flat_map(|s| s.entries.iter())
        .map(|e| e.ip.get())
        .collect();
    assert_eq!(addrs.len(), count);
    assert_eq!(addrs[0], Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 0))));

    // header listing stays a single message without members
    let header = conn.list_header("big").await.unwrap().unwrap();
    assert!(header.entries.is_empty());
}

#[tokio::test]
async fn list_all_returns_every_set() {
    let conn = connect();
    create_foo(&conn).await;
    conn.create("bar", "hash:ip", 4, ProtoFamily::Ipv4, CreateData::new())
        .await
        .unwrap();

    let sets = conn.list_all().await.unwrap();
    let names: Vec<&str> = sets.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["bar", "foo"]);
}

#[tokio::test]
async fn test_and_contains() {
    let conn = connect();
    create_foo(&conn).await;
    conn.add("foo", [Entry::new().ether(MAC_A)]).await.unwrap();

    conn.test("foo", Entry::new().ether(MAC_A)).await.unwrap();
    let err = conn.test("foo", Entry::new().ether(MAC_B)).await.unwrap_err();
    assert!(err.is_missing_element());

    assert!(conn.contains("foo", Entry::new().ether(MAC_A)).await.unwrap());
    assert!(!conn.contains("foo", Entry::new().ether(MAC_B)).await.unwrap());

    let err = conn
        .contains("missing", Entry::new().ether(MAC_A))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_elements() {
    let conn = connect();
    create_foo(&conn).await;
    conn.add("foo", [Entry::new().ether(MAC_A), Entry::new().ether(MAC_B)])
        .await
        .unwrap();

    conn.delete("foo", [Entry::new().ether(MAC_A)]).await.unwrap();
    let set = conn.transport().set("foo").unwrap();
    assert_eq!(set.entries.len(), 1);

    let err = conn
        .delete("foo", [Entry::new().ether(MAC_A)])
        .await
        .unwrap_err();
    assert_eq!(err.errno(), Some(IPSET_ERR_EXIST));
}

#[tokio::test]
async fn rename_then_destroy() {
    let conn = connect();
    create_foo(&conn).await;

    conn.rename("foo", "bar").await.unwrap();
    assert_eq!(conn.transport().set_names(), vec!["bar".to_string()]);

    let (rename, attrs) = conn.transport().last_request();
    assert_eq!(rename.message_type, u8::from(Command::Rename));
    assert_eq!(attrs[2].kind(), IpsetAttr::SETNAME2);
    assert_eq!(attrs[2].data(), b"bar\0");

    conn.destroy("bar").await.unwrap();
    assert!(conn.transport().set_names().is_empty());
}

#[tokio::test]
async fn destroy_missing_set_fails() {
    let conn = connect();
    let err = conn.destroy("bar").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.errno(), Some(libc::ENOENT));
}

#[tokio::test]
async fn rename_onto_existing_set_fails() {
    let conn = connect();
    create_foo(&conn).await;
    conn.create("bar", "hash:mac", 0, ProtoFamily::Unspec, CreateData::new())
        .await
        .unwrap();

    let err = conn.rename("foo", "bar").await.unwrap_err();
    assert_eq!(err.errno(), Some(IPSET_ERR_EXIST_SETNAME2));
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn swap_exchanges_contents() {
    let conn = connect();
    create_foo(&conn).await;
    conn.create("bar", "hash:mac", 0, ProtoFamily::Unspec, CreateData::new())
        .await
        .unwrap();
    conn.add("foo", [Entry::new().ether(MAC_A)]).await.unwrap();

    conn.swap("foo", "bar").await.unwrap();
    assert!(conn.transport().set("foo").unwrap().entries.is_empty());
    assert_eq!(conn.transport().set("bar").unwrap().entries.len(), 1);
}

#[tokio::test]
async fn flush_is_idempotent() {
    let conn = connect();
    create_foo(&conn).await;

    conn.flush("foo").await.unwrap();
    conn.flush("foo").await.unwrap();
    assert!(conn.transport().set("foo").unwrap().entries.is_empty());

    conn.add("foo", [Entry::new().ether(MAC_A)]).await.unwrap();
    conn.flush_all().await.unwrap();
    assert!(conn.list("foo").await.unwrap()[0].entries.is_empty());

    // flush-all carries the protocol attribute only
    conn.flush_all().await.unwrap();
    let (_, attrs) = conn.transport().last_request();
    assert_eq!(attrs.len(), 1);
}

#[tokio::test]
async fn destroy_all_removes_every_set() {
    let conn = connect();
    create_foo(&conn).await;
    conn.create("bar", "hash:mac", 0, ProtoFamily::Unspec, CreateData::new())
        .await
        .unwrap();

    conn.destroy_all().await.unwrap();
    assert!(conn.transport().set_names().is_empty());
    assert!(conn.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn header_and_type_queries() {
    let conn = connect();
    create_foo(&conn).await;

    let header = conn.header("foo").await.unwrap();
    assert_eq!(header.name(), "foo");
    assert_eq!(header.type_name(), "hash:mac");
    assert_eq!(header.family(), ProtoFamily::Unspec);

    let info = conn.type_info("hash:ip", ProtoFamily::Ipv4).await.unwrap();
    assert_eq!(info.revision.get(), 6);
    assert_eq!(info.revision_min.get(), 0);
    assert_eq!(info.base.type_name.get(), "hash:ip");

    let err = conn
        .type_info("hash:nope", ProtoFamily::Ipv4)
        .await
        .unwrap_err();
    assert_eq!(err.errno(), Some(IPSET_ERR_FIND_TYPE));

    let proto = conn.protocol().await.unwrap();
    assert!(proto.protocol_min.get() <= proto.base.protocol.get());
}

#[tokio::test]
async fn entries_with_ranges_and_comments() {
    let conn = connect();
    conn.create("nets", "hash:net", 7, ProtoFamily::Ipv4, CreateData::new())
        .await
        .unwrap();

    let entry = Entry::new()
        .ip(Ipv4Addr::new(192, 168, 8, 0))
        .cidr(24)
        .timeout(Duration::from_secs(30))
        .comment("lab");
    conn.add("nets", [entry]).await.unwrap();

    let sets = conn.list("nets").await.unwrap();
    let listed = &sets[0].entries.as_slice()[0];
    assert_eq!(listed.ip.get(), Some(IpAddr::V4(Ipv4Addr::new(192, 168, 8, 0))));
    assert_eq!(listed.cidr.get(), 24);
    assert_eq!(listed.timeout.get(), Duration::from_secs(30));
    assert_eq!(listed.comment.get(), "lab");
}

#[tokio::test]
async fn oversized_add_leaves_set_untouched() {
    let conn = connect();
    conn.create("hosts", "hash:ip", 6, ProtoFamily::Ipv4, CreateData::new())
        .await
        .unwrap();
    let sent = conn.transport().requests().len();

    let entries = (0..3000u32).map(|i| Entry::new().ip(Ipv4Addr::from(0xc0a8_0000 + i)));
    let err = conn.add("hosts", entries).await.unwrap_err();
    assert!(err.to_string().contains("attribute too large"));
    assert_eq!(err.errno(), None);

    assert_eq!(conn.transport().requests().len(), sent);
    assert!(conn.transport().set("hosts").unwrap().entries.is_empty());
}
