//! In-memory stand-in for the kernel's ipset subsystem.
//!
//! Decodes each request with the crate's own policies, applies it to a map
//! of sets, and answers the way the kernel does: data messages for
//! protocol/header/type/list, nothing for acknowledged commands, and an
//! errno for failures.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use nlipset::ipset::attributes::{MarshalAttributes, UnmarshalAttribute, unmarshal_attributes};
use nlipset::ipset::boxes::{BeU32Box, U8Box};
use nlipset::ipset::errno::{
    IPSET_ERR_EXIST, IPSET_ERR_EXIST_SETNAME2, IPSET_ERR_FIND_TYPE, IPSET_ERR_TYPE_MISMATCH,
};
use nlipset::ipset::{
    BasePolicy, BoxGet, Command, CreateData, CreatePolicy, DumpPolicy, Entry, EntryAddDelPolicy,
    HeaderPolicy, MovePolicy, NamePolicy, ProtocolResponsePolicy, SetPolicy, TestPolicy,
    TypePolicy, TypeResponsePolicy, cmd_flags,
};
use nlipset::netlink::message::{NLM_F_EXCL, NLM_F_MULTI};
use nlipset::netlink::netfilter::{self, Header, ProtoFamily};
use nlipset::netlink::{Attribute, Error, MessageBuilder, Result, Transport};

/// Elements per list message before the dump is split.
pub const DUMP_CHUNK: usize = 4;

/// Set types the fake kernel knows, with their (min, max) revisions.
const TYPES: &[(&str, u8, u8)] = &[
    ("hash:ip", 0, 6),
    ("hash:mac", 0, 1),
    ("hash:net", 0, 7),
    ("hash:ip,port", 0, 6),
    ("list:set", 0, 3),
];

#[derive(Debug, Clone)]
pub struct FakeSet {
    pub type_name: String,
    pub revision: u8,
    pub family: u8,
    pub data: CreateData,
    pub entries: Vec<Entry>,
}

#[derive(Default)]
struct State {
    sets: BTreeMap<String, FakeSet>,
    requests: Vec<(Header, Vec<Attribute>)>,
}

#[derive(Default)]
pub struct FakeKernel {
    state: Mutex<State>,
}

impl FakeKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received so far, decoded.
    pub fn requests(&self) -> Vec<(Header, Vec<Attribute>)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> (Header, Vec<Attribute>) {
        self.requests().pop().expect("no request received")
    }

    pub fn set(&self, name: &str) -> Option<FakeSet> {
        self.state.lock().unwrap().sets.get(name).cloned()
    }

    pub fn set_names(&self) -> Vec<String> {
        self.state.lock().unwrap().sets.keys().cloned().collect()
    }

    fn handle(&self, request: &[u8]) -> std::result::Result<Vec<Vec<u8>>, i32> {
        let (header, attrs) = netfilter::unwrap(request).map_err(|_| libc::EINVAL)?;
        let mut state = self.state.lock().unwrap();
        state.requests.push((header, attrs.clone()));

        let command = Command::from_u8(header.message_type).ok_or(libc::EOPNOTSUPP)?;
        let sets = &mut state.sets;
        let reply = |policy: &dyn MarshalAttributes, flags: u16| {
            let header = Header::ipset(header.family, header.message_type, flags);
            netfilter::wrap(&header, policy.marshal_attributes().as_slice())
                .map(MessageBuilder::finish)
                .map_err(|_| libc::EMSGSIZE)
        };

        match command {
            Command::Protocol => {
                let response = ProtocolResponsePolicy {
                    base: BasePolicy {
                        protocol: Some(U8Box(7)),
                    },
                    protocol_min: Some(U8Box(6)),
                };
                Ok(vec![reply(&response, 0)?])
            }
            Command::Create => {
                let policy: CreatePolicy = decode(&attrs)?;
                let name = policy.base.name().to_string();
                let type_name = policy.base.type_name().to_string();
                if !TYPES.iter().any(|(t, _, _)| *t == type_name) {
                    return Err(IPSET_ERR_FIND_TYPE);
                }
                if let Some(existing) = sets.get(&name) {
                    if header.flags & NLM_F_EXCL != 0 || existing.type_name != type_name {
                        return Err(libc::EEXIST);
                    }
                    return Ok(Vec::new());
                }
                sets.insert(
                    name,
                    FakeSet {
                        type_name,
                        revision: policy.base.revision(),
                        family: policy.base.family().number(),
                        data: policy.data.unwrap_or_default(),
                        entries: Vec::new(),
                    },
                );
                Ok(Vec::new())
            }
            Command::Destroy => {
                let policy: NamePolicy = decode(&attrs)?;
                match policy.name {
                    Some(_) => {
                        sets.remove(policy.name()).ok_or(libc::ENOENT)?;
                    }
                    None => sets.clear(),
                }
                Ok(Vec::new())
            }
            Command::Flush => {
                let policy: NamePolicy = decode(&attrs)?;
                match policy.name {
                    Some(_) => sets.get_mut(policy.name()).ok_or(libc::ENOENT)?.entries.clear(),
                    None => sets.values_mut().for_each(|s| s.entries.clear()),
                }
                Ok(Vec::new())
            }
            Command::Rename => {
                let policy: MovePolicy = decode(&attrs)?;
                if sets.contains_key(policy.to_name()) {
                    return Err(IPSET_ERR_EXIST_SETNAME2);
                }
                let set = sets.remove(policy.from_name()).ok_or(libc::ENOENT)?;
                sets.insert(policy.to_name().to_string(), set);
                Ok(Vec::new())
            }
            Command::Swap => {
                let policy: MovePolicy = decode(&attrs)?;
                let from = sets.get(policy.from_name()).cloned().ok_or(libc::ENOENT)?;
                let to = sets.get(policy.to_name()).cloned().ok_or(IPSET_ERR_EXIST_SETNAME2)?;
                if from.type_name != to.type_name {
                    return Err(IPSET_ERR_TYPE_MISMATCH);
                }
                sets.insert(policy.from_name().to_string(), to);
                sets.insert(policy.to_name().to_string(), from);
                Ok(Vec::new())
            }
            Command::List => {
                let policy: DumpPolicy = decode(&attrs)?;
                let header_only = policy.flags.get() & cmd_flags::LIST_HEADER != 0;
                let selected: Vec<(&String, &FakeSet)> = match policy.base.name {
                    Some(_) => {
                        let name = policy.base.name();
                        let (key, set) = sets.get_key_value(name).ok_or(libc::ENOENT)?;
                        vec![(key, set)]
                    }
                    None => sets.iter().collect(),
                };

                let mut messages = Vec::new();
                for (name, set) in selected {
                    let chunks: Vec<&[Entry]> = if header_only || set.entries.is_empty() {
                        vec![&set.entries[..0]]
                    } else {
                        set.entries.chunks(DUMP_CHUNK).collect()
                    };
                    for chunk in chunks {
                        let response = SetPolicy {
                            base: header_of(name, set),
                            data: Some(reported_data(set)),
                            entries: chunk.iter().cloned().collect(),
                            line_no: None,
                        };
                        messages.push(reply(&response, NLM_F_MULTI)?);
                    }
                }
                Ok(messages)
            }
            Command::Add => {
                let policy: EntryAddDelPolicy = decode(&attrs)?;
                let set = sets.get_mut(policy.base.name()).ok_or(libc::ENOENT)?;
                for entry in policy.entries {
                    let entry = stored(entry);
                    if set.entries.iter().any(|e| same_key(e, &entry)) {
                        return Err(IPSET_ERR_EXIST);
                    }
                    set.entries.push(entry);
                }
                Ok(Vec::new())
            }
            Command::Del => {
                let policy: EntryAddDelPolicy = decode(&attrs)?;
                let set = sets.get_mut(policy.base.name()).ok_or(libc::ENOENT)?;
                for entry in policy.entries {
                    let entry = stored(entry);
                    let pos = set
                        .entries
                        .iter()
                        .position(|e| same_key(e, &entry))
                        .ok_or(IPSET_ERR_EXIST)?;
                    set.entries.remove(pos);
                }
                Ok(Vec::new())
            }
            Command::Test => {
                let policy: TestPolicy = decode(&attrs)?;
                let set = sets.get(policy.base.name()).ok_or(libc::ENOENT)?;
                let entry = stored(policy.entry.unwrap_or_default());
                if set.entries.iter().any(|e| same_key(e, &entry)) {
                    Ok(Vec::new())
                } else {
                    Err(IPSET_ERR_EXIST)
                }
            }
            Command::Header => {
                let policy: NamePolicy = decode(&attrs)?;
                let (name, set) = sets.get_key_value(policy.name()).ok_or(libc::ENOENT)?;
                Ok(vec![reply(&header_of(name, set), 0)?])
            }
            Command::Type => {
                let policy: TypePolicy = decode(&attrs)?;
                let type_name = policy.type_name.get();
                let (_, min, max) = TYPES
                    .iter()
                    .find(|(t, _, _)| *t == type_name)
                    .ok_or(IPSET_ERR_FIND_TYPE)?;
                let response = TypeResponsePolicy {
                    base: policy,
                    revision: Some(U8Box(*max)),
                    revision_min: Some(U8Box(*min)),
                };
                Ok(vec![reply(&response, 0)?])
            }
            Command::Save => Err(libc::EOPNOTSUPP),
        }
    }
}

impl Transport for FakeKernel {
    async fn query(&self, request: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        self.handle(&request.finish())
            .map_err(|errno| Error::from_errno(-errno))
    }
}

fn decode<P: Default + UnmarshalAttribute>(
    attrs: &[Attribute],
) -> std::result::Result<P, i32> {
    let mut policy = P::default();
    unmarshal_attributes(attrs, &mut policy).map_err(|_| libc::EINVAL)?;
    Ok(policy)
}

fn header_of(name: &str, set: &FakeSet) -> HeaderPolicy {
    HeaderPolicy::new(
        NamePolicy::new(name),
        set.type_name.as_str(),
        set.revision,
        ProtoFamily::from_u8(set.family),
    )
}

fn reported_data(set: &FakeSet) -> CreateData {
    let mut data = set.data.clone();
    data.elements = Some(BeU32Box(set.entries.len() as u32));
    data.references = Some(BeU32Box(0));
    data.memsize = Some(BeU32Box(128 + 32 * set.entries.len() as u32));
    data
}

/// The kernel does not keep request line numbers.
fn stored(mut entry: Entry) -> Entry {
    entry.line_no = None;
    entry
}

/// Elements are identified by their key fields only.
fn same_key(a: &Entry, b: &Entry) -> bool {
    a.ip == b.ip
        && a.ip_to == b.ip_to
        && a.cidr == b.cidr
        && a.port == b.port
        && a.proto == b.proto
        && a.ether == b.ether
        && a.name == b.name
        && a.ip2 == b.ip2
        && a.cidr2 == b.cidr2
        && a.iface == b.iface
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}
