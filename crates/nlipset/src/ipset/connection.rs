//! The ipset command dispatcher.

use super::attributes::{MarshalAttributes, UnmarshalAttribute, unmarshal_message};
use super::config::Config;
use super::entry::{Entries, Entry, EntryAddDelPolicy, TestPolicy};
use super::policy::{
    BasePolicy, DumpPolicy, HeaderPolicy, MovePolicy, NamePolicy, ProtocolResponsePolicy,
    TypePolicy, TypeResponsePolicy,
};
use super::set::{CreateData, CreatePolicy, SetPolicy};
use super::types::{Command, cmd_flags};
use crate::netlink::message::{
    NLM_F_ACK, NLM_F_CREATE, NLM_F_DUMP, NLM_F_EXCL, NLM_F_REPLACE, NLM_F_REQUEST,
};
use crate::netlink::netfilter::{self, Header, ProtoFamily};
use crate::netlink::{Connection, Error, Result, Transport};

/// Client for the kernel's ipset subsystem.
///
/// Every operation is one request/response exchange and nothing is retried.
/// Replies are matched to requests by sequence number, so a connection should
/// not be shared by tasks issuing requests concurrently; open one per task.
/// Dropping the connection closes its socket.
///
/// # Example
///
/// ```ignore
/// use nlipset::{Config, Entry, IpsetConnection};
/// use nlipset::netlink::ProtoFamily;
///
/// let conn = IpsetConnection::dial(Config::new().family(ProtoFamily::Ipv4))?;
/// conn.create("blocklist", "hash:ip", 4, ProtoFamily::Ipv4, Default::default()).await?;
/// conn.add("blocklist", [Entry::new().ip("192.0.2.1".parse::<std::net::IpAddr>()?)]).await?;
/// ```
pub struct IpsetConnection<T: Transport = Connection> {
    transport: T,
    family: ProtoFamily,
}

impl IpsetConnection<Connection> {
    /// Open a netfilter socket as described by `config`.
    pub fn dial(config: Config) -> Result<Self> {
        let transport = match config.namespace_path() {
            Some(path) => Connection::new_in_namespace_path(path)?,
            None => Connection::new()?,
        };
        Ok(Self::with_transport(transport, config.proto_family()))
    }
}

impl<T: Transport> IpsetConnection<T> {
    /// Wrap an existing transport.
    pub fn with_transport(transport: T, family: ProtoFamily) -> Self {
        Self { transport, family }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Family written into every request header.
    pub fn family(&self) -> ProtoFamily {
        self.family
    }

    // ========================================================================
    // Exchange primitives
    // ========================================================================

    async fn query<P: MarshalAttributes>(
        &self,
        command: Command,
        flags: u16,
        policy: &P,
    ) -> Result<Vec<Vec<u8>>> {
        let attrs = policy.marshal_attributes();
        let flags = NLM_F_REQUEST | flags;
        let header = Header::ipset(self.family, command.into(), flags);
        let request = netfilter::wrap(&header, attrs.as_slice())?;

        let responses = self.transport.query(request).await?;
        tracing::debug!(
            command = command.name(),
            flags,
            attributes = attrs.len(),
            responses = responses.len(),
            "ipset command"
        );
        Ok(responses)
    }

    async fn execute<P: MarshalAttributes>(
        &self,
        command: Command,
        flags: u16,
        policy: &P,
    ) -> Result<()> {
        self.query(command, flags | NLM_F_ACK, policy).await?;
        Ok(())
    }

    async fn request<P, R>(&self, command: Command, policy: &P) -> Result<R>
    where
        P: MarshalAttributes,
        R: UnmarshalAttribute + Default,
    {
        let responses = self.query(command, 0, policy).await?;
        let [message] = responses.as_slice() else {
            return Err(Error::InvalidMessage(format!(
                "{} expected one reply, got {}",
                command.name(),
                responses.len()
            )));
        };

        let mut reply = R::default();
        unmarshal_message(message, &mut reply)?;
        Ok(reply)
    }

    async fn dump<P: MarshalAttributes>(&self, policy: &P) -> Result<Vec<SetPolicy>> {
        self.query(Command::List, NLM_F_DUMP, policy)
            .await?
            .iter()
            .map(|message| {
                let mut set = SetPolicy::default();
                unmarshal_message(message, &mut set)?;
                Ok(set)
            })
            .collect()
    }

    // ========================================================================
    // Protocol and types
    // ========================================================================

    /// Query the kernel's protocol version range.
    pub async fn protocol(&self) -> Result<ProtocolResponsePolicy> {
        self.request(Command::Protocol, &BasePolicy::new())
            .await
            .map_err(|e| e.with_context("query protocol"))
    }

    /// Query a set type's supported revision range.
    ///
    /// Fails with `IPSET_ERR_FIND_TYPE` when the kernel does not know the type.
    pub async fn type_info(&self, type_name: &str, family: ProtoFamily) -> Result<TypeResponsePolicy> {
        self.request(Command::Type, &TypePolicy::new(type_name, family))
            .await
            .map_err(|e| e.with_context(format!("query type {type_name}")))
    }

    // ========================================================================
    // Set lifecycle
    // ========================================================================

    /// Create a set. Fails if a set with that name exists.
    pub async fn create(
        &self,
        name: &str,
        type_name: &str,
        revision: u8,
        family: ProtoFamily,
        data: CreateData,
    ) -> Result<()> {
        let policy = create_policy(name, type_name, revision, family, data);
        self.execute(Command::Create, NLM_F_CREATE | NLM_F_EXCL, &policy)
            .await
            .map_err(|e| e.with_context(format!("create set {name}")))
    }

    /// Create a set, accepting an existing set of identical type and settings.
    pub async fn replace(
        &self,
        name: &str,
        type_name: &str,
        revision: u8,
        family: ProtoFamily,
        data: CreateData,
    ) -> Result<()> {
        let policy = create_policy(name, type_name, revision, family, data);
        self.execute(Command::Create, NLM_F_CREATE | NLM_F_REPLACE, &policy)
            .await
            .map_err(|e| e.with_context(format!("replace set {name}")))
    }

    /// Destroy a set. It must not be referenced by any rule.
    pub async fn destroy(&self, name: &str) -> Result<()> {
        self.execute(Command::Destroy, 0, &NamePolicy::new(name))
            .await
            .map_err(|e| e.with_context(format!("destroy set {name}")))
    }

    /// Destroy every unreferenced set.
    pub async fn destroy_all(&self) -> Result<()> {
        self.execute(Command::Destroy, 0, &BasePolicy::new())
            .await
            .map_err(|e| e.with_context("destroy all sets"))
    }

    /// Remove every element from a set.
    pub async fn flush(&self, name: &str) -> Result<()> {
        self.execute(Command::Flush, 0, &NamePolicy::new(name))
            .await
            .map_err(|e| e.with_context(format!("flush set {name}")))
    }

    /// Remove every element from every set.
    pub async fn flush_all(&self) -> Result<()> {
        self.execute(Command::Flush, 0, &BasePolicy::new())
            .await
            .map_err(|e| e.with_context("flush all sets"))
    }

    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.execute(Command::Rename, 0, &MovePolicy::new(from, to))
            .await
            .map_err(|e| e.with_context(format!("rename set {from} to {to}")))
    }

    /// Exchange the contents of two sets of compatible types.
    pub async fn swap(&self, from: &str, to: &str) -> Result<()> {
        self.execute(Command::Swap, 0, &MovePolicy::new(from, to))
            .await
            .map_err(|e| e.with_context(format!("swap sets {from} and {to}")))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Set header (name, type, revision, family) without members.
    pub async fn header(&self, name: &str) -> Result<HeaderPolicy> {
        self.request(Command::Header, &NamePolicy::new(name))
            .await
            .map_err(|e| e.with_context(format!("header of set {name}")))
    }

    /// Dump every set with its members.
    pub async fn list_all(&self) -> Result<Vec<SetPolicy>> {
        self.dump(&BasePolicy::new())
            .await
            .map_err(|e| e.with_context("list all sets"))
    }

    /// Dump one set. Large sets arrive as several messages.
    pub async fn list(&self, name: &str) -> Result<Vec<SetPolicy>> {
        self.dump(&NamePolicy::new(name))
            .await
            .map_err(|e| e.with_context(format!("list set {name}")))
    }

    /// Header and set data of one set, without members.
    ///
    /// Returns `None` when the kernel sends nothing back.
    pub async fn list_header(&self, name: &str) -> Result<Option<SetPolicy>> {
        let policy = DumpPolicy::new(NamePolicy::new(name), cmd_flags::LIST_HEADER);
        let mut sets = self
            .dump(&policy)
            .await
            .map_err(|e| e.with_context(format!("list header of set {name}")))?;

        if sets.len() > 1 {
            return Err(Error::InvalidMessage(format!(
                "header listing of set {name} returned {} messages",
                sets.len()
            )));
        }
        Ok(sets.pop())
    }

    // ========================================================================
    // Elements
    // ========================================================================

    /// Add elements to a set in one request.
    pub async fn add(&self, name: &str, entries: impl IntoIterator<Item = Entry>) -> Result<()> {
        let policy = entry_policy(name, entries);
        self.execute(Command::Add, 0, &policy)
            .await
            .map_err(|e| e.with_context(format!("add to set {name}")))
    }

    /// Delete elements from a set in one request.
    pub async fn delete(&self, name: &str, entries: impl IntoIterator<Item = Entry>) -> Result<()> {
        let policy = entry_policy(name, entries);
        self.execute(Command::Del, 0, &policy)
            .await
            .map_err(|e| e.with_context(format!("delete from set {name}")))
    }

    /// Test membership. An absent element is an error
    /// ([`Error::is_missing_element`]); see [`contains`](Self::contains).
    pub async fn test(&self, name: &str, entry: Entry) -> Result<()> {
        let policy = TestPolicy::new(NamePolicy::new(name), entry);
        self.execute(Command::Test, 0, &policy)
            .await
            .map_err(|e| e.with_context(format!("test set {name}")))
    }

    /// Test membership, mapping an absent element to `false`.
    pub async fn contains(&self, name: &str, entry: Entry) -> Result<bool> {
        match self.test(name, entry).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_missing_element() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn create_policy(
    name: &str,
    type_name: &str,
    revision: u8,
    family: ProtoFamily,
    data: CreateData,
) -> CreatePolicy {
    let header = HeaderPolicy::new(NamePolicy::new(name), type_name, revision, family);
    CreatePolicy::new(header, data)
}

fn entry_policy(name: &str, entries: impl IntoIterator<Item = Entry>) -> EntryAddDelPolicy {
    let entries: Entries = entries.into_iter().collect();
    EntryAddDelPolicy::new(NamePolicy::new(name), 0, entries)
}
