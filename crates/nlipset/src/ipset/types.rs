//! ipset protocol constants: commands, attribute tags and flags.

/// Protocol version spoken by this client.
pub const PROTOCOL: u8 = 6;

/// ipset command, carried in the low byte of the netlink message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Return protocol version
    Protocol = 1,
    /// Create a new (empty) set
    Create = 2,
    /// Destroy a (empty) set
    Destroy = 3,
    /// Remove all elements from a set
    Flush = 4,
    /// Rename a set
    Rename = 5,
    /// Swap two sets
    Swap = 6,
    /// List sets
    List = 7,
    /// Save sets
    Save = 8,
    /// Add an element to a set
    Add = 9,
    /// Delete an element from a set
    Del = 10,
    /// Test an element in a set
    Test = 11,
    /// Get set header data only
    Header = 12,
    /// Get set type
    Type = 13,
}

impl Command {
    /// Convert from the wire value.
    pub fn from_u8(val: u8) -> Option<Self> {
        Some(match val {
            1 => Self::Protocol,
            2 => Self::Create,
            3 => Self::Destroy,
            4 => Self::Flush,
            5 => Self::Rename,
            6 => Self::Swap,
            7 => Self::List,
            8 => Self::Save,
            9 => Self::Add,
            10 => Self::Del,
            11 => Self::Test,
            12 => Self::Header,
            13 => Self::Type,
            _ => return None,
        })
    }

    /// Lowercase command name, as the ipset tool spells it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Protocol => "protocol",
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::Flush => "flush",
            Self::Rename => "rename",
            Self::Swap => "swap",
            Self::List => "list",
            Self::Save => "save",
            Self::Add => "add",
            Self::Del => "del",
            Self::Test => "test",
            Self::Header => "header",
            Self::Type => "type",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        cmd as u8
    }
}

/// Attribute tags at command level.
pub struct IpsetAttr;

impl IpsetAttr {
    /// Protocol version
    pub const PROTOCOL: u16 = 1;
    /// Name of the set
    pub const SETNAME: u16 = 2;
    /// Typename
    pub const TYPENAME: u16 = 3;
    /// Destination set of rename/swap, sharing the typename slot
    pub const SETNAME2: u16 = Self::TYPENAME;
    /// Settype revision
    pub const REVISION: u16 = 4;
    /// Settype family
    pub const FAMILY: u16 = 5;
    /// Flags at command level
    pub const FLAGS: u16 = 6;
    /// Nested attributes
    pub const DATA: u16 = 7;
    /// Multiple data containers
    pub const ADT: u16 = 8;
    /// Restore lineno
    pub const LINENO: u16 = 9;
    /// Minimal supported version number
    pub const PROTOCOL_MIN: u16 = 10;
    /// Minimal supported revision, sharing the protocol-min slot
    pub const REVISION_MIN: u16 = Self::PROTOCOL_MIN;
}

/// Attribute tags inside DATA containers shared by create and element data.
pub struct CadtAttr;

impl CadtAttr {
    pub const IP: u16 = 1;
    pub const IP_TO: u16 = 2;
    pub const CIDR: u16 = 3;
    pub const PORT: u16 = 4;
    pub const PORT_TO: u16 = 5;
    pub const TIMEOUT: u16 = 6;
    pub const PROTO: u16 = 7;
    pub const CADT_FLAGS: u16 = 8;
    pub const LINENO: u16 = 9;
    pub const MARK: u16 = 10;
    pub const MARKMASK: u16 = 11;
    /// Last tag of the shared range
    pub const MAX: u16 = 16;

    // Create-only
    pub const GC: u16 = 17;
    pub const HASHSIZE: u16 = 18;
    pub const MAXELEM: u16 = 19;
    pub const NETMASK: u16 = 20;
    pub const PROBES: u16 = 21;
    pub const RESIZE: u16 = 22;
    pub const SIZE: u16 = 23;

    // Kernel-only
    pub const ELEMENTS: u16 = 24;
    pub const REFERENCES: u16 = 25;
    pub const MEMSIZE: u16 = 26;
}

/// Element-only attribute tags. They share numbers with the create-only range.
pub struct AdtAttr;

impl AdtAttr {
    pub const ETHER: u16 = 17;
    pub const NAME: u16 = 18;
    pub const NAMEREF: u16 = 19;
    pub const IP2: u16 = 20;
    pub const CIDR2: u16 = 21;
    pub const IP2_TO: u16 = 22;
    pub const IFACE: u16 = 23;
    pub const BYTES: u16 = 24;
    pub const PACKETS: u16 = 25;
    pub const COMMENT: u16 = 26;
    pub const SKBMARK: u16 = 27;
    pub const SKBPRIO: u16 = 28;
    pub const SKBQUEUE: u16 = 29;
}

/// Children of an IP address attribute.
pub struct IpAddrAttr;

impl IpAddrAttr {
    pub const IPV4: u16 = 1;
    pub const IPV6: u16 = 2;
}

/// Per-set and per-element flags (CADT_FLAGS).
pub mod cadt_flags {
    pub const BEFORE: u32 = 1 << 0;
    pub const PHYSDEV: u32 = 1 << 1;
    pub const NOMATCH: u32 = 1 << 2;
    pub const WITH_COUNTERS: u32 = 1 << 3;
    pub const WITH_COMMENT: u32 = 1 << 4;
    pub const WITH_FORCEADD: u32 = 1 << 5;
    pub const WITH_SKBINFO: u32 = 1 << 6;
}

/// Command-level flags (the FLAGS attribute).
pub mod cmd_flags {
    /// Do not fail on existing/missing elements and sets
    pub const EXIST: u32 = 1 << 0;
    /// List set names only
    pub const LIST_SETNAME: u32 = 1 << 1;
    /// List set headers only
    pub const LIST_HEADER: u32 = 1 << 2;
    pub const SKIP_COUNTER_UPDATE: u32 = 1 << 3;
    pub const SKIP_SUBCOUNTER_UPDATE: u32 = 1 << 4;
    pub const MATCH_COUNTERS: u32 = 1 << 5;
    pub const RETURN_NOMATCH: u32 = 1 << 7;
}
