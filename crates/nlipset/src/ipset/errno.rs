//! ipset private kernel error codes.
//!
//! Besides the classic errno values, the ipset core reports failures with
//! codes starting at 4096. They are meaningless to `strerror`, so they get
//! their own table here.

/// Start of the private range.
pub const IPSET_ERR_PRIVATE: i32 = 4096;
pub const IPSET_ERR_PROTOCOL: i32 = 4097;
pub const IPSET_ERR_FIND_TYPE: i32 = 4098;
pub const IPSET_ERR_MAX_SETS: i32 = 4099;
pub const IPSET_ERR_BUSY: i32 = 4100;
pub const IPSET_ERR_EXIST_SETNAME2: i32 = 4101;
pub const IPSET_ERR_TYPE_MISMATCH: i32 = 4102;
pub const IPSET_ERR_EXIST: i32 = 4103;
pub const IPSET_ERR_INVALID_CIDR: i32 = 4104;
pub const IPSET_ERR_INVALID_NETMASK: i32 = 4105;
pub const IPSET_ERR_INVALID_FAMILY: i32 = 4106;
pub const IPSET_ERR_TIMEOUT: i32 = 4107;
pub const IPSET_ERR_REFERENCED: i32 = 4108;
pub const IPSET_ERR_IPADDR_IPV4: i32 = 4109;
pub const IPSET_ERR_IPADDR_IPV6: i32 = 4110;
pub const IPSET_ERR_COUNTER: i32 = 4111;
pub const IPSET_ERR_COMMENT: i32 = 4112;
pub const IPSET_ERR_INVALID_MARKMASK: i32 = 4113;
pub const IPSET_ERR_SKBINFO: i32 = 4114;
pub const IPSET_ERR_BITMASK_NETMASK_EXCL: i32 = 4115;

/// Start of the range reserved for set-type specific errors.
pub const IPSET_ERR_TYPE_SPECIFIC: i32 = 4352;

/// Describe an ipset private error code.
///
/// Returns `None` for codes outside the private range.
pub fn describe(errno: i32) -> Option<&'static str> {
    let message = match errno {
        IPSET_ERR_PROTOCOL => "Kernel error received: ipset protocol error",
        IPSET_ERR_FIND_TYPE => "Kernel error received: set type not supported",
        IPSET_ERR_MAX_SETS => "Kernel error received: maximal number of sets reached",
        IPSET_ERR_BUSY => "Set cannot be destroyed: it is in use by a kernel component",
        IPSET_ERR_EXIST_SETNAME2 => "Set with the destination name already exists",
        IPSET_ERR_TYPE_MISMATCH => "The sets cannot be swapped: their type does not match",
        IPSET_ERR_EXIST => "Element is missing from the set",
        IPSET_ERR_INVALID_CIDR => "The value of the CIDR parameter of the IP address is invalid",
        IPSET_ERR_INVALID_NETMASK => "The value of the netmask parameter is invalid",
        IPSET_ERR_INVALID_FAMILY => "Protocol family not supported by the set type",
        IPSET_ERR_TIMEOUT => "Timeout cannot be used: set was created without timeout support",
        IPSET_ERR_REFERENCED => "Set cannot be destroyed: it is referenced",
        IPSET_ERR_IPADDR_IPV4 => "An IPv4 address is expected, but not received",
        IPSET_ERR_IPADDR_IPV6 => "An IPv6 address is expected, but not received",
        IPSET_ERR_COUNTER => "Packet/byte counters cannot be used: set was created without counter support",
        IPSET_ERR_COMMENT => "Comment cannot be used: set was created without comment support",
        IPSET_ERR_INVALID_MARKMASK => "The value of the markmask parameter is invalid",
        IPSET_ERR_SKBINFO => "Skbinfo mapping cannot be used: set was created without skbinfo support",
        IPSET_ERR_BITMASK_NETMASK_EXCL => "The bitmask and netmask parameters are mutually exclusive",
        code if code >= IPSET_ERR_TYPE_SPECIFIC => "Kernel error received: set type specific error",
        code if code >= IPSET_ERR_PRIVATE => "Kernel error received: unknown ipset error",
        _ => return None,
    };
    Some(message)
}
