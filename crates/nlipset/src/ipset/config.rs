//! Dial-time settings.

use std::path::{Path, PathBuf};

use crate::netlink::netfilter::ProtoFamily;

/// Settings fixed for the lifetime of an [`IpsetConnection`](super::IpsetConnection).
///
/// ```ignore
/// let config = Config::new()
///     .family(ProtoFamily::Ipv4)
///     .namespace("/var/run/netns/blue");
/// let conn = IpsetConnection::dial(config)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    family: ProtoFamily,
    namespace: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Netfilter family written into every request header.
    pub fn family(mut self, family: ProtoFamily) -> Self {
        self.family = family;
        self
    }

    /// Open the socket inside the network namespace at `path`.
    pub fn namespace(mut self, path: impl Into<PathBuf>) -> Self {
        self.namespace = Some(path.into());
        self
    }

    pub fn proto_family(&self) -> ProtoFamily {
        self.family
    }

    pub fn namespace_path(&self) -> Option<&Path> {
        self.namespace.as_deref()
    }
}
