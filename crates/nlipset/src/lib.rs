//! Async netlink client for the Linux ipset subsystem.
//!
//! ipset keeps named sets of addresses, networks, ports and interface names
//! inside the kernel for netfilter rules to match against. This crate speaks
//! the ipset protocol over a `NETLINK_NETFILTER` socket: it builds typed
//! command messages, sends them, and decodes the kernel's nested attribute
//! replies back into structured values.
//!
//! # Features
//!
//! - `integration` - Kernel integration tests (need root and the `ip_set` module)
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use nlipset::{Config, CreateData, Entry, IpsetConnection};
//! use nlipset::netlink::ProtoFamily;
//!
//! #[tokio::main]
//! async fn main() -> nlipset::Result<()> {
//!     let conn = IpsetConnection::dial(Config::new())?;
//!
//!     let data = CreateData::new().timeout(Duration::from_secs(300));
//!     conn.create("blocklist", "hash:ip", 4, ProtoFamily::Ipv4, data).await?;
//!     conn.add("blocklist", [Entry::new().ip([192, 0, 2, 1])]).await?;
//!
//!     for set in conn.list("blocklist").await? {
//!         println!("{}: {} elements", set.name(), set.entries.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod ipset;
pub mod netlink;

// Re-export common types at crate root for convenience
pub use ipset::{Config, CreateData, Entries, Entry, IpsetConnection, SetPolicy};
pub use netlink::{Connection, Error, Result, Transport};
