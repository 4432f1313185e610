//! The ipset attribute codec and command dispatcher.
//!
//! Requests and replies are described by *policies*: plain structs of
//! optional, typed field boxes ([`boxes`]) that marshal to and from the
//! attribute list of one command. [`IpsetConnection`] pairs each command with
//! its policies and runs it over a [`Transport`](crate::netlink::Transport).

pub mod attributes;
pub mod boxes;
mod config;
mod connection;
pub mod entry;
pub mod errno;
pub mod policy;
pub mod set;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use attributes::{Attributes, MarshalAttributes, UnmarshalAttribute};
pub use boxes::{BoxGet, FieldBox, Marshal, Unmarshal};
pub use config::Config;
pub use connection::IpsetConnection;
pub use entry::{Entries, Entry, EntryAddDelPolicy, TestPolicy};
pub use policy::{
    BasePolicy, DumpPolicy, HeaderPolicy, MovePolicy, NamePolicy, ProtocolResponsePolicy,
    TypePolicy, TypeResponsePolicy,
};
pub use set::{CreateData, CreatePolicy, SetPolicy};
pub use types::{Command, PROTOCOL, cadt_flags, cmd_flags};
