//! Create a set, fill it, query it and tear it down.
//!
//! Run with: sudo cargo run -p nlipset --example manage_set
//!
//! Set RUST_LOG=nlipset=debug to see each command as it is sent.

use std::net::Ipv4Addr;
use std::time::Duration;

use nlipset::ipset::BoxGet;
use nlipset::ipset::cadt_flags;
use nlipset::netlink::ProtoFamily;
use nlipset::{Config, CreateData, Entry, IpsetConnection};

const SET: &str = "nlipset-demo";

#[tokio::main]
async fn main() -> nlipset::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let conn = IpsetConnection::dial(Config::new().family(ProtoFamily::Ipv4))?;

    let proto = conn.protocol().await?;
    println!(
        "kernel speaks ipset protocol {} (minimum {})",
        proto.base.protocol.get(),
        proto.protocol_min.get()
    );

    let info = conn.type_info("hash:net", ProtoFamily::Ipv4).await?;
    println!(
        "hash:net revisions {}..={}",
        info.revision_min.get(),
        info.revision.get()
    );

    let data = CreateData::new()
        .hash_size(1024)
        .max_elem(65536)
        .timeout(Duration::from_secs(3600))
        .cadt_flags(cadt_flags::WITH_COMMENT | cadt_flags::WITH_COUNTERS);
    conn.create(SET, "hash:net", info.revision.get(), ProtoFamily::Ipv4, data)
        .await?;
    println!("created {}", SET);

    conn.add(
        SET,
        [
            Entry::new()
                .ip(Ipv4Addr::new(192, 0, 2, 0))
                .cidr(24)
                .comment("documentation"),
            Entry::new()
                .ip(Ipv4Addr::new(198, 51, 100, 0))
                .cidr(24)
                .timeout(Duration::from_secs(60)),
        ],
    )
    .await?;

    let probe = Entry::new().ip(Ipv4Addr::new(192, 0, 2, 17));
    println!("192.0.2.17 in set: {}", conn.contains(SET, probe).await?);

    for set in conn.list(SET).await? {
        for entry in &set.entries {
            println!("  {}", entry);
        }
    }

    conn.destroy(SET).await?;
    println!("destroyed {}", SET);
    Ok(())
}
