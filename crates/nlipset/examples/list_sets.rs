//! List ipsets and their members.
//!
//! Run with: sudo cargo run -p nlipset --example list_sets
//!
//! Options:
//!   cargo run -p nlipset --example list_sets -- <name>     one set only
//!   cargo run -p nlipset --example list_sets -- --json     JSON output
//!   cargo run -p nlipset --example list_sets -- --netns fw inside namespace "fw"

use std::env;
use std::error::Error;

use nlipset::ipset::BoxGet;
use nlipset::{Config, IpsetConnection};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let mut config = Config::new();
    let mut name = None;
    let mut json = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" | "-j" => json = true,
            "--netns" => {
                let ns = args.next().ok_or("usage: --netns <name>")?;
                config = config.namespace(format!("/var/run/netns/{}", ns));
            }
            _ => name = Some(arg),
        }
    }

    let conn = IpsetConnection::dial(config)?;
    let sets = match &name {
        Some(name) => conn.list(name).await?,
        None => conn.list_all().await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&sets)?);
        return Ok(());
    }

    // A large set arrives in several messages; print its header once.
    let mut current = String::new();
    for set in &sets {
        if set.name() != current {
            current = set.name().to_string();
            println!("Name: {}", set.name());
            println!("Type: {}", set.type_name());
            println!("Revision: {}", set.base.revision());
            if let Some(data) = &set.data {
                println!(
                    "Header: hashsize {} maxelem {} timeout {}",
                    data.hash_size.get(),
                    data.max_elem.get(),
                    data.timeout.get().as_secs()
                );
                println!("Size in memory: {}", data.memsize.get());
                println!("References: {}", data.references.get());
                println!("Number of entries: {}", data.elements.get());
            }
            println!("Members:");
        }
        for entry in &set.entries {
            println!("{}", entry);
        }
    }

    Ok(())
}
