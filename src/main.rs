//! rentboard — command-line front end for the listing board.
//!
//! Usage:
//!   rentboard list
//!   rentboard search <query>
//!   rentboard post name=<..> phone=<..> location=<..> [price=<..>] [details=<..>] [photo=<path>]...
//!   rentboard delete <id> <user> <passphrase>
//!   rentboard config

use std::path::Path;

use anyhow::{bail, Context, Result};
use rentboard::{AdminCredentials, Board, Config, Listing, ListingDraft};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: rentboard <list | search <query> | post key=value... | delete <id> <user> <passphrase> | config>";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rentboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };

    if command == "config" {
        println!("{}", Config::example_config());
        return Ok(());
    }

    let config = Config::load()?;
    let board = Board::from_config(&config)?;

    let listings = match (command.as_str(), &args[1..]) {
        ("list", []) => board.listings().await,
        ("search", [query]) => board.search(query).await,
        ("post", fields) => {
            let (draft, photos) = parse_post(fields)?;
            board.post(draft, photos).await?
        }
        ("delete", [id, user, passphrase]) => {
            let credentials = AdminCredentials {
                user: user.clone(),
                passphrase: passphrase.clone(),
            };
            board.remove(&credentials, id).await?
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    print_listings(&listings)
}

fn parse_post(fields: &[String]) -> Result<(ListingDraft, Vec<Vec<u8>>)> {
    let mut draft = ListingDraft::default();
    let mut photos = Vec::new();

    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            bail!("Expected key=value, got {:?}", field);
        };
        match key {
            "name" => draft.name = value.to_string(),
            "phone" => draft.phone = value.to_string(),
            "location" => draft.location = value.to_string(),
            "price" => draft.price = value.to_string(),
            "details" => draft.details = value.to_string(),
            "photo" => {
                let bytes = std::fs::read(Path::new(value))
                    .with_context(|| format!("Failed to read photo {}", value))?;
                photos.push(bytes);
            }
            _ => bail!("Unknown field: {}", key),
        }
    }

    Ok((draft, photos))
}

fn print_listings(listings: &[Listing]) -> Result<()> {
    let json = serde_json::to_string_pretty(listings).context("Failed to serialize listings")?;
    println!("{}", json);
    Ok(())
}
