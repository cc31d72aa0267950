use std::fs::File;

use clap::Parser;
use env_logger::Env;
use log::info;

use crate::aggregate::aggregate;
use crate::client::RestClient;
use crate::endpoints::{default_endpoints, load_endpoints, Endpoint};
use crate::errors::*;

mod aggregate;
mod chain;
mod client;
mod endpoints;
mod errors;
mod lcd;
mod resolver;

/// Program to discover the IBC transfer channels of each configured chain
/// and map them by counterparty symbol
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "ibc-channels.json")]
    out_file: String,

    /// Endpoint override file (JSON object of symbol to LCD base url)
    #[arg(short, long)]
    endpoints: Option<String>,

    /// Channels requested per page
    #[arg(short, long, default_value_t = 200)]
    page_size: u32,

    /// Milliseconds to pause between channel lookups
    #[arg(short, long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let endpoints: Vec<Endpoint> = match &args.endpoints {
        Some(path) => load_endpoints(path)?,
        None => default_endpoints(),
    };
    info!(
        "querying {} chains: {}",
        endpoints.len(),
        endpoints
            .iter()
            .map(|e| e.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let client = RestClient::new()?;
    let map = aggregate(&client, &endpoints, args.page_size, args.delay_ms).await;

    let out_file =
        File::create(&args.out_file).chain_err(|| format!("cannot create {}", &args.out_file))?;
    serde_json::to_writer_pretty(out_file, &map)?;
    info!("{} chain entries written", map.len());

    println!("{}", args.out_file);
    Ok(())
}
