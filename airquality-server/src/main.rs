//! Binary crate for the `airquality` backend.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Serving the HTTP API consumed by the map frontend
//! - One-shot lookups from the command line

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
