use airquality_core::{Config, Coordinate, Providers, aggregate};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::routes;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "airquality", version, about = "Air-quality and weather aggregator backend")]
pub struct Cli {
    /// Path to a TOML config file; defaults to the platform config directory.
    #[arg(long, global = true, env = "AIRQUALITY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to listen on, e.g. "0.0.0.0:5000".
        #[arg(long, env = "BIND_ADDR")]
        bind: Option<String>,
    },

    /// Fetch one reading and print it as JSON.
    Fetch {
        /// Latitude; defaults to the configured default.
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<String>,

        /// Longitude; defaults to the configured default.
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load(self.config.as_deref())?.apply_env();

        if config.openweather_api_key().is_none() {
            tracing::warn!("OPENWEATHER_API_KEY is not set; readings will come from Open-Meteo");
        }

        match self.command {
            Command::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
                routes::serve(config, &bind).await
            }
            Command::Fetch { lat, lon } => {
                let coord =
                    Coordinate::parse(lat.as_deref(), lon.as_deref(), config.default_coordinate())?;
                let providers = Providers::from_config(&config)?;

                let reading =
                    aggregate(providers.primary.as_ref(), providers.fallback.as_ref(), coord).await;

                let out = serde_json::to_string_pretty(&reading)
                    .context("Failed to serialize reading")?;
                println!("{out}");

                if !reading.is_ok() {
                    bail!("No provider returned a reading for {}, {}", coord.lat, coord.lon);
                }

                Ok(())
            }
        }
    }
}
