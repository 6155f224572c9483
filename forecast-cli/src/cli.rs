use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forecast_core::{Config, ForecastClient, client_from_config, config::DEFAULT_BASE_URL};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::debug;

use crate::{output, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "OpenWeatherMap forecast CLI")]
pub struct Cli {
    /// Log level for this tool's own output; `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key and endpoint.
    Configure,

    /// Show the forecast for a city.
    Show {
        /// City name, optionally with country code, e.g. "London,GB".
        city: String,

        /// Print the raw forecast as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Serve forecasts over HTTP at `GET /api/forecast?city=...`.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, json } => {
                let client = load_client()?;
                show(&client, &city, json).await
            }
            Command::Serve { bind } => {
                let client = load_client()?;
                server::serve(client, bind).await
            }
        }
    }
}

/// The one client shared by every consumer in this process.
fn load_client() -> Result<ForecastClient> {
    let mut config = Config::load()?;
    config.apply_env_overrides(|name| std::env::var(name).ok());

    let client = client_from_config(&config)?;
    debug!(?client, "forecast client ready");
    Ok(client)
}

async fn show(client: &ForecastClient, city: &str, json: bool) -> Result<()> {
    let forecast = client
        .fetch_forecast(city)
        .await
        .with_context(|| format!("Failed to fetch forecast for '{city}'"))?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&forecast).context("Failed to serialize forecast")?;
        println!("{rendered}");
    } else {
        print!("{}", output::render_forecast(city, &forecast));
    }

    Ok(())
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let mut key_prompt = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    if config.api_key().is_some() {
        key_prompt = key_prompt.with_help_message("Leave empty to keep the current key");
    }
    let api_key = key_prompt.prompt().context("API key prompt aborted")?;

    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    } else if config.api_key().is_none() {
        anyhow::bail!("An API key is required");
    }

    let current_url = config.base_url()?.to_string();
    let base_url = Text::new("API base URL:")
        .with_default(&current_url)
        .with_help_message(&format!("Default: {DEFAULT_BASE_URL}"))
        .prompt()
        .context("Base URL prompt aborted")?;
    config.set_base_url(&base_url)?;

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_json_flag() {
        let cli = Cli::try_parse_from(["forecast", "show", "London,GB", "--json"]).unwrap();

        match cli.command {
            Command::Show { city, json } => {
                assert_eq!(city, "London,GB");
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn serve_defaults_to_localhost() {
        let cli = Cli::try_parse_from(["forecast", "serve"]).unwrap();

        match cli.command {
            Command::Serve { bind } => assert_eq!(bind.to_string(), "127.0.0.1:8080"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn log_level_is_global() {
        let cli = Cli::try_parse_from(["forecast", "show", "Paris", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn show_requires_a_city() {
        assert!(Cli::try_parse_from(["forecast", "show"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
