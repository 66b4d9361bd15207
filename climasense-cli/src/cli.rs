use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use climasense_core::{
    ApiConfig, Config, DisplayStateMachine, IpLocateClient, Locator, PlaceName, Render,
    RequestOrchestrator, Units,
};
use inquire::{Password, PasswordDisplayMode, Select};
use std::process::ExitCode;

use crate::{
    interactive,
    render::{JsonRenderer, TextRenderer},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climasense", version, about = "ClimaSense weather lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Tomorrow.io API key and preferred unit system.
    Configure,

    /// Look up one city, print the result and exit.
    Show {
        /// City or place name, e.g. "London" or "New York". When omitted,
        /// the city is guessed from your IP address.
        #[arg(num_args = 0..)]
        city: Vec<String>,

        /// Override the configured unit system (metric or imperial).
        #[arg(long)]
        units: Option<Units>,

        /// Print the display state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep prompting for cities; a new entry supersedes a pending lookup.
    Interactive {
        /// Override the configured unit system (metric or imperial).
        #[arg(long)]
        units: Option<Units>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units, json } => show(&city, units, json).await,
            Command::Interactive { units } => interactive::run(load_api_config(units)?).await,
        }
    }
}

fn load_api_config(units: Option<Units>) -> Result<ApiConfig> {
    let config = Config::load()?;
    let mut api = config.api_config()?;
    if let Some(units) = units {
        api.units = units;
    }
    tracing::debug!(units = %api.units, timeout_ms = api.timeout_ms, "resolved api settings");
    Ok(api)
}

fn configure() -> Result<ExitCode> {
    let mut config = Config::load()?;

    let help = if config.has_api_key() {
        "Leave blank to keep the current key"
    } else {
        "Get one at https://app.tomorrow.io/development/keys"
    };
    let key = Password::new("Tomorrow.io API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message(help)
        .prompt()
        .context("Failed to read API key")?;

    if !key.trim().is_empty() {
        config.set_api_key(key);
    }

    let options = Units::all().to_vec();
    let cursor = options.iter().position(|u| *u == config.units).unwrap_or(0);
    let units = Select::new("Unit system:", options)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Failed to read unit system")?;
    config.set_units(units);

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(ExitCode::SUCCESS)
}

/// City guessed from the caller's IP address, if any.
pub(crate) async fn detect_place(api: &ApiConfig) -> Result<Option<PlaceName>> {
    let locator = IpLocateClient::new(api).context("Failed to build location client")?;
    Ok(locator.detect_city().await.and_then(|city| PlaceName::parse(&city).ok()))
}

/// One lookup run to completion before anything is drawn; there is no
/// observable loading state in this mode.
async fn show(words: &[String], units: Option<Units>, json: bool) -> Result<ExitCode> {
    let typed = if words.is_empty() { None } else { Some(PlaceName::parse(&words.join(" "))) };
    let typed = match typed.transpose() {
        Ok(typed) => typed,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::from(2));
        }
    };

    let api = load_api_config(units)?;
    let place = match typed {
        Some(place) => place,
        None => match detect_place(&api).await? {
            Some(place) => place,
            None => {
                eprintln!("Could not detect your location. Please enter a city name.");
                return Ok(ExitCode::from(2));
            }
        },
    };
    let (orchestrator, _events) = RequestOrchestrator::from_config(&api)?;
    let display = DisplayStateMachine::completed(orchestrator.lookup(&place).await);

    let stdout = std::io::stdout();
    let mut renderer: Box<dyn Render> = if json {
        Box::new(JsonRenderer::new(stdout.lock()))
    } else {
        Box::new(TextRenderer::new(stdout.lock()))
    };
    renderer.render(&display)?;

    Ok(if display.status_is_error() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
