//! Prompt loop that keeps the terminal responsive while lookups run.
//!
//! Lookups run on background tasks; their events come back over the
//! orchestrator channel and are applied here, on the single task that owns
//! the display state. Typing a new city while one is loading supersedes it.

use anyhow::{Context, Result};
use climasense_core::{
    ApiConfig, DisplayStateMachine, Favorites, Render, RequestOrchestrator, Units,
};
use std::{io::Write, process::ExitCode};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    cli::detect_place,
    render::{TextRenderer, units_label},
};

const HELP: &str = "\
Type a city name to look it up. Commands:
  :fav [city]       add a city (default: last looked-up city) to favorites
  :unfav <city>     remove a favorite
  :favs             list favorites
  :open <n>         look up favorite number n
  :units <system>   switch between metric and imperial
  :help             show this help
  :quit             exit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Lookup(String),
    AddFavorite(Option<String>),
    RemoveFavorite(String),
    ListFavorites,
    OpenFavorite(usize),
    SetUnits(Units),
    Help,
    Quit,
    Invalid(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return Input::Lookup(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "fav" if arg.is_empty() => Input::AddFavorite(None),
            "fav" => Input::AddFavorite(Some(arg.to_string())),
            "unfav" if arg.is_empty() => Input::Invalid("Usage: :unfav <city>".to_string()),
            "unfav" => Input::RemoveFavorite(arg.to_string()),
            "favs" => Input::ListFavorites,
            "open" => match arg.parse::<usize>() {
                Ok(n) if n > 0 => Input::OpenFavorite(n),
                _ => Input::Invalid(format!("Usage: :open <n> (got '{arg}')")),
            },
            "units" => match arg.parse::<Units>() {
                Ok(units) => Input::SetUnits(units),
                Err(err) => Input::Invalid(err.to_string()),
            },
            "help" | "h" | "?" => Input::Help,
            "quit" | "q" | "exit" => Input::Quit,
            _ => Input::Invalid(format!("Unknown command ':{name}'. Type :help for a list.")),
        }
    }
}

struct Session {
    orchestrator: RequestOrchestrator,
    display: DisplayStateMachine,
    favorites: Favorites,
    renderer: TextRenderer<std::io::Stdout>,
}

impl Session {
    fn lookup(&mut self, city: &str) -> Result<()> {
        match self.orchestrator.submit(city) {
            Ok(ticket) => {
                self.display.begin(&ticket);
                self.renderer.render(&self.display)?;
            }
            Err(err) => println!("{err}"),
        }
        Ok(())
    }

    fn last_city(&self) -> Option<String> {
        self.display.report().map(|r| r.location.short_name().to_string())
    }

    /// Returns `false` when the session should end.
    fn handle(&mut self, input: Input) -> Result<bool> {
        match input {
            Input::Quit => return Ok(false),
            Input::Lookup(city) => self.lookup(&city)?,
            Input::AddFavorite(city) => {
                let Some(city) = city.or_else(|| self.last_city()) else {
                    println!("Nothing to add yet; look up a city first.");
                    return Ok(true);
                };
                if self.favorites.add(&city) {
                    println!("Added '{city}' to favorites.");
                } else {
                    println!("'{city}' is already a favorite.");
                }
            }
            Input::RemoveFavorite(city) => {
                if self.favorites.remove(&city) {
                    println!("Removed '{city}' from favorites.");
                } else {
                    println!("'{city}' is not a favorite.");
                }
            }
            Input::ListFavorites => {
                if self.favorites.is_empty() {
                    println!("No favorites yet.");
                }
                for (i, city) in self.favorites.iter().enumerate() {
                    println!("  {}. {city}", i + 1);
                }
            }
            Input::OpenFavorite(n) => {
                let city = self.favorites.iter().nth(n - 1).map(str::to_string);
                match city {
                    Some(city) => self.lookup(&city)?,
                    None => println!("No favorite number {n}."),
                }
            }
            Input::SetUnits(units) => {
                self.orchestrator.set_units(units);
                println!("Units set to {}.", units_label(units));
            }
            Input::Help => println!("{HELP}"),
            Input::Invalid(message) => println!("{message}"),
        }
        Ok(true)
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

pub async fn run(api: ApiConfig) -> Result<ExitCode> {
    let (orchestrator, mut events) = RequestOrchestrator::from_config(&api)?;
    let mut session = Session {
        orchestrator,
        display: DisplayStateMachine::new(),
        favorites: Favorites::new(),
        renderer: TextRenderer::new(std::io::stdout()),
    };

    println!("ClimaSense weather ({})", units_label(api.units));
    println!("{HELP}");
    session.renderer.render(&session.display)?;

    if let Some(place) = detect_place(&api).await? {
        println!("Detected location: {place}");
        session.lookup(place.as_str())?;
    }
    if !session.display.is_loading() {
        prompt()?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if !session.handle(Input::parse(&line))? {
                    break;
                }
                if !session.display.is_loading() {
                    prompt()?;
                }
            }
            Some(event) = events.recv() => {
                if session.display.apply(event) {
                    session.renderer.render(&session.display)?;
                    if !session.display.is_loading() {
                        prompt()?;
                    }
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_lookup() {
        assert_eq!(Input::parse("  New York "), Input::Lookup("New York".into()));
        assert_eq!(Input::parse(""), Input::Lookup(String::new()));
    }

    #[test]
    fn favorite_commands() {
        assert_eq!(Input::parse(":fav"), Input::AddFavorite(None));
        assert_eq!(Input::parse(":fav  Oslo "), Input::AddFavorite(Some("Oslo".into())));
        assert_eq!(Input::parse(":unfav Oslo"), Input::RemoveFavorite("Oslo".into()));
        assert_eq!(Input::parse(":favs"), Input::ListFavorites);
        assert_eq!(Input::parse(":open 2"), Input::OpenFavorite(2));
    }

    #[test]
    fn invalid_arguments() {
        assert!(matches!(Input::parse(":open 0"), Input::Invalid(_)));
        assert!(matches!(Input::parse(":open x"), Input::Invalid(_)));
        assert!(matches!(Input::parse(":unfav"), Input::Invalid(_)));
        assert!(matches!(Input::parse(":units kelvin"), Input::Invalid(_)));
        assert!(matches!(Input::parse(":nope"), Input::Invalid(_)));
    }

    #[test]
    fn units_and_control() {
        assert_eq!(Input::parse(":units imperial"), Input::SetUnits(Units::Imperial));
        assert_eq!(Input::parse(":q"), Input::Quit);
        assert_eq!(Input::parse(":help"), Input::Help);
    }
}
