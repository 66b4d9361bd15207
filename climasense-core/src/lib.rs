//! Core library for the ClimaSense weather app.
//!
//! This crate defines:
//! - Configuration & API credentials handling
//! - Geocoding, forecast and IP location clients behind small async traits
//! - Normalization of provider payloads into a renderer-facing snapshot
//! - Lookup orchestration and the display state it drives
//!
//! It is used by `climasense-cli`, but any front-end that implements
//! [`display::Render`] can reuse it.

pub mod cache;
pub mod condition;
pub mod config;
pub mod display;
pub mod error;
pub mod favorites;
pub mod forecast;
pub mod geocode;
mod http;
pub mod locate;
pub mod model;
pub mod normalize;
pub mod orchestrator;

pub use cache::CachedForecast;
pub use config::{ApiConfig, Config};
pub use display::{DisplayStateMachine, DisplayView, Render, RequestState};
pub use error::{
    ErrorKind, ForecastError, GeocodeError, LookupError, NormalizeError, SubmitError, UnknownUnits,
};
pub use favorites::Favorites;
pub use forecast::{ForecastClient, ForecastSource, RawForecastPayload};
pub use geocode::{GeocodeClient, Geocoder};
pub use locate::{IpLocateClient, Locator};
pub use model::{
    Alert, Coordinates, DayPoint, HourPoint, Severity, Units, WeatherReport, WeatherSnapshot,
};
pub use normalize::normalize;
pub use orchestrator::{LookupEvent, LookupEventKind, PlaceName, RequestOrchestrator, Stage, Ticket};
