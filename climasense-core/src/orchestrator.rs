//! Sequencing of one user-initiated lookup: geocode, forecast, normalize.
//!
//! Each [`RequestOrchestrator::submit`] spawns a run tagged with a fresh,
//! strictly increasing sequence number. Progress and the final outcome are
//! sent as [`LookupEvent`]s over a channel, so the consumer (usually a UI
//! task) is the only party that mutates display state. Consumers drop events
//! whose sequence number is not the latest they started; see
//! [`crate::display::DisplayStateMachine::apply`].

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::{fmt, sync::Arc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    cache::CachedForecast,
    config::ApiConfig,
    error::{LookupError, SubmitError},
    forecast::{ForecastClient, ForecastSource},
    geocode::{GeocodeClient, Geocoder},
    model::{Units, WeatherReport},
    normalize::normalize,
};

/// A trimmed, non-empty place name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceName(String);

impl PlaceName {
    pub fn parse(input: &str) -> Result<Self, SubmitError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SubmitError::EmptyPlace);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Step a running lookup is in. Completion arrives as
/// [`LookupEventKind::Finished`], and "not running" is the display's idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Geocoding,
    Forecasting,
}

/// Handle for a submitted run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub place: PlaceName,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupEventKind {
    Stage(Stage),
    Finished(Result<WeatherReport, LookupError>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupEvent {
    pub seq: u64,
    pub kind: LookupEventKind,
}

#[derive(Debug, Clone)]
struct EventSink {
    seq: u64,
    tx: UnboundedSender<LookupEvent>,
}

impl EventSink {
    fn send(&self, kind: LookupEventKind) {
        if self.tx.send(LookupEvent { seq: self.seq, kind }).is_err() {
            tracing::trace!(seq = self.seq, "event receiver dropped");
        }
    }
}

#[derive(Debug, Clone)]
struct Pipeline {
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastSource>,
    units: Units,
}

impl Pipeline {
    async fn run(
        self,
        place: PlaceName,
        sink: Option<EventSink>,
    ) -> Result<WeatherReport, LookupError> {
        let notify = |stage| {
            if let Some(sink) = &sink {
                sink.send(LookupEventKind::Stage(stage));
            }
        };

        notify(Stage::Geocoding);
        let location = self.geocoder.resolve(place.as_str()).await?;

        notify(Stage::Forecasting);
        let payload = self.forecast.fetch(&location, self.units).await?;
        let snapshot = normalize(&payload)?;

        Ok(WeatherReport { location, units: self.units, snapshot, fetched_at: Utc::now() })
    }

    /// Runs on its own task so a panic surfaces as `LookupError::Unknown`
    /// instead of silently ending the run.
    async fn run_guarded(
        self,
        place: PlaceName,
        sink: Option<EventSink>,
    ) -> Result<WeatherReport, LookupError> {
        let outcome = match tokio::spawn(self.run(place.clone(), sink)).await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(LookupError::from(join_err)),
        };

        match &outcome {
            Ok(report) => tracing::info!(
                %place,
                resolved = report.location.short_name(),
                "lookup finished"
            ),
            Err(err) => tracing::warn!(%place, error = %err, "lookup failed"),
        }

        outcome
    }
}

#[derive(Debug)]
pub struct RequestOrchestrator {
    pipeline: Pipeline,
    last_seq: u64,
    events: UnboundedSender<LookupEvent>,
}

impl RequestOrchestrator {
    /// Returns the orchestrator and the receiving end of its event channel.
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        forecast: Arc<dyn ForecastSource>,
        units: Units,
    ) -> (Self, UnboundedReceiver<LookupEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let orchestrator =
            Self { pipeline: Pipeline { geocoder, forecast, units }, last_seq: 0, events };
        (orchestrator, rx)
    }

    /// Real HTTP clients, with forecast memoization per `cache_ttl_secs`.
    pub fn from_config(
        config: &ApiConfig,
    ) -> anyhow::Result<(Self, UnboundedReceiver<LookupEvent>)> {
        let geocoder = GeocodeClient::new(config).context("Failed to build geocoding client")?;
        let forecast = ForecastClient::new(config).context("Failed to build forecast client")?;
        let forecast = CachedForecast::new(forecast, config.cache_ttl());

        Ok(Self::new(Arc::new(geocoder), Arc::new(forecast), config.units))
    }

    pub fn units(&self) -> Units {
        self.pipeline.units
    }

    /// Applies to runs submitted after this call.
    pub fn set_units(&mut self, units: Units) {
        self.pipeline.units = units;
    }

    /// Sequence number of the most recent submission; 0 before the first.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Start a lookup in the background.
    ///
    /// Empty or whitespace-only input is rejected synchronously and no
    /// sequence number is consumed. Must be called from within a Tokio runtime.
    pub fn submit(&mut self, input: &str) -> Result<Ticket, SubmitError> {
        let place = PlaceName::parse(input)?;

        self.last_seq += 1;
        let seq = self.last_seq;
        let sink = EventSink { seq, tx: self.events.clone() };
        let pipeline = self.pipeline.clone();
        let run_place = place.clone();

        tracing::debug!(seq, %place, "lookup submitted");

        tokio::spawn(async move {
            let outcome = pipeline.run_guarded(run_place, Some(sink.clone())).await;
            sink.send(LookupEventKind::Finished(outcome));
        });

        Ok(Ticket { seq, place })
    }

    /// Run a lookup to completion in the caller's task, without events.
    pub async fn lookup(&self, place: &PlaceName) -> Result<WeatherReport, LookupError> {
        self.pipeline.clone().run_guarded(place.clone(), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_name_is_trimmed() {
        let place = PlaceName::parse("  Paris \t").unwrap();
        assert_eq!(place.as_str(), "Paris");
        assert_eq!(place.to_string(), "Paris");
    }

    #[test]
    fn stages_serialize_lowercase() {
        let names = serde_json::to_value([Stage::Geocoding, Stage::Forecasting]).unwrap();
        assert_eq!(names, serde_json::json!(["geocoding", "forecasting"]));
    }

    #[test]
    fn blank_place_name_is_rejected() {
        assert_eq!(PlaceName::parse(""), Err(SubmitError::EmptyPlace));
        assert_eq!(PlaceName::parse(" \n\t "), Err(SubmitError::EmptyPlace));
    }
}
