//! Renderer-facing projection of lookup progress.
//!
//! [`DisplayStateMachine`] owns the [`RequestState`] and is only advanced by
//! orchestrator output: a [`Ticket`] to start, then [`LookupEvent`]s (or a
//! direct outcome in the page-style flow). Renderers read it, never write it.

use chrono::Local;
use serde::Serialize;

use crate::{
    error::{ErrorKind, LookupError},
    model::{WeatherReport, WeatherSnapshot},
    orchestrator::{LookupEvent, LookupEventKind, PlaceName, Stage, Ticket},
};

pub const IDLE_MESSAGE: &str = "Enter a city name and click 'Get Weather'";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading { place: PlaceName, stage: Stage },
    Success(WeatherReport),
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct DisplayStateMachine {
    state: RequestState,
    active_seq: Option<u64>,
}

/// Serializable snapshot of everything a renderer may show.
#[derive(Debug, Serialize)]
pub struct DisplayView<'a> {
    pub is_loading: bool,
    pub status_message: String,
    pub status_is_error: bool,
    pub button_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a WeatherReport>,
}

/// A front-end adapter. Implementations only read the display state.
pub trait Render {
    fn render(&mut self, display: &DisplayStateMachine) -> anyhow::Result<()>;
}

impl DisplayStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page-style flow: the whole lookup already ran, show its result.
    pub fn completed(outcome: Result<WeatherReport, LookupError>) -> Self {
        let mut display = Self::new();
        display.finish(outcome);
        display
    }

    /// Enter `Loading` for a freshly submitted run; earlier runs become stale.
    pub fn begin(&mut self, ticket: &Ticket) {
        self.active_seq = Some(ticket.seq);
        self.state = RequestState::Loading { place: ticket.place.clone(), stage: Stage::Geocoding };
    }

    /// Apply an orchestrator event. Returns `false` when the event was stale
    /// and therefore ignored.
    pub fn apply(&mut self, event: LookupEvent) -> bool {
        if self.active_seq != Some(event.seq) {
            tracing::debug!(
                seq = event.seq,
                active = ?self.active_seq,
                "dropping stale lookup event"
            );
            return false;
        }

        match event.kind {
            LookupEventKind::Stage(next) => {
                if let RequestState::Loading { stage, .. } = &mut self.state {
                    *stage = next;
                }
            }
            LookupEventKind::Finished(outcome) => self.finish(outcome),
        }

        true
    }

    pub fn finish(&mut self, outcome: Result<WeatherReport, LookupError>) {
        self.active_seq = None;
        self.state = match outcome {
            Ok(report) => RequestState::Success(report),
            Err(err) => RequestState::Failed { kind: err.kind(), message: err.user_message() },
        };
    }

    pub fn reset(&mut self) {
        self.active_seq = None;
        self.state = RequestState::Idle;
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RequestState::Loading { .. })
    }

    pub fn status_is_error(&self) -> bool {
        matches!(self.state, RequestState::Failed { .. })
    }

    pub fn status_message(&self) -> String {
        match &self.state {
            RequestState::Idle => IDLE_MESSAGE.to_string(),
            RequestState::Loading { place, stage: Stage::Geocoding } => {
                format!("Looking up {place}...")
            }
            RequestState::Loading { .. } => "Fetching weather data...".to_string(),
            RequestState::Success(report) => format!(
                "Last updated: {} | {}",
                report.fetched_at.with_timezone(&Local).format("%H:%M:%S"),
                report.location.short_name()
            ),
            RequestState::Failed { message, .. } => message.clone(),
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_loading() { "Loading..." } else { "Get Weather" }
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        match &self.state {
            RequestState::Success(report) => Some(report),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.report().map(|r| &r.snapshot)
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.state {
            RequestState::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn view(&self) -> DisplayView<'_> {
        DisplayView {
            is_loading: self.is_loading(),
            status_message: self.status_message(),
            status_is_error: self.status_is_error(),
            button_label: self.button_label(),
            error_kind: self.error_kind(),
            report: self.report(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, Units};
    use chrono::Utc;

    fn ticket(seq: u64, place: &str) -> Ticket {
        Ticket { seq, place: PlaceName::parse(place).unwrap() }
    }

    fn report(name: &str) -> WeatherReport {
        WeatherReport {
            location: Coordinates {
                latitude: 51.51,
                longitude: -0.13,
                display_name: format!("{name}, UK"),
            },
            units: Units::Metric,
            snapshot: WeatherSnapshot {
                temperature: Some(15.2),
                humidity: Some(70.0),
                wind_speed: Some(3.1),
                precipitation_intensity: None,
                visibility: None,
                uv_index: None,
                air_quality: None,
                condition_code: 1000,
                condition_label: "clear".into(),
                hourly: vec![],
                daily: vec![],
                alerts: vec![],
            },
            fetched_at: Utc::now(),
        }
    }

    fn finished(seq: u64, outcome: Result<WeatherReport, LookupError>) -> LookupEvent {
        LookupEvent { seq, kind: LookupEventKind::Finished(outcome) }
    }

    #[test]
    fn starts_idle() {
        let display = DisplayStateMachine::new();
        assert!(!display.is_loading());
        assert!(!display.status_is_error());
        assert_eq!(display.status_message(), IDLE_MESSAGE);
        assert_eq!(display.button_label(), "Get Weather");
        assert!(display.snapshot().is_none());
    }

    #[test]
    fn begin_enters_loading() {
        let mut display = DisplayStateMachine::new();
        display.begin(&ticket(1, "London"));

        assert!(display.is_loading());
        assert_eq!(display.button_label(), "Loading...");
        assert_eq!(display.status_message(), "Looking up London...");
    }

    #[test]
    fn stage_events_update_status() {
        let mut display = DisplayStateMachine::new();
        display.begin(&ticket(1, "London"));

        assert!(display.apply(LookupEvent { seq: 1, kind: LookupEventKind::Stage(Stage::Forecasting) }));
        assert!(display.is_loading());
        assert_eq!(display.status_message(), "Fetching weather data...");
    }

    #[test]
    fn success_projects_snapshot() {
        let mut display = DisplayStateMachine::new();
        display.begin(&ticket(1, "London"));
        display.apply(finished(1, Ok(report("London"))));

        assert!(!display.is_loading());
        assert!(!display.status_is_error());
        assert_eq!(display.snapshot().and_then(|s| s.temperature), Some(15.2));
        let status = display.status_message();
        assert!(status.starts_with("Last updated: "));
        assert!(status.ends_with("| London"));
    }

    #[test]
    fn every_failure_is_error_and_not_loading() {
        let failures = [
            LookupError::CityNotFound,
            LookupError::Network("down".into()),
            LookupError::RateLimited,
            LookupError::MalformedPayload("bad".into()),
            LookupError::Unknown("boom".into()),
        ];

        for err in failures {
            let mut display = DisplayStateMachine::new();
            display.begin(&ticket(1, "London"));
            display.apply(finished(1, Err(err.clone())));

            assert!(display.status_is_error(), "{err:?}");
            assert!(!display.is_loading(), "{err:?}");
            assert_eq!(display.status_message(), err.user_message());
            assert_eq!(display.error_kind(), Some(err.kind()));
        }
    }

    #[test]
    fn stale_events_are_dropped() {
        let mut display = DisplayStateMachine::new();
        display.begin(&ticket(1, "A"));
        display.begin(&ticket(2, "B"));

        assert!(display.apply(finished(2, Ok(report("B")))));
        assert!(!display.apply(finished(1, Ok(report("A")))));

        let shown = display.report().unwrap();
        assert_eq!(shown.location.short_name(), "B");
    }

    #[test]
    fn stale_failure_cannot_overwrite_loading() {
        let mut display = DisplayStateMachine::new();
        display.begin(&ticket(1, "A"));
        display.begin(&ticket(2, "B"));

        assert!(!display.apply(finished(1, Err(LookupError::CityNotFound))));
        assert!(display.is_loading());
    }

    #[test]
    fn events_after_finish_are_ignored() {
        let mut display = DisplayStateMachine::new();
        display.begin(&ticket(1, "A"));
        display.apply(finished(1, Ok(report("A"))));

        assert!(!display.apply(LookupEvent { seq: 1, kind: LookupEventKind::Stage(Stage::Forecasting) }));
        assert!(!display.is_loading());
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut display = DisplayStateMachine::completed(Err(LookupError::RateLimited));
        assert!(display.status_is_error());

        display.reset();
        assert_eq!(display.state(), &RequestState::Idle);
    }

    #[test]
    fn view_serializes() {
        let display = DisplayStateMachine::completed(Err(LookupError::CityNotFound));
        let json = serde_json::to_value(display.view()).unwrap();

        assert_eq!(json["status_is_error"], true);
        assert_eq!(json["error_kind"], "city_not_found");
        assert_eq!(json["status_message"], "City not found. Try again.");
        assert!(json.get("report").is_none());
    }
}
