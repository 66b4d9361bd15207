use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::UnknownUnits;

/// Unit system requested from the forecast provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    pub fn precipitation_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "mm/h",
            Units::Imperial => "in/h",
        }
    }

    pub fn visibility_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "km",
            Units::Imperial => "mi",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = UnknownUnits;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(UnknownUnits(value.to_string())),
        }
    }
}

/// A resolved place. Lives for a single lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

impl Coordinates {
    /// First comma-separated segment of the display name, e.g. "London".
    pub fn short_name(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.display_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourPoint {
    /// "HH:MM" in the offset the provider reported, or the provider's raw
    /// string when it is not a timestamp.
    pub time_of_day: Option<String>,
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<f64>,
    pub condition_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPoint {
    pub weekday_name: Option<String>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub precipitation: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub condition_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
    Extreme,
    Unknown,
}

impl Severity {
    /// Case-insensitive; anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "minor" => Severity::Minor,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            "extreme" => Severity::Extreme,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Extreme => "extreme",
            Severity::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub event: String,
    pub description: String,
    pub severity: Severity,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Renderer-facing view of one forecast response.
///
/// Numeric fields are `None` when the provider omitted them; formatting
/// placeholders belong to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub precipitation_intensity: Option<f64>,
    pub visibility: Option<f64>,
    pub uv_index: Option<f64>,
    /// EPA air quality index when reported, otherwise the generic AQI.
    pub air_quality: Option<f64>,
    pub condition_code: i64,
    pub condition_label: String,
    pub hourly: Vec<HourPoint>,
    pub daily: Vec<DayPoint>,
    pub alerts: Vec<Alert>,
}

/// Successful outcome of one lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: Coordinates,
    pub units: Units,
    pub snapshot: WeatherSnapshot,
    pub fetched_at: DateTime<Utc>,
}
