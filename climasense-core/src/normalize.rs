//! Turns a raw forecast body into a [`WeatherSnapshot`].
//!
//! This is the only place that knows the provider's JSON shape. The payload
//! is deserialized into typed structs in one step. Only a missing top-level
//! timeline is a [`NormalizeError`]; inside an entry, missing or `null`
//! pieces are absent and timestamps that do not parse are kept as given.
//!
//! "Current" conditions come from the first *minutely* entry, while the
//! hourly and daily lists come from their own timelines. The two can disagree
//! slightly and are kept as reported.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer};

use crate::{
    condition::{DEFAULT_CONDITION_CODE, condition_label},
    error::NormalizeError,
    forecast::RawForecastPayload,
    model::{Alert, DayPoint, HourPoint, Severity, WeatherSnapshot},
};

pub const MAX_HOURLY: usize = 12;
pub const MAX_DAILY: usize = 7;

const DEFAULT_ALERT_EVENT: &str = "Weather Alert";

#[derive(Debug, Deserialize)]
struct TmPayload {
    timelines: TmTimelines,
    #[serde(default)]
    alerts: Option<Vec<TmAlert>>,
}

#[derive(Debug, Deserialize)]
struct TmTimelines {
    minutely: Vec<TmMinute>,
    hourly: Vec<TmHour>,
    daily: Vec<TmDay>,
}

#[derive(Debug, Deserialize)]
struct TmMinute {
    #[serde(default)]
    values: Option<TmPointValues>,
}

#[derive(Debug, Deserialize)]
struct TmHour {
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    values: Option<TmPointValues>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TmPointValues {
    temperature: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    precipitation_intensity: Option<f64>,
    visibility: Option<f64>,
    uv_index: Option<f64>,
    epa_index: Option<f64>,
    aqi: Option<f64>,
    weather_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TmDay {
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    values: Option<TmDayValues>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TmDayValues {
    temperature_max: Option<f64>,
    temperature_min: Option<f64>,
    /// Outer `None` when the key is missing, `Some(None)` when it is `null`.
    #[serde(default, deserialize_with = "present")]
    precipitation_intensity_avg: Option<Option<f64>>,
    precipitation_probability_avg: Option<f64>,
    sunrise_time: Option<String>,
    sunset_time: Option<String>,
    weather_code_max: Option<i64>,
    weather_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TmAlert {
    event: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// Parse and reshape a forecast payload. Pure; same input, same output.
pub fn normalize(payload: &RawForecastPayload) -> Result<WeatherSnapshot, NormalizeError> {
    let parsed: TmPayload =
        serde_json::from_str(payload.as_str()).map_err(|e| NormalizeError(e.to_string()))?;

    let current =
        parsed.timelines.minutely.into_iter().next().and_then(|m| m.values).unwrap_or_default();
    let condition_code = current.weather_code.unwrap_or(DEFAULT_CONDITION_CODE);

    let hourly = parsed.timelines.hourly.into_iter().take(MAX_HOURLY).map(hour_point).collect();
    let daily = parsed.timelines.daily.into_iter().take(MAX_DAILY).map(day_point).collect();
    let alerts = parsed.alerts.unwrap_or_default().into_iter().map(alert).collect();

    Ok(WeatherSnapshot {
        temperature: current.temperature,
        humidity: current.humidity,
        wind_speed: current.wind_speed,
        precipitation_intensity: current.precipitation_intensity,
        visibility: current.visibility,
        uv_index: current.uv_index,
        air_quality: current.epa_index.or(current.aqi),
        condition_code,
        condition_label: condition_label(condition_code).to_string(),
        hourly,
        daily,
        alerts,
    })
}

fn hour_point(entry: TmHour) -> HourPoint {
    let values = entry.values.unwrap_or_default();
    let code = values.weather_code.unwrap_or(DEFAULT_CONDITION_CODE);
    HourPoint {
        time_of_day: entry.time.as_deref().map(clock_time),
        temperature: values.temperature,
        wind_speed: values.wind_speed,
        humidity: values.humidity,
        condition_label: condition_label(code).to_string(),
    }
}

fn day_point(entry: TmDay) -> DayPoint {
    let v = entry.values.unwrap_or_default();
    let code = v.weather_code_max.or(v.weather_code).unwrap_or(DEFAULT_CONDITION_CODE);
    // A present-but-null intensity does not fall back to the probability.
    let precipitation = match v.precipitation_intensity_avg {
        Some(intensity) => intensity,
        None => v.precipitation_probability_avg,
    };
    DayPoint {
        weekday_name: entry.time.as_deref().and_then(weekday),
        high: v.temperature_max,
        low: v.temperature_min,
        precipitation,
        sunrise: v.sunrise_time.as_deref().map(clock_time),
        sunset: v.sunset_time.as_deref().map(clock_time),
        condition_label: condition_label(code).to_string(),
    }
}

fn alert(raw: TmAlert) -> Alert {
    Alert {
        event: raw.event.unwrap_or_else(|| DEFAULT_ALERT_EVENT.to_string()),
        description: raw.description.unwrap_or_default(),
        severity: raw.severity.as_deref().map(Severity::parse).unwrap_or(Severity::Unknown),
        start_time: raw.start_time,
        end_time: raw.end_time,
    }
}

fn timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

/// "HH:MM" in the timestamp's own offset; anything else is returned as given.
fn clock_time(raw: &str) -> String {
    match timestamp(raw) {
        Some(t) => t.format("%H:%M").to_string(),
        None => {
            tracing::debug!(raw, "time is not RFC 3339, keeping raw value");
            raw.to_string()
        }
    }
}

/// Abbreviated weekday from a full timestamp or a leading "YYYY-MM-DD".
fn weekday(raw: &str) -> Option<String> {
    if let Some(t) = timestamp(raw) {
        return Some(t.format("%a").to_string());
    }
    let date = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(|d| d.format("%a").to_string())
}
