//! Terminal adapters for [`DisplayStateMachine`].

use anyhow::Result;
use chrono::DateTime;
use climasense_core::{Alert, DisplayStateMachine, Render, Units, WeatherReport};
use std::io::Write;

const MISSING: &str = "--";

/// Human-readable output.
pub struct TextRenderer<W> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_report(&mut self, report: &WeatherReport) -> Result<()> {
        let units = report.units;
        let snap = &report.snapshot;

        writeln!(self.out, "{}", report.location.display_name)?;
        writeln!(
            self.out,
            "  {}  {}",
            number(snap.temperature, units.temperature_symbol()),
            capitalize(&snap.condition_label)
        )?;
        writeln!(
            self.out,
            "  Humidity {}   Wind {}",
            percent(snap.humidity),
            number(snap.wind_speed, &format!(" {}", units.wind_symbol()))
        )?;
        writeln!(
            self.out,
            "  Precip {}   Visibility {}   UV {}   AQI {}",
            number(snap.precipitation_intensity, &format!(" {}", units.precipitation_symbol())),
            number(snap.visibility, &format!(" {}", units.visibility_symbol())),
            index(snap.uv_index),
            index(snap.air_quality)
        )?;

        if !snap.hourly.is_empty() {
            writeln!(self.out, "\nHourly")?;
            for hour in &snap.hourly {
                writeln!(
                    self.out,
                    "  {}  {:>8}  {:>10}  {:>5}  {}",
                    hour.time_of_day.as_deref().unwrap_or(MISSING),
                    number(hour.temperature, units.temperature_symbol()),
                    number(hour.wind_speed, &format!(" {}", units.wind_symbol())),
                    percent(hour.humidity),
                    hour.condition_label
                )?;
            }
        }

        if !snap.daily.is_empty() {
            writeln!(self.out, "\n7-Day Forecast")?;
            for day in &snap.daily {
                writeln!(
                    self.out,
                    "  {}  {} / {}  precip {}  sunrise {}  sunset {}  {}",
                    day.weekday_name.as_deref().unwrap_or(MISSING),
                    number(day.high, "°"),
                    number(day.low, "°"),
                    number(day.precipitation, ""),
                    day.sunrise.as_deref().unwrap_or(MISSING),
                    day.sunset.as_deref().unwrap_or(MISSING),
                    day.condition_label
                )?;
            }
        }

        writeln!(self.out)?;
        if snap.alerts.is_empty() {
            writeln!(self.out, "No weather alerts.")?;
        } else {
            writeln!(self.out, "Weather Alerts")?;
            for alert in &snap.alerts {
                writeln!(self.out, "  {}", alert_line(alert))?;
            }
        }
        writeln!(self.out)?;

        Ok(())
    }
}

impl<W: Write> Render for TextRenderer<W> {
    fn render(&mut self, display: &DisplayStateMachine) -> Result<()> {
        if let Some(report) = display.report() {
            self.write_report(report)?;
        }

        let status = display.status_message();
        if display.status_is_error() {
            writeln!(self.out, "error: {status}")?;
        } else if display.is_loading() {
            writeln!(self.out, "[{}] {status}", display.button_label())?;
        } else {
            writeln!(self.out, "{status}")?;
        }

        self.out.flush()?;
        Ok(())
    }
}

/// Machine-readable output: the projected display view as pretty JSON.
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Render for JsonRenderer<W> {
    fn render(&mut self, display: &DisplayStateMachine) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &display.view())?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

fn number(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{suffix}"),
        None => MISSING.to_string(),
    }
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.0}%"),
        None => MISSING.to_string(),
    }
}

fn index(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.0}"),
        None => MISSING.to_string(),
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "HH:MM" when the value is an RFC 3339 timestamp, otherwise as given.
fn short_time(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn alert_line(alert: &Alert) -> String {
    let mut line = format!(
        "[{}] {}: {}",
        alert.severity.as_str().to_uppercase(),
        alert.event,
        alert.description
    );
    if let (Some(start), Some(end)) = (&alert.start_time, &alert.end_time) {
        line.push_str(&format!(" (active {} - {})", short_time(start), short_time(end)));
    }
    line
}

/// Temperature unit label for prompts and help text.
pub fn units_label(units: Units) -> String {
    format!("{units} ({})", units.temperature_symbol())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use climasense_core::{
        Coordinates, DayPoint, HourPoint, LookupError, Severity, WeatherSnapshot,
    };

    fn report(units: Units) -> WeatherReport {
        WeatherReport {
            location: Coordinates {
                latitude: 51.51,
                longitude: -0.13,
                display_name: "London, UK".into(),
            },
            units,
            snapshot: WeatherSnapshot {
                temperature: Some(15.2),
                humidity: None,
                wind_speed: Some(3.1),
                precipitation_intensity: Some(0.4),
                visibility: None,
                uv_index: Some(3.0),
                air_quality: None,
                condition_code: 1101,
                condition_label: "partly cloudy".into(),
                hourly: vec![HourPoint {
                    time_of_day: Some("13:00".into()),
                    temperature: Some(16.0),
                    wind_speed: None,
                    humidity: Some(65.0),
                    condition_label: "clear".into(),
                }],
                daily: vec![DayPoint {
                    weekday_name: Some("Mon".into()),
                    high: Some(20.0),
                    low: Some(10.0),
                    precipitation: None,
                    sunrise: Some("04:43".into()),
                    sunset: None,
                    condition_label: "rain".into(),
                }],
                alerts: vec![],
            },
            fetched_at: Utc::now(),
        }
    }

    fn render_text(display: &DisplayStateMachine) -> String {
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(display).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn text_shows_values_and_placeholders() {
        let out = render_text(&DisplayStateMachine::completed(Ok(report(Units::Metric))));

        assert!(out.contains("London, UK"));
        assert!(out.contains("15.2°C  Partly cloudy"));
        assert!(out.contains("Humidity --"));
        assert!(out.contains("Wind 3.1 m/s"));
        assert!(out.contains("Precip 0.4 mm/h   Visibility --   UV 3   AQI --"));
        assert!(out.contains("13:00"));
        assert!(out.contains("Mon  20.0° / 10.0°  precip --  sunrise 04:43  sunset --"));
        assert!(out.contains("No weather alerts."));
        assert!(out.contains("Last updated: "));
        assert!(!out.contains("error:"));
    }

    #[test]
    fn text_uses_imperial_symbols() {
        let out = render_text(&DisplayStateMachine::completed(Ok(report(Units::Imperial))));
        assert!(out.contains("15.2°F"));
        assert!(out.contains("3.1 mph"));
        assert!(out.contains("Precip 0.4 in/h"));
    }

    #[test]
    fn text_shows_placeholders_for_missing_times() {
        let mut report = report(Units::Metric);
        report.snapshot.hourly[0].time_of_day = None;
        report.snapshot.daily[0].weekday_name = None;
        report.snapshot.visibility = Some(16.0);
        report.snapshot.air_quality = Some(42.0);

        let out = render_text(&DisplayStateMachine::completed(Ok(report)));
        assert!(out.contains("  --    16.0°C"));
        assert!(out.contains("  --  20.0° / 10.0°"));
        assert!(out.contains("Visibility 16.0 km   UV 3   AQI 42"));
    }

    #[test]
    fn text_lists_alerts() {
        let mut report = report(Units::Metric);
        report.snapshot.alerts.push(Alert {
            event: "Flood Warning".into(),
            description: "River levels rising".into(),
            severity: Severity::Severe,
            start_time: Some("2025-06-01T10:00:00Z".into()),
            end_time: Some("2025-06-01T22:00:00Z".into()),
        });

        let out = render_text(&DisplayStateMachine::completed(Ok(report)));
        assert!(out.contains("[SEVERE] Flood Warning: River levels rising (active 10:00 - 22:00)"));
        assert!(!out.contains("No weather alerts."));
    }

    #[test]
    fn text_marks_errors() {
        let out = render_text(&DisplayStateMachine::completed(Err(LookupError::RateLimited)));
        assert_eq!(
            out.trim(),
            "error: API rate limit exceeded. Please wait a few minutes and try again."
        );
    }

    #[test]
    fn json_carries_flags_and_snapshot() {
        let display = DisplayStateMachine::completed(Ok(report(Units::Metric)));
        let mut renderer = JsonRenderer::new(Vec::new());
        renderer.render(&display).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&renderer.into_inner()).unwrap();
        assert_eq!(value["is_loading"], false);
        assert_eq!(value["status_is_error"], false);
        assert_eq!(value["report"]["snapshot"]["temperature"], 15.2);
        assert!(value["report"]["snapshot"]["humidity"].is_null());
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("heavy rain"), "Heavy rain");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn short_time_falls_back_to_raw() {
        assert_eq!(short_time("2025-06-01T10:00:00+02:00"), "10:00");
        assert_eq!(short_time("tonight"), "tonight");
    }
}
