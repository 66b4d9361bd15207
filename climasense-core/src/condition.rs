//! Provider weather codes and their labels.

/// Code assumed when a timeline entry carries no `weatherCode`.
pub const DEFAULT_CONDITION_CODE: i64 = 1000;

const FALLBACK_LABEL: &str = "clear";

/// Map a provider weather code to a lower-case label.
///
/// Unmapped codes fall back to "clear" rather than failing.
pub fn condition_label(code: i64) -> &'static str {
    match code {
        1000 => "clear",
        1100 => "mostly clear",
        1101 => "partly cloudy",
        1102 => "mostly cloudy",
        1001 => "cloudy",
        2000 => "fog",
        2100 => "light fog",
        4000 => "drizzle",
        4001 => "rain",
        4200 => "light rain",
        4201 => "heavy rain",
        5000 => "snow",
        5001 => "flurries",
        5100 => "light snow",
        5101 => "heavy snow",
        6000 => "freezing drizzle",
        6001 => "freezing rain",
        6200 => "light freezing rain",
        6201 => "heavy freezing rain",
        7000 => "ice pellets",
        7101 => "heavy ice pellets",
        7102 => "light ice pellets",
        8000 => "thunderstorm",
        _ => FALLBACK_LABEL,
    }
}
