//! Forward geocoding: free-text place name to coordinates.
//! Uses Nominatim (OpenStreetMap), which requires an identifying user agent.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{
    config::ApiConfig,
    error::GeocodeError,
    http::{build_client, truncate_body},
    model::Coordinates,
};

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Resolve a non-empty place name to the provider's best match.
    async fn resolve(&self, place_name: &str) -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    endpoint: String,
    http: Client,
}

impl GeocodeClient {
    pub fn new(config: &ApiConfig) -> Result<Self, GeocodeError> {
        Ok(Self {
            endpoint: config.geocode_url.clone(),
            http: build_client(config)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimMatch {
    lat: String,
    lon: String,
    display_name: String,
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn resolve(&self, place_name: &str) -> Result<Coordinates, GeocodeError> {
        tracing::debug!(place = place_name, "geocoding");

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("q", place_name), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        parse_first_match(place_name, &body)
    }
}

fn parse_first_match(place_name: &str, body: &str) -> Result<Coordinates, GeocodeError> {
    let matches: Vec<NominatimMatch> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;

    // Ranked list; the first entry wins.
    let best = matches
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NotFound(place_name.to_string()))?;

    let latitude = parse_degrees("lat", &best.lat)?;
    let longitude = parse_degrees("lon", &best.lon)?;

    tracing::info!(place = place_name, resolved = %best.display_name, "geocoded");

    Ok(Coordinates { latitude, longitude, display_name: best.display_name })
}

fn parse_degrees(field: &str, raw: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| GeocodeError::Malformed(format!("{field} is not a number: '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        let body = r#"[
            {"lat": "51.51", "lon": "-0.13", "display_name": "London, UK"},
            {"lat": "42.98", "lon": "-81.25", "display_name": "London, Ontario, Canada"}
        ]"#;

        let coords = parse_first_match("London", body).unwrap();
        assert_eq!(coords.latitude, 51.51);
        assert_eq!(coords.longitude, -0.13);
        assert_eq!(coords.display_name, "London, UK");
    }

    #[test]
    fn empty_list_is_not_found() {
        let err = parse_first_match("Atlantis", "[]").unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(ref p) if p == "Atlantis"));
    }

    #[test]
    fn non_numeric_lat_is_malformed() {
        let body = r#"[{"lat": "north", "lon": "0", "display_name": "X"}]"#;
        let err = parse_first_match("X", body).unwrap_err();
        assert!(matches!(err, GeocodeError::Malformed(_)));
    }

    #[test]
    fn non_array_body_is_malformed() {
        let err = parse_first_match("X", r#"{"error": "bad"}"#).unwrap_err();
        assert!(matches!(err, GeocodeError::Malformed(_)));
    }
}
