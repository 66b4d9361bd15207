//! Forecast fetching from the Tomorrow.io v4 forecast endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;

use crate::{
    config::ApiConfig,
    error::ForecastError,
    http::{build_client, truncate_body},
    model::{Coordinates, Units},
};

/// Unparsed forecast response body. Shape checks happen in [`crate::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForecastPayload {
    body: String,
}

impl RawForecastPayload {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }
}

impl From<serde_json::Value> for RawForecastPayload {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value.to_string())
    }
}

#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    /// Single attempt; no retry or backoff.
    async fn fetch(
        &self,
        coords: &Coordinates,
        units: Units,
    ) -> Result<RawForecastPayload, ForecastError>;
}

#[derive(Debug, Clone)]
pub struct ForecastClient {
    endpoint: String,
    api_key: String,
    http: Client,
}

impl ForecastClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ForecastError> {
        Ok(Self {
            endpoint: config.forecast_url.clone(),
            api_key: config.api_key.clone(),
            http: build_client(config)?,
        })
    }
}

pub(crate) fn location_param(coords: &Coordinates) -> String {
    format!("{},{}", coords.latitude, coords.longitude)
}

#[async_trait]
impl ForecastSource for ForecastClient {
    async fn fetch(
        &self,
        coords: &Coordinates,
        units: Units,
    ) -> Result<RawForecastPayload, ForecastError> {
        let location = location_param(coords);
        tracing::debug!(%location, %units, "fetching forecast");

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("location", location.as_str()),
                ("apikey", self.api_key.as_str()),
                ("units", units.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(%location, "forecast provider rate limit hit");
            return Err(ForecastError::RateLimited);
        }

        let body = res.text().await?;

        if !status.is_success() {
            return Err(ForecastError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(RawForecastPayload::new(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_lat_comma_lon() {
        let coords = Coordinates { latitude: 51.51, longitude: -0.13, display_name: "London".into() };
        assert_eq!(location_param(&coords), "51.51,-0.13");
    }

    #[test]
    fn payload_from_json_value() {
        let payload = RawForecastPayload::from(serde_json::json!({"timelines": {}}));
        assert_eq!(payload.as_str(), r#"{"timelines":{}}"#);
    }
}
