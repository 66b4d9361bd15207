//! Best-effort guess of the user's city from their public IP address.
//!
//! Used only to pick a default place when none was typed. Every failure
//! (offline, non-2xx, odd body) is logged and reported as "no guess".

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::config::ApiConfig;

const MAX_LOCATE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Locator: Send + Sync + Debug {
    async fn detect_city(&self) -> Option<String>;
}

/// ipinfo.io style endpoint: `GET` returns a JSON object with a `city` field.
#[derive(Debug, Clone)]
pub struct IpLocateClient {
    endpoint: String,
    http: Client,
}

impl IpLocateClient {
    pub fn new(config: &ApiConfig) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout().min(MAX_LOCATE_TIMEOUT))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { endpoint: config.locate_url.clone(), http })
    }

    async fn fetch_city(&self) -> reqwest::Result<Option<String>> {
        let res = self.http.get(&self.endpoint).send().await?;
        let status = res.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "location lookup rejected");
            return Ok(None);
        }
        let body = res.text().await?;
        Ok(parse_city(&body))
    }
}

#[derive(Debug, Deserialize)]
struct IpInfo {
    city: Option<String>,
}

fn parse_city(body: &str) -> Option<String> {
    let info: IpInfo = serde_json::from_str(body).ok()?;
    info.city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

#[async_trait]
impl Locator for IpLocateClient {
    async fn detect_city(&self) -> Option<String> {
        match self.fetch_city().await {
            Ok(Some(city)) => {
                tracing::info!(%city, "detected location");
                Some(city)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "location lookup failed");
                None
            }
        }
    }
}
