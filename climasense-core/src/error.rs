//! Error types for each lookup stage and the user-facing taxonomy they fold into.

use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
#[error("Unknown unit system '{0}'. Supported: metric, imperial.")]
pub struct UnknownUnits(pub String);

/// Input rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Please enter a city name.")]
    EmptyPlace,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("No place matched '{0}'")]
    NotFound(String),

    #[error("Geocoding request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Geocoding request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Geocoding response was malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Forecast request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Forecast request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Forecast provider rate limit exceeded")]
    RateLimited,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed forecast payload: {0}")]
pub struct NormalizeError(pub String);

/// Coarse classification of a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CityNotFound,
    Network,
    RateLimited,
    MalformedPayload,
    Unknown,
}

/// Every way a lookup can end without a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("city not found")]
    CityNotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by forecast provider")]
    RateLimited,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::CityNotFound => ErrorKind::CityNotFound,
            LookupError::Network(_) => ErrorKind::Network,
            LookupError::RateLimited => ErrorKind::RateLimited,
            LookupError::MalformedPayload(_) => ErrorKind::MalformedPayload,
            LookupError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Single-line status text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::CityNotFound => "City not found. Try again.".to_string(),
            LookupError::Network(_) => {
                "Network error. Please check your internet connection.".to_string()
            }
            LookupError::RateLimited => {
                "API rate limit exceeded. Please wait a few minutes and try again.".to_string()
            }
            LookupError::MalformedPayload(detail) => {
                format!("Error parsing weather data: {detail}")
            }
            LookupError::Unknown(message) => format!("An error occurred: {message}"),
        }
    }
}

impl From<GeocodeError> for LookupError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound(_) => LookupError::CityNotFound,
            GeocodeError::Network(_) | GeocodeError::Status { .. } => {
                LookupError::Network(err.to_string())
            }
            GeocodeError::Malformed(detail) => LookupError::MalformedPayload(detail),
        }
    }
}

impl From<ForecastError> for LookupError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::RateLimited => LookupError::RateLimited,
            ForecastError::Network(_) | ForecastError::Status { .. } => {
                LookupError::Network(err.to_string())
            }
        }
    }
}

impl From<NormalizeError> for LookupError {
    fn from(err: NormalizeError) -> Self {
        LookupError::MalformedPayload(err.0)
    }
}

impl From<JoinError> for LookupError {
    fn from(err: JoinError) -> Self {
        if !err.is_panic() {
            return LookupError::Unknown("lookup task was cancelled".to_string());
        }

        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "lookup task panicked".to_string());

        LookupError::Unknown(message)
    }
}
