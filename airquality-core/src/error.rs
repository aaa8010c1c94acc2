use thiserror::Error;

/// Failure of a single upstream provider call. Never surfaced to clients as
/// a fault: it is folded into a failed reading carrying `to_string()`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Missing OPENWEATHER_API_KEY")]
    MissingApiKey,

    #[error("OpenWeather air list empty")]
    EmptyAirList,

    #[error("No hourly data")]
    NoHourlyData,

    #[error("{endpoint} request failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid lat/lon")]
pub struct InvalidCoordinate;
