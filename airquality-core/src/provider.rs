use crate::{
    Config,
    error::ProviderError,
    model::{AirQualityReading, Coordinate, Reading, Source},
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{fmt::Debug, sync::Arc};

pub mod openmeteo;
pub mod openweather;

#[async_trait]
pub trait AirQualityProvider: Send + Sync + Debug {
    fn source(&self) -> Source;

    async fn fetch(&self, coord: Coordinate) -> Result<Reading, ProviderError>;

    /// Like [`fetch`](Self::fetch), but folds any failure into a failed reading.
    async fn reading(&self, coord: Coordinate) -> AirQualityReading {
        match self.fetch(coord).await {
            Ok(reading) => AirQualityReading::Ok(reading),
            Err(err) => {
                tracing::warn!(source = %self.source(), lat = coord.lat, lon = coord.lon, "{err}");
                AirQualityReading::failed(err.to_string())
            }
        }
    }
}

/// The primary and fallback providers, in consultation order.
#[derive(Debug, Clone)]
pub struct Providers {
    pub primary: Arc<dyn AirQualityProvider>,
    pub fallback: Arc<dyn AirQualityProvider>,
}

impl Providers {
    /// Build both providers over one HTTP client carrying the configured timeout.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            primary: Arc::new(OpenWeatherProvider::new(
                config.openweather_api_key().map(str::to_owned),
                config.openweather_base_url.clone(),
                http.clone(),
            )),
            fallback: Arc::new(OpenMeteoProvider::new(config.open_meteo_base_url.clone(), http)),
        })
    }
}

/// GET `url` and decode a 2xx JSON body, classifying every failure.
async fn get_json<T: DeserializeOwned>(
    http: &Client,
    endpoint: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, ProviderError> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| ProviderError::Request { endpoint, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| ProviderError::Request { endpoint, source })?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            endpoint,
            status,
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| ProviderError::Decode { endpoint, source })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
