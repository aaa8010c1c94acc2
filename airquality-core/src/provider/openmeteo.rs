use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{AqiLabel, Components, Coordinate, Reading, Source, SourceDetail},
};

use super::{AirQualityProvider, get_json};

const HOURLY_FIELDS: &str =
    "us_aqi,pm2_5,pm10,ozone,nitrogen_dioxide,sulphur_dioxide,carbon_monoxide";

/// Fallback provider: Open-Meteo hourly air quality, no key needed.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: String, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl AirQualityProvider for OpenMeteoProvider {
    fn source(&self) -> Source {
        Source::OpenMeteo
    }

    async fn fetch(&self, coord: Coordinate) -> Result<Reading, ProviderError> {
        let url = format!("{}/v1/air-quality", self.base_url);
        let query = [
            ("latitude", coord.lat.to_string()),
            ("longitude", coord.lon.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
        ];

        let parsed: OmResponse =
            get_json(&self.http, "Open-Meteo air quality", &url, &query).await?;

        latest(parsed.hourly).ok_or(ProviderError::NoHourlyData)
    }
}

/// Build a reading from the last sample of the hourly series.
fn latest(hourly: OmHourly) -> Option<Reading> {
    let idx = hourly.time.len().checked_sub(1)?;
    let at = |series: &[Option<f64>]| series.get(idx).copied().flatten();

    let aqi = at(&hourly.us_aqi).map(|v| v.round() as i64);

    Some(Reading {
        detail: SourceDetail::OpenMeteo,
        aqi,
        aqi_label: AqiLabel::from_us_aqi(aqi),
        components: Components {
            pm2_5: at(&hourly.pm2_5),
            pm10: at(&hourly.pm10),
            o3: at(&hourly.ozone),
            no2: at(&hourly.nitrogen_dioxide),
            so2: at(&hourly.sulphur_dioxide),
            co: at(&hourly.carbon_monoxide),
        },
        timestamp: hourly.time.into_iter().nth(idx),
    })
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    #[serde(default)]
    hourly: OmHourly,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmHourly {
    time: Vec<String>,
    us_aqi: Vec<Option<f64>>,
    pm2_5: Vec<Option<f64>>,
    pm10: Vec<Option<f64>>,
    ozone: Vec<Option<f64>>,
    nitrogen_dioxide: Vec<Option<f64>>,
    sulphur_dioxide: Vec<Option<f64>>,
    carbon_monoxide: Vec<Option<f64>>,
}
