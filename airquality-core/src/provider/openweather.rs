use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{
        AqiLabel, Components, Condition, Coordinate, Location, Reading, Sidebar, Source,
        SourceDetail, WeatherSnapshot, kmh_from_mps,
    },
};

use super::{AirQualityProvider, get_json};

/// Primary provider: OpenWeather air pollution plus current weather.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn query(&self, api_key: &str, coord: Coordinate) -> Vec<(&'static str, String)> {
        vec![
            ("lat", coord.lat.to_string()),
            ("lon", coord.lon.to_string()),
            ("appid", api_key.to_string()),
        ]
    }

    async fn fetch_air(
        &self,
        api_key: &str,
        coord: Coordinate,
    ) -> Result<OwAirResponse, ProviderError> {
        let url = format!("{}/data/2.5/air_pollution", self.base_url);
        get_json(&self.http, "OpenWeather air pollution", &url, &self.query(api_key, coord)).await
    }

    async fn fetch_weather(
        &self,
        api_key: &str,
        coord: Coordinate,
    ) -> Result<OwWeatherResponse, ProviderError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let mut query = self.query(api_key, coord);
        query.push(("units", "metric".to_string()));

        get_json(&self.http, "OpenWeather weather", &url, &query).await
    }
}

#[async_trait]
impl AirQualityProvider for OpenWeatherProvider {
    fn source(&self) -> Source {
        Source::OpenWeather
    }

    async fn fetch(&self, coord: Coordinate) -> Result<Reading, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;

        let air = self.fetch_air(api_key, coord).await?;
        let sample = air.list.into_iter().next().ok_or(ProviderError::EmptyAirList)?;

        let weather = self.fetch_weather(api_key, coord).await?;

        Ok(merge(sample, weather))
    }
}

fn merge(sample: OwAirSample, weather: OwWeatherResponse) -> Reading {
    let aqi = sample.main.aqi;
    let c = sample.components;
    let wind_kmh = weather.wind.speed.map(kmh_from_mps);

    let sidebar = Sidebar {
        temp_c: weather.main.temp,
        wind_kmh,
        city: weather.name.clone(),
    };

    let snapshot = WeatherSnapshot {
        location: Location {
            id: weather.id,
            name: weather.name,
            lat: weather.coord.lat,
            lon: weather.coord.lon,
            country: weather.sys.country,
        },
        sunrise: weather.sys.sunrise,
        sunset: weather.sys.sunset,
        observed_at: weather.dt,
        timezone_offset: weather.timezone,
        temp_c: weather.main.temp,
        feels_like_c: weather.main.feels_like,
        temp_min_c: weather.main.temp_min,
        temp_max_c: weather.main.temp_max,
        humidity: weather.main.humidity,
        pressure: weather.main.pressure,
        visibility: weather.visibility,
        wind_kmh,
        wind_deg: weather.wind.deg,
        clouds: weather.clouds.all,
        conditions: weather
            .weather
            .into_iter()
            .map(|w| Condition {
                id: w.id,
                main: w.main,
                description: w.description,
                icon: w.icon,
            })
            .collect(),
    };

    Reading {
        detail: SourceDetail::OpenWeather {
            weather: Box::new(snapshot),
            sidebar,
        },
        aqi,
        aqi_label: AqiLabel::from_openweather_index(aqi),
        components: Components {
            pm2_5: c.pm2_5,
            pm10: c.pm10,
            o3: c.o3,
            no2: c.no2,
            so2: c.so2,
            co: c.co,
        },
        timestamp: sample.dt.and_then(unix_to_rfc3339),
    }
}

fn unix_to_rfc3339(ts: i64) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    #[serde(default)]
    list: Vec<OwAirSample>,
}

#[derive(Debug, Deserialize)]
struct OwAirSample {
    #[serde(default)]
    dt: Option<i64>,
    #[serde(default)]
    main: OwAirMain,
    #[serde(default)]
    components: OwComponents,
}

#[derive(Debug, Default, Deserialize)]
struct OwAirMain {
    aqi: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwComponents {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    o3: Option<f64>,
    no2: Option<f64>,
    so2: Option<f64>,
    co: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeatherResponse {
    id: Option<i64>,
    name: Option<String>,
    dt: Option<i64>,
    timezone: Option<i64>,
    visibility: Option<f64>,
    #[serde(default)]
    coord: OwCoord,
    #[serde(default)]
    sys: OwSys,
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Default, Deserialize)]
struct OwCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    id: Option<i64>,
    main: Option<String>,
    description: Option<String>,
    icon: Option<String>,
}
