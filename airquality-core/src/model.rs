use serde::{Serialize, Serializer};

use crate::error::InvalidCoordinate;

/// Geographic point a reading is requested for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse optional textual lat/lon, taking the matching component of
    /// `default` for whichever one is absent.
    pub fn parse(
        lat: Option<&str>,
        lon: Option<&str>,
        default: Coordinate,
    ) -> Result<Self, InvalidCoordinate> {
        let lat = lat.map(parse_component).transpose()?.unwrap_or(default.lat);
        let lon = lon.map(parse_component).transpose()?.unwrap_or(default.lon);

        Ok(Self { lat, lon })
    }
}

fn parse_component(raw: &str) -> Result<f64, InvalidCoordinate> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(InvalidCoordinate)
}

/// Upstream that produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    #[serde(rename = "openweather")]
    OpenWeather,
    #[serde(rename = "open-meteo")]
    OpenMeteo,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::OpenWeather => "openweather",
            Source::OpenMeteo => "open-meteo",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiLabel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    Unknown,
}

impl AqiLabel {
    /// OpenWeather reports a categorical 1..=5 index.
    pub fn from_openweather_index(aqi: Option<i64>) -> Self {
        match aqi {
            Some(1) => AqiLabel::Good,
            Some(2) => AqiLabel::Fair,
            Some(3) => AqiLabel::Moderate,
            Some(4) => AqiLabel::Poor,
            Some(5) => AqiLabel::VeryPoor,
            _ => AqiLabel::Unknown,
        }
    }

    /// US AQI buckets, each inclusive at its upper bound.
    pub fn from_us_aqi(aqi: Option<i64>) -> Self {
        match aqi {
            None => AqiLabel::Unknown,
            Some(v) if v <= 50 => AqiLabel::Good,
            Some(v) if v <= 100 => AqiLabel::Fair,
            Some(v) if v <= 150 => AqiLabel::Moderate,
            Some(v) if v <= 200 => AqiLabel::Poor,
            Some(_) => AqiLabel::VeryPoor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiLabel::Good => "Good",
            AqiLabel::Fair => "Fair",
            AqiLabel::Moderate => "Moderate",
            AqiLabel::Poor => "Poor",
            AqiLabel::VeryPoor => "Very Poor",
            AqiLabel::Unknown => "Unknown",
        }
    }
}

impl Serialize for AqiLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Pollutant concentrations in µg/m³.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Components {
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub id: Option<i64>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Current conditions as reported alongside the OpenWeather air sample.
/// Epoch fields are seconds since the Unix epoch, `timezone_offset` is
/// seconds east of UTC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub observed_at: Option<i64>,
    pub timezone_offset: Option<i64>,
    pub temp_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub wind_kmh: Option<f64>,
    pub wind_deg: Option<f64>,
    pub clouds: Option<f64>,
    pub conditions: Vec<Condition>,
}

/// Reduced view for compact display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sidebar {
    pub temp_c: Option<f64>,
    pub wind_kmh: Option<f64>,
    pub city: Option<String>,
}

/// Source-specific part of a reading; the variant is emitted as `source`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source")]
pub enum SourceDetail {
    #[serde(rename = "openweather")]
    OpenWeather {
        weather: Box<WeatherSnapshot>,
        sidebar: Sidebar,
    },
    #[serde(rename = "open-meteo")]
    OpenMeteo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    #[serde(flatten)]
    pub detail: SourceDetail,
    pub aqi: Option<i64>,
    pub aqi_label: AqiLabel,
    pub components: Components,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Reading {
    pub fn source(&self) -> Source {
        match self.detail {
            SourceDetail::OpenWeather { .. } => Source::OpenWeather,
            SourceDetail::OpenMeteo => Source::OpenMeteo,
        }
    }
}

/// Normalized payload returned to clients.
#[derive(Debug, Clone, PartialEq)]
pub enum AirQualityReading {
    Ok(Reading),
    Failed { error: String },
}

impl AirQualityReading {
    pub fn failed(error: impl Into<String>) -> Self {
        AirQualityReading::Failed { error: error.into() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AirQualityReading::Ok(_))
    }

    pub fn source(&self) -> Option<Source> {
        match self {
            AirQualityReading::Ok(reading) => Some(reading.source()),
            AirQualityReading::Failed { .. } => None,
        }
    }
}

impl Serialize for AirQualityReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct WithOk<'a, T: Serialize> {
            ok: bool,
            #[serde(flatten)]
            body: &'a T,
        }

        #[derive(Serialize)]
        struct Failure<'a> {
            error: &'a str,
        }

        match self {
            AirQualityReading::Ok(reading) => WithOk {
                ok: true,
                body: reading,
            }
            .serialize(serializer),
            AirQualityReading::Failed { error } => WithOk {
                ok: false,
                body: &Failure { error },
            }
            .serialize(serializer),
        }
    }
}

/// Meters per second to kilometers per hour, rounded to one decimal.
pub fn kmh_from_mps(mps: f64) -> f64 {
    (mps * 3.6 * 10.0).round() / 10.0
}
