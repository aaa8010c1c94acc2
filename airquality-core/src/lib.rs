//! Core library for the air-quality aggregator.
//!
//! This crate defines:
//! - Configuration loading (file + environment)
//! - The normalized reading model shared by every provider
//! - Provider adapters for OpenWeather (primary) and Open-Meteo (fallback)
//! - The primary-then-fallback aggregation
//!
//! It is used by `airquality-server`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use aggregate::aggregate;
pub use config::Config;
pub use error::{InvalidCoordinate, ProviderError};
pub use model::{AirQualityReading, AqiLabel, Coordinate, Reading, Source};
pub use provider::{AirQualityProvider, Providers};
