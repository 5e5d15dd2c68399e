//! Measurement providers: the two upstream air-quality APIs.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{AirQualityData, Coordinates, Measurement};

pub mod open_meteo;
pub mod openweather;

pub use open_meteo::OpenMeteoProvider;
pub use openweather::OpenWeatherProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider is not configured")]
    NotConfigured,

    #[error("HTTP {status} from {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// A source of pollutant readings for a coordinate. An empty measurement list
/// is a valid answer, distinct from an error.
#[async_trait]
pub trait MeasurementProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_current(&self, at: Coordinates) -> Result<AirQualityData, ProviderError>;

    async fn fetch_extremes(&self, at: Coordinates) -> Result<Vec<Measurement>, ProviderError>;
}
