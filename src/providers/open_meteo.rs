//! Open-Meteo air-quality API. No credential; used as the fallback for
//! current readings and as the only source of 30-day extremes.
//!
//! Response shape: `{"hourly": {"time": [...], "<param>": [...]}, "hourly_units": {...}}`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::aggregate::HourlySeries;
use crate::constants::{
    CURRENT_LOOKBACK_HOURS, EXTREMES_WINDOW_DAYS, OPEN_METEO_HOURLY_PARAMETERS,
    OPEN_METEO_SOURCE_NAME,
};
use crate::http_client::fetch_json;
use crate::providers::{MeasurementProvider, ProviderError};
use crate::types::{AirQualityData, Coordinates, Measurement};

#[derive(Debug, Default, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    hourly: Option<Map<String, Value>>,
    #[serde(default)]
    hourly_units: Option<Map<String, Value>>,
}

impl OpenMeteoResponse {
    fn into_series(self) -> HourlySeries {
        match self.hourly.as_ref() {
            Some(hourly) => HourlySeries::from_hourly_json(hourly, self.hourly_units.as_ref()),
            None => HourlySeries::default(),
        }
    }
}

pub struct OpenMeteoProvider {
    http: Client,
    base_url: String,
}

impl OpenMeteoProvider {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    async fn fetch_series(&self, url: &str) -> Result<HourlySeries, ProviderError> {
        let payload: OpenMeteoResponse = fetch_json(&self.http, url).await?;
        Ok(payload.into_series())
    }
}

#[async_trait]
impl MeasurementProvider for OpenMeteoProvider {
    fn name(&self) -> &'static str {
        OPEN_METEO_SOURCE_NAME
    }

    async fn fetch_current(&self, at: Coordinates) -> Result<AirQualityData, ProviderError> {
        let url = build_current_url(&self.base_url, at, Utc::now());
        let series = self.fetch_series(&url).await?;
        debug!(
            "Open-Meteo current: {} hours, latest valid {:?}",
            series.len(),
            series.latest_valid_time()
        );
        Ok(AirQualityData::new(
            OPEN_METEO_SOURCE_NAME,
            series.current_snapshot(),
        ))
    }

    async fn fetch_extremes(&self, at: Coordinates) -> Result<Vec<Measurement>, ProviderError> {
        let url = build_extremes_url(&self.base_url, at, Utc::now());
        let series = self.fetch_series(&url).await?;
        debug!("Open-Meteo extremes: {} hours", series.len());
        Ok(series.extremes())
    }
}

const HOUR_FORMAT: &str = "%Y-%m-%dT%H:00";

fn hourly_param() -> String {
    OPEN_METEO_HOURLY_PARAMETERS.join(",")
}

/// Trailing window of hourly readings ending at the current hour.
pub fn build_current_url(base_url: &str, at: Coordinates, now: DateTime<Utc>) -> String {
    build_window_url(base_url, at, now - Duration::hours(CURRENT_LOOKBACK_HOURS), now)
}

/// Same hourly bounds as the current window, stretched back 30 days. Hours
/// after `now` are forecasts and stay outside the window.
pub fn build_extremes_url(base_url: &str, at: Coordinates, now: DateTime<Utc>) -> String {
    build_window_url(base_url, at, now - Duration::days(EXTREMES_WINDOW_DAYS), now)
}

fn build_window_url(
    base_url: &str,
    at: Coordinates,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    format!(
        "{base_url}/v1/air-quality?latitude={:.4}&longitude={:.4}&hourly={}&timezone=GMT&start_hour={}&end_hour={}",
        at.lat,
        at.lon,
        hourly_param(),
        urlencoding::encode(&start.format(HOUR_FORMAT).to_string()),
        urlencoding::encode(&end.format(HOUR_FORMAT).to_string()),
    )
}
