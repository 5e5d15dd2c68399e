//! OpenWeatherMap Air Pollution API. Needs an API key; when one is configured
//! it is asked first for current readings.
//!
//! Response shape: `{"list": [{"dt": 1606147200, "components": {"pm2_5": 1.2, ...}}]}`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::aggregate::HourlySeries;
use crate::config::Config;
use crate::constants::{DEFAULT_UNIT, OPENWEATHER_SOURCE_NAME};
use crate::http_client::fetch_json;
use crate::providers::{MeasurementProvider, ProviderError};
use crate::types::{AirQualityData, Coordinates, Measurement};
use crate::utils::value_to_finite;

#[derive(Debug, Default, Deserialize)]
struct OpenWeatherResponse {
    #[serde(default)]
    list: Vec<OpenWeatherEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenWeatherEntry {
    #[serde(default)]
    dt: Option<i64>,
    #[serde(default)]
    components: Map<String, Value>,
}

impl OpenWeatherResponse {
    /// Entries become the hours of a series, oldest first; component keys
    /// keep the order of their first appearance.
    fn into_series(mut self) -> HourlySeries {
        self.list.sort_by_key(|entry| entry.dt.unwrap_or(i64::MIN));

        let times = self
            .list
            .iter()
            .map(|entry| {
                entry
                    .dt
                    .and_then(|dt| DateTime::<Utc>::from_timestamp(dt, 0))
                    .map(|ts| ts.to_rfc3339())
                    .unwrap_or_default()
            })
            .collect();

        let mut keys: Vec<&String> = Vec::new();
        for entry in &self.list {
            for key in entry.components.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        let mut series = HourlySeries::new(times);
        for key in keys {
            let values = self
                .list
                .iter()
                .map(|entry| value_to_finite(entry.components.get(key)))
                .collect();
            series.push_series(key, DEFAULT_UNIT, values);
        }
        series
    }
}

pub struct OpenWeatherProvider {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherProvider {
    pub fn new(http: Client, base_url: &str, api_key: &str) -> Result<Self, ProviderError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::NotConfigured);
        }
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(http: Client, cfg: &Config) -> Result<Self, ProviderError> {
        let api_key = cfg
            .openweather_api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured)?;
        Self::new(http, &cfg.openweather_base_url, api_key)
    }

    async fn fetch_series(&self, url: &str) -> Result<HourlySeries, ProviderError> {
        let payload: OpenWeatherResponse = fetch_json(&self.http, url).await?;
        Ok(payload.into_series())
    }
}

#[async_trait]
impl MeasurementProvider for OpenWeatherProvider {
    fn name(&self) -> &'static str {
        OPENWEATHER_SOURCE_NAME
    }

    async fn fetch_current(&self, at: Coordinates) -> Result<AirQualityData, ProviderError> {
        let url = build_current_url(&self.base_url, &self.api_key, at);
        let series = self.fetch_series(&url).await?;
        debug!(
            "OpenWeatherMap current: {} entries, latest valid {:?}",
            series.len(),
            series.latest_valid_time()
        );
        Ok(AirQualityData::new(
            OPENWEATHER_SOURCE_NAME,
            series.current_snapshot(),
        ))
    }

    /// Extremes come from the open provider only; this one never serves them.
    async fn fetch_extremes(&self, _at: Coordinates) -> Result<Vec<Measurement>, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
}

pub fn build_current_url(base_url: &str, api_key: &str, at: Coordinates) -> String {
    format!(
        "{base_url}/data/2.5/air_pollution?lat={:.4}&lon={:.4}&appid={}",
        at.lat,
        at.lon,
        urlencoding::encode(api_key),
    )
}
