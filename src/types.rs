use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::merge::AirQualityService;
use crate::session::ClientSessions;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: Arc<AirQualityService>,
    pub sessions: Arc<ClientSessions>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One pollutant reading. `parameter` keeps the provider's spelling; use
/// `params::canonical_parameter` to resolve it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub parameter: String,
    pub value: f64,
    pub unit: String,
}

impl Measurement {
    pub fn new(parameter: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            value,
            unit: unit.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityData {
    pub city: Option<String>,
    pub country: Option<String>,
    pub measurements: Vec<Measurement>,
    pub source: String,
}

impl AirQualityData {
    pub fn new(source: &str, measurements: Vec<Measurement>) -> Self {
        Self {
            city: None,
            country: None,
            measurements,
            source: source.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn place(&self) -> Place {
        Place {
            city: self.city.clone(),
            country: self.country.clone(),
        }
    }
}
