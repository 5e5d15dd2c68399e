use std::time::Duration;

use anyhow::{Context, Result};

use crate::constants::{
    DEFAULT_LISTEN_ADDR, DEFAULT_REQUEST_TIMEOUT_SECONDS, NOMINATIM_BASE_URL, OPENWEATHER_BASE_URL,
    OPEN_METEO_BASE_URL,
};
use crate::utils::{parse_boolean, trim_base_url};

#[derive(Clone)]
pub struct Config {
    pub listen_addr: String,
    pub request_timeout: Duration,
    pub openweather_api_key: Option<String>,
    pub openweather_base_url: String,
    pub open_meteo_base_url: String,
    pub geocoder_base_url: String,
    pub geocoder_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = env_string("AIRQ_LISTEN_ADDR", DEFAULT_LISTEN_ADDR);
        let request_timeout = Duration::from_secs(env_u64(
            "AIRQ_REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
        )?);
        let openweather_api_key = env_optional("AIRQ_OPENWEATHER_API_KEY")
            .or_else(|| env_optional("OPENWEATHER_API_KEY"));
        let openweather_base_url =
            trim_base_url(&env_string("AIRQ_OPENWEATHER_BASE_URL", OPENWEATHER_BASE_URL));
        let open_meteo_base_url =
            trim_base_url(&env_string("AIRQ_OPEN_METEO_BASE_URL", OPEN_METEO_BASE_URL));
        let geocoder_base_url =
            trim_base_url(&env_string("AIRQ_GEOCODER_BASE_URL", NOMINATIM_BASE_URL));
        let geocoder_enabled =
            parse_boolean(env_optional("AIRQ_GEOCODER_ENABLED").as_deref(), true);

        Ok(Self {
            listen_addr,
            request_timeout,
            openweather_api_key,
            openweather_base_url,
            open_meteo_base_url,
            geocoder_base_url,
            geocoder_enabled,
        })
    }

    pub fn primary_configured(&self) -> bool {
        self.openweather_api_key.is_some()
    }
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_string(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match env_optional(name) {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {}={} as u64", name, value)),
        None => Ok(default),
    }
}
