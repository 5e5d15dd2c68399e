use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::providers::ProviderError;

pub async fn fetch_json<T: DeserializeOwned>(http: &Client, url: &str) -> Result<T, ProviderError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(reqwest::Error::without_url)?;

    if !response.status().is_success() {
        return Err(ProviderError::Http {
            status: response.status(),
            url: redact_url(url),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(reqwest::Error::without_url)?;
    serde_json::from_slice(&body).map_err(|error| ProviderError::Decode(error.to_string()))
}

/// Drops the query string so credentials never end up in logs or errors.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((path, _)) => path.to_string(),
        None => url.to_string(),
    }
}
