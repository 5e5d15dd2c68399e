//! Reverse geocoding for the panel title. Best effort: any failure leaves the
//! place unnamed.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::http_client::fetch_json;
use crate::providers::ProviderError;
use crate::types::{Coordinates, Place};

#[derive(Debug, Default, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    fn into_place(self) -> Place {
        let city = [self.city, self.town, self.village, self.municipality, self.county]
            .into_iter()
            .flatten()
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty());
        let country = self
            .country
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Place { city, country }
    }
}

pub struct ReverseGeocoder {
    http: Client,
    base_url: String,
}

impl ReverseGeocoder {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    pub async fn lookup(&self, at: Coordinates) -> Result<Place, ProviderError> {
        let url = build_reverse_url(&self.base_url, at);
        let payload: NominatimResponse = fetch_json(&self.http, &url).await?;
        Ok(payload
            .address
            .map(NominatimAddress::into_place)
            .unwrap_or_default())
    }

    pub async fn place_or_unnamed(&self, at: Coordinates) -> Place {
        match self.lookup(at).await {
            Ok(place) => place,
            Err(error) => {
                debug!("Reverse geocode failed for {:.4},{:.4}: {error}", at.lat, at.lon);
                Place::default()
            }
        }
    }
}

pub fn build_reverse_url(base_url: &str, at: Coordinates) -> String {
    format!(
        "{base_url}/reverse?format=jsonv2&lat={:.5}&lon={:.5}&zoom=10&accept-language=en",
        at.lat, at.lon
    )
}
