//! Best-available-data policy across the two providers.
//!
//! Current readings: the credentialed provider first (when configured), the
//! open provider on any failure. An empty answer from whichever provider
//! answered is final. Extremes always come from the open provider, fetched
//! concurrently with the current chain; their failure degrades to an empty set.

use std::sync::Arc;

use futures::future::join3;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::advice::{advise_for, FilterAdvice};
use crate::config::Config;
use crate::geocode::ReverseGeocoder;
use crate::providers::{
    MeasurementProvider, OpenMeteoProvider, OpenWeatherProvider, ProviderError,
};
use crate::severity::{level_for, PollutionLevel};
use crate::types::{AirQualityData, Coordinates, Measurement, Place};

#[derive(Clone, Debug, PartialEq)]
pub struct QueryOutcome {
    pub current: AirQualityData,
    pub extremes: Vec<Measurement>,
}

impl QueryOutcome {
    /// No current readings means nothing to show, whatever the extremes hold.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn level(&self) -> Option<PollutionLevel> {
        level_for(&self.current.measurements)
    }

    /// Worst case over the extremes window when available, the current
    /// snapshot otherwise.
    pub fn advice_basis(&self) -> &[Measurement] {
        if self.extremes.is_empty() {
            &self.current.measurements
        } else {
            &self.extremes
        }
    }

    pub fn advice(&self) -> FilterAdvice {
        advise_for(self.advice_basis())
    }
}

pub struct AirQualityService {
    primary: Option<Arc<dyn MeasurementProvider>>,
    secondary: Arc<dyn MeasurementProvider>,
    geocoder: Option<ReverseGeocoder>,
}

impl AirQualityService {
    pub fn new(
        primary: Option<Arc<dyn MeasurementProvider>>,
        secondary: Arc<dyn MeasurementProvider>,
    ) -> Self {
        Self {
            primary,
            secondary,
            geocoder: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: ReverseGeocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn from_config(http: Client, cfg: &Config) -> Self {
        let primary: Option<Arc<dyn MeasurementProvider>> =
            match OpenWeatherProvider::from_config(http.clone(), cfg) {
                Ok(provider) => Some(Arc::new(provider)),
                Err(error) => {
                    info!("Primary provider skipped: {error}");
                    None
                }
            };
        let secondary = Arc::new(OpenMeteoProvider::new(http.clone(), &cfg.open_meteo_base_url));

        let service = Self::new(primary, secondary);
        if cfg.geocoder_enabled {
            service.with_geocoder(ReverseGeocoder::new(http, &cfg.geocoder_base_url))
        } else {
            service
        }
    }

    pub fn primary_name(&self) -> Option<&'static str> {
        self.primary.as_ref().map(|provider| provider.name())
    }

    pub fn secondary_name(&self) -> &'static str {
        self.secondary.name()
    }

    /// Fails only when the open provider fails for current readings.
    pub async fn query(&self, at: Coordinates) -> Result<QueryOutcome, ProviderError> {
        let (current, extremes, place) = join3(
            self.fetch_current(at),
            self.fetch_extremes(at),
            self.lookup_place(at),
        )
        .await;

        let mut current = current?;
        if current.city.is_none() {
            current.city = place.city;
        }
        if current.country.is_none() {
            current.country = place.country;
        }

        Ok(QueryOutcome { current, extremes })
    }

    async fn fetch_current(&self, at: Coordinates) -> Result<AirQualityData, ProviderError> {
        if let Some(primary) = self.primary.as_ref() {
            match primary.fetch_current(at).await {
                Ok(data) => {
                    if data.is_empty() {
                        info!("{} returned no usable readings", primary.name());
                    }
                    return Ok(data);
                }
                Err(error) => {
                    warn!(
                        "{} unavailable, falling back to {}: {error}",
                        primary.name(),
                        self.secondary.name()
                    );
                }
            }
        }

        self.secondary.fetch_current(at).await
    }

    async fn fetch_extremes(&self, at: Coordinates) -> Vec<Measurement> {
        match self.secondary.fetch_extremes(at).await {
            Ok(extremes) => extremes,
            Err(error) => {
                warn!("{} extremes unavailable: {error}", self.secondary.name());
                Vec::new()
            }
        }
    }

    async fn lookup_place(&self, at: Coordinates) -> Place {
        match self.geocoder.as_ref() {
            Some(geocoder) => geocoder.place_or_unnamed(at).await,
            None => {
                debug!("Reverse geocoding disabled");
                Place::default()
            }
        }
    }
}
