use serde::Serialize;

use crate::constants::{LEVEL_GOOD_MAX, LEVEL_MODERATE_MAX, LEVEL_UNHEALTHY_MAX};
use crate::params::{canonical_parameter, PM10, PM2_5};
use crate::types::Measurement;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollutionLevel {
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
}

impl PollutionLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very unhealthy",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Good => "#2e7d32",
            Self::Moderate => "#f9a825",
            Self::Unhealthy => "#e65100",
            Self::VeryUnhealthy => "#6a1b9a",
        }
    }

    fn from_particulate(value: f64) -> Self {
        if value <= LEVEL_GOOD_MAX {
            Self::Good
        } else if value <= LEVEL_MODERATE_MAX {
            Self::Moderate
        } else if value <= LEVEL_UNHEALTHY_MAX {
            Self::Unhealthy
        } else {
            Self::VeryUnhealthy
        }
    }
}

/// The reading that drives both the severity level and the dust advice:
/// PM2.5 when present, otherwise PM10.
pub fn particulate_base(measurements: &[Measurement]) -> Option<f64> {
    let find = |family: &str| {
        measurements
            .iter()
            .find(|measurement| canonical_parameter(&measurement.parameter) == Some(family))
            .map(|measurement| measurement.value)
    };
    find(PM2_5).or_else(|| find(PM10))
}

/// Gas-only or empty sets have no level.
pub fn level_for(measurements: &[Measurement]) -> Option<PollutionLevel> {
    particulate_base(measurements).map(PollutionLevel::from_particulate)
}
