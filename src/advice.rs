//! Filter-grade recommendations derived from a measurement set.
//!
//! Callers should pass the 30-day extremes when they have them so the
//! recommendation reflects the worst case, and the current snapshot only when
//! no extremes exist (see `merge::QueryOutcome::advice`).

use serde::Serialize;

use crate::constants::{DUST_HIGH_MAX, DUST_LOW_MAX, DUST_MODERATE_MAX};
use crate::params::{classify, norm_info_for, Bucket};
use crate::severity::particulate_base;
use crate::types::Measurement;

pub const DUST_ADVICE_BASELINE: &str =
    "No particulate data for this location. A general-purpose filter of class ePM10 50% (formerly M5) covers everyday household dust.";
pub const DUST_ADVICE_LOW: &str =
    "Low particulate load. An ePM10 50% filter (formerly M5) is sufficient.";
pub const DUST_ADVICE_MODERATE: &str =
    "Moderate particulate load. Use an ePM2.5 50–65% filter (formerly F7).";
pub const DUST_ADVICE_HIGH: &str =
    "High particulate load. Use an ePM1 50–70% filter (formerly F7/F8).";
pub const DUST_ADVICE_SEVERE: &str =
    "Very high particulate load. Use an ePM1 80% filter (formerly F9) or a HEPA H13 filter.";
pub const GAS_ADVICE: &str =
    "Gaseous pollutants (NO₂, SO₂, O₃, CO, NH₃) exceed reference values. Add an activated carbon stage to remove gases and odours.";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilterAdvice {
    pub dust: String,
    pub gases: Option<String>,
}

pub fn advise_for(measurements: &[Measurement]) -> FilterAdvice {
    FilterAdvice {
        dust: dust_advice(particulate_base(measurements)).to_string(),
        gases: gas_norm_exceeded(measurements).then(|| GAS_ADVICE.to_string()),
    }
}

fn dust_advice(base: Option<f64>) -> &'static str {
    match base {
        None => DUST_ADVICE_BASELINE,
        Some(value) if value <= DUST_LOW_MAX => DUST_ADVICE_LOW,
        Some(value) if value <= DUST_MODERATE_MAX => DUST_ADVICE_MODERATE,
        Some(value) if value <= DUST_HIGH_MAX => DUST_ADVICE_HIGH,
        Some(_) => DUST_ADVICE_SEVERE,
    }
}

fn gas_norm_exceeded(measurements: &[Measurement]) -> bool {
    measurements.iter().any(|measurement| {
        classify(&measurement.parameter) == Bucket::Gas
            && norm_info_for(&measurement.parameter)
                .map(|norm| measurement.value > norm.limit)
                .unwrap_or(false)
    })
}
