//! Time-indexed pollutant series and the two reductions the panel needs:
//! the latest hour that has any reading, and the per-parameter maximum over
//! the whole window.

use serde_json::{Map, Value};

use crate::constants::DEFAULT_UNIT;
use crate::params::canonical_parameter;
use crate::types::Measurement;
use crate::utils::value_to_finite;

const TIME_KEY: &str = "time";

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSeries {
    pub parameter: String,
    pub unit: String,
    pub values: Vec<Option<f64>>,
}

impl ParameterSeries {
    fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    fn max_value(&self) -> Option<f64> {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(None, |max, value| match max {
                Some(current) if current >= value => Some(current),
                _ => Some(value),
            })
    }
}

/// Index-aligned series, oldest first. `series` keeps the order in which the
/// provider listed its parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HourlySeries {
    pub times: Vec<String>,
    pub series: Vec<ParameterSeries>,
}

impl HourlySeries {
    pub fn new(times: Vec<String>) -> Self {
        Self {
            times,
            series: Vec::new(),
        }
    }

    /// Builds from an Open-Meteo style `hourly` object plus its optional
    /// `hourly_units` object. Non-array members are not pollutant series.
    pub fn from_hourly_json(hourly: &Map<String, Value>, units: Option<&Map<String, Value>>) -> Self {
        let times = hourly
            .get(TIME_KEY)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| match entry {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut parsed = Self::new(times);
        for (key, value) in hourly {
            if key == TIME_KEY {
                continue;
            }
            let Some(entries) = value.as_array() else {
                continue;
            };
            let unit = units
                .and_then(|units| units.get(key))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|unit| !unit.is_empty())
                .unwrap_or(DEFAULT_UNIT);
            let values = entries
                .iter()
                .map(|entry| value_to_finite(Some(entry)))
                .collect();
            parsed.push_series(key, unit, values);
        }
        parsed
    }

    /// Adds a series unless one for the same pollutant is already present.
    /// Returns whether it was added.
    pub fn push_series(&mut self, parameter: &str, unit: &str, values: Vec<Option<f64>>) -> bool {
        let key = dedupe_key(parameter);
        if self
            .series
            .iter()
            .any(|existing| dedupe_key(&existing.parameter) == key)
        {
            return false;
        }
        self.series.push(ParameterSeries {
            parameter: parameter.to_string(),
            unit: unit.to_string(),
            values,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.series
            .iter()
            .map(|series| series.values.len())
            .chain(std::iter::once(self.times.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The latest index at which any parameter has a valid value.
    pub fn latest_valid_index(&self) -> Option<usize> {
        (0..self.len())
            .rev()
            .find(|&index| self.series.iter().any(|series| series.value_at(index).is_some()))
    }

    /// Time label of [`latest_valid_index`](Self::latest_valid_index), if the
    /// provider sent one.
    pub fn latest_valid_time(&self) -> Option<&str> {
        let index = self.latest_valid_index()?;
        self.times.get(index).map(String::as_str)
    }

    /// Readings from the most recent hour that has any reading. Parameters
    /// missing at that hour are left out rather than zero-filled.
    pub fn current_snapshot(&self) -> Vec<Measurement> {
        let Some(index) = self.latest_valid_index() else {
            return Vec::new();
        };
        self.series
            .iter()
            .filter_map(|series| {
                series
                    .value_at(index)
                    .map(|value| Measurement::new(&series.parameter, value, &series.unit))
            })
            .collect()
    }

    /// Per-parameter maximum over the whole window. Parameters with no valid
    /// value anywhere are omitted.
    pub fn extremes(&self) -> Vec<Measurement> {
        self.series
            .iter()
            .filter_map(|series| {
                series
                    .max_value()
                    .map(|value| Measurement::new(&series.parameter, value, &series.unit))
            })
            .collect()
    }
}

fn dedupe_key(parameter: &str) -> String {
    canonical_parameter(parameter)
        .map(str::to_string)
        .unwrap_or_else(|| parameter.trim().to_ascii_lowercase())
}
