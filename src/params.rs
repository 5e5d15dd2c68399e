//! Pollutant parameter normalization.
//!
//! Providers spell the same pollutant differently (`pm2_5`, `pm2.5`, `no2`,
//! `nitrogen_dioxide`, ...). Every lookup that depends on the pollutant family
//! goes through [`canonical_parameter`], so a new alias only needs to be added
//! to [`PARAMETER_ALIASES`].

use serde::Serialize;

pub const PM2_5: &str = "pm2_5";
pub const PM10: &str = "pm10";
pub const NITROGEN_DIOXIDE: &str = "nitrogen_dioxide";
pub const SULPHUR_DIOXIDE: &str = "sulphur_dioxide";
pub const OZONE: &str = "ozone";
pub const CARBON_MONOXIDE: &str = "carbon_monoxide";
pub const AMMONIA: &str = "ammonia";

/// Lower-case alias -> canonical identifier.
pub static PARAMETER_ALIASES: &[(&str, &str)] = &[
    ("pm2_5", PM2_5),
    ("pm2.5", PM2_5),
    ("pm25", PM2_5),
    ("pm10", PM10),
    ("no2", NITROGEN_DIOXIDE),
    ("nitrogen_dioxide", NITROGEN_DIOXIDE),
    ("so2", SULPHUR_DIOXIDE),
    ("sulphur_dioxide", SULPHUR_DIOXIDE),
    ("sulfur_dioxide", SULPHUR_DIOXIDE),
    ("o3", OZONE),
    ("ozone", OZONE),
    ("co", CARBON_MONOXIDE),
    ("carbon_monoxide", CARBON_MONOXIDE),
    ("nh3", AMMONIA),
    ("ammonia", AMMONIA),
];

/// Reference threshold for one pollutant family. Used as a display and
/// advisory baseline only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NormInfo {
    pub parameter: &'static str,
    pub limit: f64,
    pub unit: &'static str,
    pub label: &'static str,
}

/// 24-hour reference values in µg/m³. Ozone is the 8-hour value.
pub static NORMS: &[NormInfo] = &[
    NormInfo {
        parameter: PM2_5,
        limit: 15.0,
        unit: "µg/m³",
        label: "PM2.5",
    },
    NormInfo {
        parameter: PM10,
        limit: 45.0,
        unit: "µg/m³",
        label: "PM10",
    },
    NormInfo {
        parameter: NITROGEN_DIOXIDE,
        limit: 25.0,
        unit: "µg/m³",
        label: "NO₂",
    },
    NormInfo {
        parameter: SULPHUR_DIOXIDE,
        limit: 40.0,
        unit: "µg/m³",
        label: "SO₂",
    },
    NormInfo {
        parameter: OZONE,
        limit: 100.0,
        unit: "µg/m³",
        label: "O₃",
    },
    NormInfo {
        parameter: CARBON_MONOXIDE,
        limit: 4000.0,
        unit: "µg/m³",
        label: "CO",
    },
    NormInfo {
        parameter: AMMONIA,
        limit: 200.0,
        unit: "µg/m³",
        label: "NH₃",
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Dust,
    Gas,
}

pub fn canonical_parameter(raw: &str) -> Option<&'static str> {
    let key = raw.trim().to_ascii_lowercase();
    PARAMETER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
}

pub fn canonical_label(raw: &str) -> String {
    match norm_info_for(raw) {
        Some(norm) => norm.label.to_string(),
        None => raw.trim().to_uppercase(),
    }
}

pub fn norm_info_for(raw: &str) -> Option<&'static NormInfo> {
    let canonical = canonical_parameter(raw)?;
    NORMS.iter().find(|norm| norm.parameter == canonical)
}

pub fn classify(raw: &str) -> Bucket {
    match canonical_parameter(raw) {
        Some(PM2_5) | Some(PM10) => Bucket::Dust,
        _ => Bucket::Gas,
    }
}

/// How a single reading compares with its reference threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NormStatus {
    NoNorm,
    WithinNorm {
        limit: f64,
        #[serde(rename = "percentOfLimit")]
        percent_of_limit: f64,
    },
    ExceedsNorm {
        limit: f64,
        #[serde(rename = "percentOfLimit")]
        percent_of_limit: f64,
    },
}

pub fn norm_status(raw: &str, value: f64) -> NormStatus {
    let Some(norm) = norm_info_for(raw) else {
        return NormStatus::NoNorm;
    };
    let percent_of_limit = (value / norm.limit * 100.0).round();
    if value > norm.limit {
        NormStatus::ExceedsNorm {
            limit: norm.limit,
            percent_of_limit,
        }
    } else {
        NormStatus::WithinNorm {
            limit: norm.limit,
            percent_of_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(canonical_parameter("PM2.5"), Some(PM2_5));
        assert_eq!(canonical_parameter("pm2_5"), Some(PM2_5));
        assert_eq!(canonical_parameter("NO2"), Some(NITROGEN_DIOXIDE));
        assert_eq!(canonical_parameter("Nitrogen_Dioxide"), Some(NITROGEN_DIOXIDE));
        assert_eq!(canonical_parameter("so2"), Some(SULPHUR_DIOXIDE));
        assert_eq!(canonical_parameter("o3"), Some(OZONE));
        assert_eq!(canonical_parameter("CO"), Some(CARBON_MONOXIDE));
        assert_eq!(canonical_parameter("nh3"), Some(AMMONIA));
        assert_eq!(canonical_parameter("no"), None);
    }

    #[test]
    fn unknown_parameter_label_falls_back_to_upper_case() {
        assert_eq!(canonical_label("no"), "NO");
        assert_eq!(canonical_label("dust"), "DUST");
        assert_eq!(canonical_label("pm2.5"), "PM2.5");
        assert_eq!(canonical_label("nitrogen_dioxide"), "NO₂");
    }

    #[test]
    fn missing_norm_is_distinct_from_within_norm() {
        assert!(norm_info_for("no").is_none());
        assert_eq!(norm_status("no", 1_000_000.0), NormStatus::NoNorm);
        assert_eq!(
            norm_status("pm2_5", 15.0),
            NormStatus::WithinNorm {
                limit: 15.0,
                percent_of_limit: 100.0
            }
        );
        assert!(matches!(
            norm_status("no2", 30.0),
            NormStatus::ExceedsNorm { limit, .. } if limit == 25.0
        ));
    }

    #[test]
    fn every_canonical_family_has_exactly_one_norm() {
        let mut canonicals: Vec<_> = PARAMETER_ALIASES.iter().map(|(_, c)| *c).collect();
        canonicals.sort();
        canonicals.dedup();
        assert_eq!(canonicals.len(), NORMS.len());
        for canonical in canonicals {
            let matches = NORMS.iter().filter(|n| n.parameter == canonical).count();
            assert_eq!(matches, 1, "norm table entry count for {canonical}");
        }
    }

    #[test]
    fn particulates_are_dust_everything_else_is_gas() {
        assert_eq!(classify("PM2.5"), Bucket::Dust);
        assert_eq!(classify("pm10"), Bucket::Dust);
        assert_eq!(classify("ozone"), Bucket::Gas);
        assert_eq!(classify("no"), Bucket::Gas);
        assert_eq!(classify("anything"), Bucket::Gas);
    }
}
