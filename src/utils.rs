use serde_json::Value;

use crate::constants::MAX_CLIENT_ID_LEN;

pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();
}

pub fn trim_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

pub fn to_finite_number(value: Option<&str>) -> Option<f64> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = trimmed.parse::<f64>().ok()?;
    if parsed.is_finite() {
        Some(parsed)
    } else {
        None
    }
}

/// Loosely-typed JSON -> finite number. Null, booleans, objects and anything
/// that parses to NaN or infinity are absent, never zero.
pub fn value_to_finite(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64().filter(|parsed| parsed.is_finite()),
        Value::String(text) => to_finite_number(Some(text)),
        _ => None,
    }
}

pub fn parse_boolean(value: Option<&str>, fallback: bool) -> bool {
    let Some(value) = value else {
        return fallback;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => fallback,
    }
}

pub fn normalize_lat(raw: Option<&str>) -> Option<f64> {
    to_finite_number(raw).filter(|parsed| (-90.0..=90.0).contains(parsed))
}

pub fn normalize_lon(raw: Option<&str>) -> Option<f64> {
    to_finite_number(raw).filter(|parsed| (-180.0..=180.0).contains(parsed))
}

/// Browser session ids are opaque tokens the page generates; anything that
/// is not a short `[A-Za-z0-9_-]` string is rejected.
pub fn normalize_client_id(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_CLIENT_ID_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| trimmed.to_string())
}
