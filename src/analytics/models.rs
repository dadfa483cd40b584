//! Data models for visit enrichment

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Geolocation result as returned by the lookup service.
///
/// The payload is kept as the service's own JSON object (ip-api.com field
/// names: `city`, `country`, `countryCode`, `regionName`, `isp`, `org`, `zip`,
/// `lat`, `lon`, ...) so the raw log and the VPN heuristic see exactly what
/// the service reported. An empty object means the lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoResult(Map<String, Value>);

impl GeoResult {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field as display text; strings, numbers and booleans only
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(value_text)
    }

    /// Field as a number, if it is one
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn city(&self) -> Option<String> {
        self.text("city")
    }

    pub fn country(&self) -> Option<String> {
        self.text("country")
    }

    pub fn country_code(&self) -> Option<String> {
        self.text("countryCode")
    }

    /// Region name, falling back to the region code
    pub fn region(&self) -> Option<String> {
        self.text("regionName").or_else(|| self.text("region"))
    }

    pub fn isp(&self) -> Option<String> {
        self.text("isp")
    }

    pub fn org(&self) -> Option<String> {
        self.text("org")
    }

    pub fn zip(&self) -> Option<String> {
        self.text("zip")
    }

    pub fn latitude(&self) -> Option<f64> {
        self.number("lat").or_else(|| self.number("latitude"))
    }

    pub fn longitude(&self) -> Option<f64> {
        self.number("lon").or_else(|| self.number("longitude"))
    }
}

/// Render a loosely typed JSON value for humans.
///
/// Strings (non-empty), numbers and booleans render as text; null, empty
/// strings, arrays and objects count as missing.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
