use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analytics::GeoResult;

/// Which path captured a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitSource {
    /// Server-side capture while resolving `/t/{id}`
    Redirect,
    /// Client-side report posted to `/api/track`
    Beacon,
}

/// Body of `POST /api/track`. Everything in it is client-controlled.
#[derive(Debug, Default, Deserialize)]
pub struct BeaconRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<Map<String, Value>>,
    /// Client-reported position. Kept for the raw log only.
    #[serde(default)]
    pub geo: Option<Value>,
    #[serde(default)]
    pub events: Option<Vec<Value>>,
    /// Session duration in milliseconds
    #[serde(default)]
    pub duration: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BeaconResponse {
    pub status: String,
}

/// A single visit, assembled from request metadata and enriched by the pipeline.
/// Never stored; it is only logged and forwarded.
#[derive(Debug, Clone)]
pub struct VisitRecord {
    pub id: Option<String>,
    pub source: VisitSource,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub geo: GeoResult,
    pub fingerprint: Option<Map<String, Value>>,
    pub events: Option<Vec<Value>>,
    pub duration_ms: Option<i64>,
    pub client_geo: Option<Value>,
    pub vpn_suspected: bool,
    pub received_at: DateTime<Utc>,
}

impl VisitRecord {
    /// Visit observed while resolving a redirect
    pub fn from_redirect(id: &str, client_ip: String, user_agent: Option<String>) -> Self {
        Self {
            id: Some(id.to_string()),
            source: VisitSource::Redirect,
            client_ip,
            user_agent,
            geo: GeoResult::default(),
            fingerprint: None,
            events: None,
            duration_ms: None,
            client_geo: None,
            vpn_suspected: false,
            received_at: Utc::now(),
        }
    }

    /// Visit reported by the tracking page
    pub fn from_beacon(
        beacon: BeaconRequest,
        client_ip: String,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            id: beacon.id.filter(|id| !id.is_empty()),
            source: VisitSource::Beacon,
            client_ip,
            user_agent,
            geo: GeoResult::default(),
            fingerprint: beacon.fingerprint,
            events: beacon.events,
            duration_ms: beacon.duration,
            client_geo: beacon.geo.filter(|g| !g.is_null()),
            vpn_suspected: false,
            received_at: Utc::now(),
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.as_ref().map_or(0, Vec::len)
    }

    /// Fingerprint field as display text, if present and non-empty
    pub fn fingerprint_text(&self, key: &str) -> Option<String> {
        self.fingerprint
            .as_ref()
            .and_then(|fp| fp.get(key))
            .and_then(crate::analytics::models::value_text)
    }
}
