//! Keyword heuristic for VPN / relay / hosting traffic
//!
//! The geolocation payload is serialized back to JSON text and matched,
//! case-sensitively, against a fixed keyword list. Field names count too.
//! This is intentionally literal: hosting ASNs, iCloud Private Relay and
//! cloud egress all tend to carry one of these words in `isp`/`org`/`as`.

use crate::analytics::models::GeoResult;

pub const VPN_KEYWORDS: [&str; 4] = ["Cloud", "Relay", "Apple", "Hosting"];

/// True if the serialized geolocation contains any of [`VPN_KEYWORDS`]
pub fn classify_vpn(geo: &GeoResult) -> bool {
    if geo.is_empty() {
        return false;
    }

    match serde_json::to_string(geo) {
        Ok(text) => VPN_KEYWORDS.iter().any(|keyword| text.contains(keyword)),
        Err(_) => false,
    }
}
