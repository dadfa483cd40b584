//! Client IP extraction from HTTP headers
//!
//! The first address in `X-Forwarded-For` wins; without one we use the socket
//! peer address. The header is caller-supplied and therefore spoofable. No
//! trust chain is validated: anything in front of this service is assumed to
//! be a single, honest proxy (or none).

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Resolve the client IP for a request
///
/// # Arguments
/// * `headers` - HTTP request headers
/// * `socket_addr` - The socket remote address (fallback)
///
/// # Returns
/// The leftmost `X-Forwarded-For` entry if it parses as an IP address,
/// otherwise the socket address
pub fn extract_client_ip(headers: &HeaderMap, socket_addr: IpAddr) -> String {
    extract_from_x_forwarded_for(headers)
        .unwrap_or(socket_addr)
        .to_string()
}

/// First entry of X-Forwarded-For, if it is an IP address
fn extract_from_x_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;

    xff.split(',').next()?.trim().parse::<IpAddr>().ok()
}

/// Raw `User-Agent` header value
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
