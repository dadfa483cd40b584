//! GeoIP lookup against an ip-api.com compatible HTTP service
//!
//! Lookups are best-effort: every failure (transport, timeout, non-2xx,
//! undecodable or non-object body, `"status": "fail"`) collapses into an
//! empty [`GeoResult`]. Successful results are cached per IP for a TTL;
//! failures are not cached so the next visit retries.

use anyhow::{Context, Result};
use moka::future::Cache;
use reqwest::Client;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

use crate::analytics::models::GeoResult;
use crate::config::GeoIpConfig;
use crate::error::EnrichmentError;

const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;

/// GeoIP lookup service
#[derive(Clone)]
pub struct GeoIpService {
    client: Client,
    api_url: String,
    cache: Option<Cache<String, GeoResult>>,
}

impl GeoIpService {
    /// Create a new GeoIP service from configuration
    ///
    /// The HTTP client carries the configured timeout, so a lookup can never
    /// stall a request for longer than that.
    pub fn new(config: &GeoIpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tracelink/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client for GeoIP lookups")?;

        let cache = (config.cache_ttl_secs > 0).then(|| {
            Cache::builder()
                .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
                .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                .build()
        });

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// Lookup geolocation for an IP address, empty on any failure
    pub async fn lookup(&self, ip: &str) -> GeoResult {
        let result = match &self.cache {
            Some(cache) => cache
                .try_get_with(ip.to_string(), self.fetch(ip))
                .await
                .map_err(|e: Arc<EnrichmentError>| e.to_string()),
            None => self.fetch(ip).await.map_err(|e| e.to_string()),
        };

        match result {
            Ok(geo) => geo,
            Err(err) => {
                warn!(ip = %ip, error = %err, "GeoIP lookup failed");
                GeoResult::default()
            }
        }
    }

    /// Fetch from the remote service, bypassing the cache
    pub async fn fetch(&self, ip: &str) -> Result<GeoResult, EnrichmentError> {
        // Only a bare address may become a path segment of the lookup URL
        let ip: IpAddr = ip
            .parse()
            .map_err(|_| EnrichmentError::geo(format!("'{ip}' is not an IP address")))?;
        let url = format!("{}/{}", self.api_url, ip);
        trace!("GeoIP request to {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(EnrichmentError::geo)?
            .error_for_status()
            .map_err(EnrichmentError::geo)?;

        let body: Value = response.json().await.map_err(EnrichmentError::geo)?;

        let Value::Object(map) = body else {
            return Err(EnrichmentError::geo("response body is not a JSON object"));
        };

        // ip-api.com answers 200 with {"status": "fail", "message": ...} for
        // private and reserved ranges
        if map.get("status").and_then(Value::as_str) == Some("fail") {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown reason");
            return Err(EnrichmentError::geo(format!(
                "service reported failure: {message}"
            )));
        }

        Ok(GeoResult::from_map(map))
    }
}
