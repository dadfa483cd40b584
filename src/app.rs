//! Service assembly: builds the shared components from [`Config`] and wires
//! the API and redirect routers behind one CORS policy.

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analytics::notifier::{self, Notifier};
use crate::analytics::{GeoIpService, VisitLog, VisitPipeline};
use crate::api::middleware::with_cors;
use crate::config::{Config, RedirectMode};
use crate::registry::LinkRegistry;
use crate::storage::{LinkStore, MemoryStorage};

/// Long-lived components shared by all handlers
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<LinkRegistry>,
    pub pipeline: Arc<VisitPipeline>,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn LinkStore> = Arc::new(MemoryStorage::new());
        let registry = Arc::new(LinkRegistry::new(store));

        let geoip = GeoIpService::new(&config.geoip)?;
        info!(
            "🌍 GeoIP lookups via {} (timeout {}s)",
            config.geoip.api_url, config.geoip.timeout_secs
        );

        let sink: Arc<dyn Notifier> = Arc::from(notifier::from_config(&config.notify)?);
        info!("📨 Notifications: {}", sink.name());

        let visit_log = Arc::new(VisitLog::new(&config.visit_log.path));
        info!("📝 Visit log: {}", config.visit_log.path);

        let pipeline = Arc::new(VisitPipeline::new(
            geoip,
            sink,
            visit_log,
            config.link_prefix.clone(),
        ));

        Ok(Self { registry, pipeline })
    }
}

pub fn create_app(services: &Services, link_prefix: &str, redirect_mode: RedirectMode) -> Router {
    let api_router = crate::api::create_api_router(
        Arc::clone(&services.registry),
        Arc::clone(&services.pipeline),
        link_prefix.to_string(),
    );
    let redirect_router = crate::redirect::create_redirect_router(
        Arc::clone(&services.registry),
        Arc::clone(&services.pipeline),
        link_prefix.to_string(),
        redirect_mode,
    );

    with_cors(Router::new().merge(api_router).merge(redirect_router))
        .layer(TraceLayer::new_for_http())
}
