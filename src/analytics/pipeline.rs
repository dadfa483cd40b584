//! Visit enrichment pipeline
//!
//! lookup geo → classify → append log → format → dispatch
//!
//! Every stage is best-effort. Geo lookup and log append are awaited inline
//! (each bounded by its own timeout or local I/O); dispatch runs on a detached
//! task so a slow notification endpoint never holds up the response.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::analytics::geoip::GeoIpService;
use crate::analytics::notifier::Notifier;
use crate::analytics::summary::format_summary;
use crate::analytics::visit_log::VisitLog;
use crate::analytics::vpn::classify_vpn;
use crate::models::VisitRecord;

pub struct VisitPipeline {
    geoip: GeoIpService,
    notifier: Arc<dyn Notifier>,
    visit_log: Arc<VisitLog>,
    link_prefix: String,
}

/// What happened to a visit after it went through the pipeline
pub struct ProcessedVisit {
    pub visit: VisitRecord,
    /// Handle to the detached notification task
    pub dispatch: JoinHandle<()>,
}

impl VisitPipeline {
    pub fn new(
        geoip: GeoIpService,
        notifier: Arc<dyn Notifier>,
        visit_log: Arc<VisitLog>,
        link_prefix: impl Into<String>,
    ) -> Self {
        Self {
            geoip,
            notifier,
            visit_log,
            link_prefix: link_prefix.into(),
        }
    }

    pub fn visit_log(&self) -> &VisitLog {
        &self.visit_log
    }

    /// Enrich, log and forward a visit. Never fails.
    pub async fn process(&self, mut visit: VisitRecord) -> ProcessedVisit {
        visit.geo = self.geoip.lookup(&visit.client_ip).await;
        visit.vpn_suspected = classify_vpn(&visit.geo);

        if let Err(err) = self.visit_log.append(&visit).await {
            warn!(
                path = %self.visit_log.path().display(),
                error = %err,
                "failed to append visit log entry"
            );
        }

        let summary = format_summary(&visit, &self.link_prefix);
        debug!(
            id = visit.id.as_deref().unwrap_or(""),
            ip = %visit.client_ip,
            vpn = visit.vpn_suspected,
            "visit processed"
        );

        let dispatch = self.dispatch(summary);
        ProcessedVisit { visit, dispatch }
    }

    /// Fire-and-forget notification
    pub fn dispatch(&self, summary: String) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.send(&summary).await {
                warn!(notifier = notifier.name(), error = %err, "notification dispatch failed");
            }
        })
    }
}
