//! Visit enrichment
//!
//! Turns a raw visit (client IP, user agent, optional beacon payload) into a
//! log entry and a notification. Nothing in here can fail a request.

pub mod geoip;
pub mod ip_extractor;
pub mod models;
pub mod notifier;
pub mod pipeline;
pub mod summary;
pub mod visit_log;
pub mod vpn;

pub use geoip::GeoIpService;
pub use ip_extractor::{extract_client_ip, extract_user_agent};
pub use models::GeoResult;
pub use notifier::{NoopNotifier, Notifier, TelegramNotifier};
pub use pipeline::{ProcessedVisit, VisitPipeline};
pub use summary::format_summary;
pub use visit_log::VisitLog;
pub use vpn::classify_vpn;
