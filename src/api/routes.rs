use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::analytics::VisitPipeline;
use crate::registry::LinkRegistry;

use super::handlers::{generate_link, get_link, health_check, track_visit, view_logs, AppState};

pub fn create_api_router(
    registry: Arc<LinkRegistry>,
    pipeline: Arc<VisitPipeline>,
    link_prefix: String,
) -> Router {
    let state = Arc::new(AppState {
        registry,
        pipeline,
        link_prefix,
    });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/generate", post(generate_link))
        .route("/api/track", post(track_visit))
        .route("/api/logs", get(view_logs))
        .route("/api/links/{id}", get(get_link))
        .with_state(state)
}
