use axum::{routing::get, Router};
use std::sync::Arc;

use crate::analytics::VisitPipeline;
use crate::config::RedirectMode;
use crate::registry::LinkRegistry;

use super::handlers::{redirect_link, redirect_tracked, RedirectState};

pub fn create_redirect_router(
    registry: Arc<LinkRegistry>,
    pipeline: Arc<VisitPipeline>,
    link_prefix: String,
    mode: RedirectMode,
) -> Router {
    let state = Arc::new(RedirectState {
        registry,
        pipeline,
        link_prefix,
        mode,
    });

    Router::new()
        .route("/t/{id}", get(redirect_link))
        .route("/track/{id}", get(redirect_tracked))
        .with_state(state)
}
