use axum::{
    extract::{ConnectInfo, Path, State},
    http::header::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::analytics::{extract_client_ip, extract_user_agent, VisitPipeline};
use crate::config::RedirectMode;
use crate::error::ApiError;
use crate::models::VisitRecord;
use crate::registry::LinkRegistry;

pub struct RedirectState {
    pub registry: Arc<LinkRegistry>,
    pub pipeline: Arc<VisitPipeline>,
    pub link_prefix: String,
    pub mode: RedirectMode,
}

/// `/t/{id}`: follows the configured redirect mode
pub async fn redirect_link(
    State(state): State<Arc<RedirectState>>,
    Path(id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let request_start = Instant::now();
    let response = resolve_and_redirect(&state, &id, state.mode, addr, &headers).await?;
    debug!(id = %id, elapsed_ms = request_start.elapsed().as_millis() as u64, "redirect served");
    Ok(response)
}

/// `/track/{id}`: always captures and redirects to the decoy.
///
/// In tracking-page mode `/t/{id}` points here when the link prefix is this
/// service, so following the mode again would loop.
pub async fn redirect_tracked(
    State(state): State<Arc<RedirectState>>,
    Path(id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let request_start = Instant::now();
    let response =
        resolve_and_redirect(&state, &id, RedirectMode::Decoy, addr, &headers).await?;
    debug!(id = %id, elapsed_ms = request_start.elapsed().as_millis() as u64, "redirect served");
    Ok(response)
}

async fn resolve_and_redirect(
    state: &RedirectState,
    id: &str,
    mode: RedirectMode,
    addr: SocketAddr,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    // Unknown ids stop here, before any capture
    let destination = state.registry.resolve(id).await?;

    match mode {
        RedirectMode::TrackingPage => {
            let page = format!("{}/track/{}", state.link_prefix, id);
            Ok(Redirect::temporary(&page).into_response())
        }
        RedirectMode::Decoy => {
            let visit = VisitRecord::from_redirect(
                id,
                extract_client_ip(headers, addr.ip()),
                extract_user_agent(headers),
            );
            state.pipeline.process(visit).await;

            Ok(Redirect::temporary(&destination).into_response())
        }
    }
}
