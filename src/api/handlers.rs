use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::analytics::{extract_client_ip, extract_user_agent, VisitPipeline};
use crate::error::ApiError;
use crate::models::{
    BeaconRequest, BeaconResponse, CreateLinkRequest, CreateLinkResponse, LinkRecord, VisitRecord,
};
use crate::registry::LinkRegistry;

pub struct AppState {
    pub registry: Arc<LinkRegistry>,
    pub pipeline: Arc<VisitPipeline>,
    pub link_prefix: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub links: usize,
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(format!("Invalid JSON: {}", rejection.body_text()))
}

/// Issue a new tracking link
pub async fn generate_link(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<Json<CreateLinkResponse>, ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;

    let record = state.registry.create_link(&payload.decoy_url).await?;
    info!(id = %record.id, "issued tracking link");

    Ok(Json(CreateLinkResponse {
        link: format!("{}/t/{}", state.link_prefix, record.id),
    }))
}

/// Accept a client-side tracking report
pub async fn track_visit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<BeaconRequest>, JsonRejection>,
) -> Result<Json<BeaconResponse>, ApiError> {
    let Json(beacon) = payload.map_err(invalid_body)?;

    let visit = VisitRecord::from_beacon(
        beacon,
        extract_client_ip(&headers, addr.ip()),
        extract_user_agent(&headers),
    );
    state.pipeline.process(visit).await;

    Ok(Json(BeaconResponse {
        status: "tracked".to_string(),
    }))
}

/// Dump the raw visit log
pub async fn view_logs(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let contents = state
        .pipeline
        .visit_log()
        .read_all()
        .await
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("Failed to read log file")))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        contents,
    )
        .into_response())
}

/// Look up a link so the tracking page can find its decoy URL
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LinkRecord>, ApiError> {
    Ok(Json(state.registry.get(&id).await?))
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "OK".to_string(),
        links: state.registry.count().await?,
    }))
}
