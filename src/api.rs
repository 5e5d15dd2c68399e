use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::params::{NormInfo, NORMS};
use crate::session::{ClientSession, Panel, PanelRenderer, QuerySession};
use crate::types::{AppState, Coordinates};
use crate::utils::{normalize_client_id, normalize_lat, normalize_lon};

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Debug, Deserialize)]
pub(crate) struct AirQualityQuery {
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
    #[serde(default)]
    client: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PanelQuery {
    #[serde(default)]
    client: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MetaResponse {
    #[serde(rename = "primaryConfigured")]
    primary_configured: bool,
    #[serde(rename = "primarySource")]
    primary_source: Option<&'static str>,
    #[serde(rename = "secondarySource")]
    secondary_source: &'static str,
    #[serde(rename = "geocoderEnabled")]
    geocoder_enabled: bool,
    #[serde(rename = "clientSessions")]
    client_sessions: usize,
    norms: &'static [NormInfo],
}

#[derive(Debug, Serialize)]
pub(crate) struct AirQualityResponse {
    generation: u64,
    stale: bool,
    panel: Panel,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/v1/meta", get(meta))
        .route("/v1/air-quality", get(air_quality))
        .route("/v1/panel", get(panel))
        .with_state(state)
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn meta(State(state): State<AppState>) -> Json<MetaResponse> {
    Json(MetaResponse {
        primary_configured: state.cfg.primary_configured(),
        primary_source: state.service.primary_name(),
        secondary_source: state.service.secondary_name(),
        geocoder_enabled: state.cfg.geocoder_enabled,
        client_sessions: state.sessions.len().await,
        norms: NORMS,
    })
}

pub async fn air_quality(
    State(state): State<AppState>,
    Query(query): Query<AirQualityQuery>,
) -> Response {
    let lat = normalize_lat(query.lat.as_deref());
    let lon = normalize_lon(query.lon.as_deref());
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return bad_request("Invalid lat/lon query parameters.");
    };

    // Without a client id the query runs in a throwaway session of its own.
    let session: Arc<ClientSession> = match query.client.as_deref() {
        None => Arc::new(QuerySession::new(PanelRenderer::new())),
        Some(raw) => match normalize_client_id(Some(raw)) {
            Some(client) => state.sessions.session_for(&client).await,
            None => return bad_request("Invalid client query parameter."),
        },
    };

    let report = session.run(&state.service, Coordinates::new(lat, lon)).await;

    no_store(Json(AirQualityResponse {
        generation: report.generation,
        stale: !report.rendered,
        panel: report.panel,
    }))
}

pub async fn panel(State(state): State<AppState>, Query(query): Query<PanelQuery>) -> Response {
    let Some(client) = normalize_client_id(query.client.as_deref()) else {
        return bad_request("Missing or invalid client query parameter.");
    };
    no_store(Json(state.sessions.panel_for(&client).await))
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn no_store(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
