// HTTP request handlers
use crate::application::dashboard_service::Operation;
use crate::application::render_sync::RenderFrame;
use crate::domain::error::DashboardError;
use crate::domain::filter::LmpFilter;
use crate::domain::lmp::{PriceType, ZoneId};
use crate::infrastructure::chunked_stream::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::InvalidFilter(_) | DashboardError::InvalidPriceType(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::UnknownZone(_) => StatusCode::NOT_FOUND,
            DashboardError::Backend(_) => StatusCode::BAD_GATEWAY,
            DashboardError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        tracing::warn!("Request failed ({}): {}", status, self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type FrameResult = Result<Json<RenderFrame>, DashboardError>;

#[derive(Deserialize)]
pub struct SeekBody {
    pub index: usize,
}

#[derive(Deserialize)]
pub struct SpeedBody {
    pub value: u64,
}

#[derive(Deserialize)]
pub struct PriceTypeBody {
    pub price_type: String,
}

#[derive(Deserialize)]
pub struct ReferenceZoneBody {
    #[serde(default)]
    pub zone: Option<ZoneId>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Start a new load; the returned frame is in the loading state.
pub async fn load_data(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<LmpFilter>,
) -> FrameResult {
    tracing::info!(
        "Loading {} to {} ({} hours estimated)",
        filter.start_day,
        filter.end_day,
        filter.estimated_hours()
    );
    state.dashboard.load_data(filter).await.map(Json)
}

pub async fn play(State(state): State<Arc<AppState>>) -> FrameResult {
    state.dashboard.execute(Operation::Play).await.map(Json)
}

pub async fn pause(State(state): State<Arc<AppState>>) -> FrameResult {
    state.dashboard.execute(Operation::Pause).await.map(Json)
}

pub async fn show_average(State(state): State<Arc<AppState>>) -> FrameResult {
    state.dashboard.execute(Operation::ShowAverage).await.map(Json)
}

pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SeekBody>,
) -> FrameResult {
    state.dashboard.execute(Operation::Seek(body.index)).await.map(Json)
}

pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeedBody>,
) -> FrameResult {
    state
        .dashboard
        .execute(Operation::SetSpeed(body.value))
        .await
        .map(Json)
}

pub async fn set_price_type(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PriceTypeBody>,
) -> FrameResult {
    let price_type: PriceType = body.price_type.parse()?;
    state
        .dashboard
        .execute(Operation::SetPriceType(price_type))
        .await
        .map(Json)
}

pub async fn set_reference_zone(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReferenceZoneBody>,
) -> FrameResult {
    state
        .dashboard
        .execute(Operation::SetReferenceZone(body.zone))
        .await
        .map(Json)
}

/// What the display consumers last received
pub async fn display(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.display.snapshot();
    match json_response(&snapshot, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Hover lookup for a single zone, including the network row.
pub async fn zone_value(
    Path(zone): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboard.snapshot().await {
        Ok(frame) => match frame.zone(&zone) {
            Some(display) => Json(display.clone()).into_response(),
            None => DashboardError::UnknownZone(zone).into_response(),
        },
        Err(e) => e.into_response(),
    }
}

/// Live frames as length-prefixed chunks, starting with the current one.
pub async fn stream_display(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    // Subscribe first so no frame slips between the snapshot and the stream
    let rx = state.dashboard.subscribe();
    match state.dashboard.snapshot().await {
        Ok(initial) => stream_from_receiver(initial, rx, compress).into_response(),
        Err(e) => e.into_response(),
    }
}
