use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use compute::CellSet;
use foundation::math::LonLat;
use formats::{cells_to_geojson, CellExport};
use layers::{Column, Layer, PickInfo};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::grid_service::{CellSizeReply, EventView, GridConfigView, ServiceError};
use crate::AppState;

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

#[derive(Debug, Deserialize)]
pub struct CellSizeRequest {
    pub cell_size: f64,
}

#[derive(Debug, Deserialize)]
pub struct PickQuery {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Serialize)]
pub struct CellsPayload {
    pub layer: String,
    pub cell_size: f64,
    pub elevation_key: String,
    pub color_key: String,
    pub columns: Vec<Column>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/grid/config", get(get_config))
        .route("/grid/cell-size", put(put_cell_size))
        .route("/grid/cells", get(get_cells))
        .route("/grid/cells.geojson", get(get_cells_geojson))
        .route("/grid/cells.json", get(get_cells_export))
        .route("/grid/events", get(get_events))
        .route("/grid/pick", get(get_pick))
        .route("/layer", get(get_layer))
        .route("/metrics", get(get_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

fn published(state: &AppState) -> Result<Arc<CellSet>, ApiError> {
    state
        .grid
        .published()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "no grid published yet"))
}

async fn get_config(State(state): State<AppState>) -> Json<GridConfigView> {
    Json(state.grid.config())
}

async fn put_cell_size(
    State(state): State<AppState>,
    Json(req): Json<CellSizeRequest>,
) -> Result<Json<CellSizeReply>, ApiError> {
    match state.grid.set_cell_size(req.cell_size).await {
        Ok(reply) => Ok(Json(reply)),
        Err(ServiceError::Rejected(e)) => {
            Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Err(err) => {
            error!("cell size update failed: {err}");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}

async fn get_cells(State(state): State<AppState>) -> Result<Json<CellsPayload>, ApiError> {
    let cells = published(&state)?;
    let columns = state.layer.columns(&cells).map_err(|e| {
        error!("column build failed: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(CellsPayload {
        layer: state.layer.id().as_str().to_string(),
        cell_size: cells.cell_size().meters(),
        elevation_key: state.layer.elevation_key().to_string(),
        color_key: state.layer.color_key().to_string(),
        columns,
    }))
}

async fn get_cells_geojson(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let cells = published(&state)?;
    Ok(Json(cells_to_geojson(&cells)))
}

async fn get_cells_export(State(state): State<AppState>) -> Result<Json<CellExport>, ApiError> {
    let cells = published(&state)?;
    Ok(Json(CellExport::from_cells(
        &cells,
        Some(state.source_hash.to_string()),
    )))
}

async fn get_events(State(state): State<AppState>) -> Json<Vec<EventView>> {
    Json(state.grid.events())
}

async fn get_pick(
    State(state): State<AppState>,
    Query(q): Query<PickQuery>,
) -> Result<Json<PickInfo>, ApiError> {
    let p = LonLat::new(q.lon, q.lat);
    if !p.is_valid() {
        return Err(api_error(StatusCode::BAD_REQUEST, "invalid lon/lat"));
    }
    let cells = published(&state)?;
    state
        .layer
        .pick(&cells, p)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "no populated cell at this position"))
}

async fn get_layer(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "id": state.layer.id(),
        "elevation_key": state.layer.elevation_key(),
        "color_key": state.layer.color_key(),
        "props": state.layer.props,
        "source_hash": &*state.source_hash,
    }))
}

async fn get_metrics(State(state): State<AppState>) -> Json<Value> {
    let snap = state.grid.metrics();
    let counters: serde_json::Map<String, Value> = snap
        .counters
        .iter()
        .map(|(name, v)| (name.to_string(), Value::from(*v)))
        .collect();
    let gauges: serde_json::Map<String, Value> = snap
        .gauges
        .iter()
        .map(|(name, v)| (name.to_string(), Value::from(*v)))
        .collect();
    let h = snap.recompute_micros;
    Json(json!({
        "counters": counters,
        "gauges": gauges,
        "recompute_micros": {
            "count": h.count,
            "sum": h.sum,
            "min": h.min,
            "max": h.max,
        },
    }))
}
