use anyhow::{Context, Result};
use axum::{
    extract::{Json, Query, State},
    routing::{get, post},
    Router,
};
use chrono::Local;
use flow_correction::{CorrectionResult, Zone};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::readings::Readings;
use crate::schedule::{Preset, WorkState};

// Shared between the control loop and the web server
#[derive(Clone)]
pub struct WebState {
    pub server_state: Arc<RwLock<ServerState>>,
}

#[derive(Default, Clone, Serialize)]
pub struct ServerState {
    pub work_state: WorkState,
    pub preset: Option<Preset>,
    pub room_setpoint: Option<f64>,
    pub readings: Readings,
    pub last_result: Option<CorrectionResult>,
    pub applied_flow_temperature: Option<f64>,
    pub last_skip: Option<String>,
    pub schedule: Vec<(String, String)>,
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPoint {
    pub timestamp: i64,
    pub base_temperature: f64,
    pub room_temperature: f64,
    pub room_setpoint: f64,
    pub flow_temperature: f64,
    pub zone: Zone,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    last_update: Option<i64>,
}

#[derive(Deserialize)]
pub struct ReadingsRequest {
    base_temperature: Option<f64>,
    room_temperature: Option<f64>,
}

#[derive(Deserialize)]
pub struct WorkStateRequest {
    work_state: WorkState,
}

pub fn router(server_state: Arc<RwLock<ServerState>>) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/readings", post(post_readings))
        .route("/api/work_state", post(post_work_state))
        .with_state(WebState { server_state })
}

pub async fn create_web_server(server_state: Arc<RwLock<ServerState>>, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding web server to {}", bind_addr))?;
    info!("web server listening on http://{}", bind_addr);
    axum::serve(listener, router(server_state))
        .await
        .context("web server")?;
    Ok(())
}

async fn get_status(
    State(state): State<WebState>,
    Query(query): Query<StatusQuery>,
) -> axum::Json<ServerState> {
    let server_state = state.server_state.read().await;
    let mut response_state = server_state.clone();

    // Only points newer than what the client already has
    if let Some(last_update) = query.last_update {
        response_state.history.retain(|point| point.timestamp > last_update);
    }

    axum::Json(response_state)
}

async fn post_readings(
    State(state): State<WebState>,
    Json(request): Json<ReadingsRequest>,
) -> axum::Json<serde_json::Value> {
    if request.base_temperature.is_none() && request.room_temperature.is_none() {
        return axum::Json(serde_json::json!({
            "success": false,
            "error": "no readings"
        }));
    }

    let now = Local::now();
    let mut server_state = state.server_state.write().await;
    if let Some(base) = request.base_temperature {
        server_state.readings.update_base(base, now);
    }
    if let Some(room) = request.room_temperature {
        server_state.readings.update_room(room, now);
    }
    axum::Json(serde_json::json!({
        "success": true
    }))
}

async fn post_work_state(
    State(state): State<WebState>,
    Json(request): Json<WorkStateRequest>,
) -> axum::Json<serde_json::Value> {
    let mut server_state = state.server_state.write().await;
    if server_state.work_state != request.work_state {
        info!("work state {} -> {}", server_state.work_state, request.work_state);
        server_state.work_state = request.work_state;
    }
    axum::Json(serde_json::json!({
        "success": true
    }))
}
