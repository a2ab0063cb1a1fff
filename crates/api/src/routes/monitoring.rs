//! Monitoring Control Routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Response for control endpoints
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub monitoring: bool,
    /// False when the request matched the current state
    pub changed: bool,
}

/// Start a monitoring session
pub async fn start(State(state): State<Arc<AppState>>) -> Result<Json<ControlResponse>, ApiError> {
    let changed = state.monitor.start()?;
    Ok(Json(ControlResponse {
        monitoring: true,
        changed,
    }))
}

/// Stop the monitoring session
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<Json<ControlResponse>, ApiError> {
    let changed = state.monitor.stop()?;
    Ok(Json(ControlResponse {
        monitoring: false,
        changed,
    }))
}

/// Reset the whole system
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<ControlResponse>, ApiError> {
    state.monitor.reset()?;
    Ok(Json(ControlResponse {
        monitoring: false,
        changed: true,
    }))
}
