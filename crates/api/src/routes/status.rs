//! Status Route

use axum::{extract::State, Json};
use monitor::MonitorSnapshot;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Latest reading, classification, prediction and recommendations
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MonitorSnapshot>, ApiError> {
    Ok(Json(state.monitor.snapshot()?))
}
