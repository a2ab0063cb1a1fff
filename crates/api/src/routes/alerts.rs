//! Alert Routes

use alerting::{AlertEvent, AlertRecord, TriggerOutcome};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<AlertRecord>,
    pub count: usize,
    pub active_count: usize,
    pub cooldown_remaining_ms: Option<u64>,
}

/// Alert outcome of an evaluation
#[derive(Debug, Serialize)]
pub struct OutcomeView {
    pub outcome: &'static str,
    pub alert_id: Option<u64>,
}

impl From<TriggerOutcome> for OutcomeView {
    fn from(outcome: TriggerOutcome) -> Self {
        let (outcome, alert_id) = match outcome {
            TriggerOutcome::Raised(id) => ("raised", Some(id)),
            TriggerOutcome::NotAlerting => ("not_alerting", None),
            TriggerOutcome::Halted => ("halted", None),
            TriggerOutcome::BelowThreshold => ("below_threshold", None),
            TriggerOutcome::CoolingDown { .. } => ("cooling_down", None),
            TriggerOutcome::Duplicate(id) => ("duplicate", Some(id)),
            TriggerOutcome::Snoozed(id) => ("snoozed", Some(id)),
        };
        Self { outcome, alert_id }
    }
}

/// Get live alerts
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AlertResponse>, ApiError> {
    let (alerts, cooldown) = state.monitor.alerts()?;
    let active = alerts.iter().filter(|a| a.is_active()).count();

    Ok(Json(AlertResponse {
        count: alerts.len(),
        active_count: active,
        cooldown_remaining_ms: cooldown.map(|d| d.as_millis() as u64),
        data: alerts,
    }))
}

/// Acknowledge an alert
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<AlertEvent>, ApiError> {
    Ok(Json(state.monitor.acknowledge(id)?))
}

/// Snooze a Warning alert
pub async fn snooze(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<AlertEvent>, ApiError> {
    Ok(Json(state.monitor.snooze(id)?))
}

/// Emergency-stop on a Critical alert
pub async fn emergency_stop(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<AlertEvent>, ApiError> {
    Ok(Json(state.monitor.emergency_stop(id)?))
}
