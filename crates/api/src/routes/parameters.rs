//! Parameter Routes

use axum::{
    extract::{Path, State},
    Json,
};
use health_classifier::{Parameter, ParameterSpec, Tier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::routes::alerts::OutcomeView;
use crate::AppState;

/// A parameter spec with its current set-point
#[derive(Debug, Serialize)]
pub struct ParameterView {
    #[serde(flatten)]
    pub spec: ParameterSpec,
    pub value: f64,
    pub tier: Tier,
}

/// Response for the parameters endpoint
#[derive(Debug, Serialize)]
pub struct ParametersResponse {
    pub data: Vec<ParameterView>,
    pub count: usize,
}

/// Body of a set-point change
#[derive(Debug, Deserialize)]
pub struct SetPointRequest {
    pub value: f64,
}

/// Response for a set-point change
#[derive(Debug, Serialize)]
pub struct SetPointResponse {
    pub parameter: Parameter,
    pub value: f64,
    pub tier: Tier,
    /// Present when monitoring ran an instant evaluation
    pub evaluation: Option<OutcomeView>,
}

/// List parameter specs and set-points
pub async fn list_parameters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ParametersResponse>, ApiError> {
    let values = state.monitor.panel_values()?;
    let data: Vec<_> = state
        .monitor
        .table()
        .iter()
        .map(|spec| {
            let value = values[spec.parameter.index()];
            ParameterView {
                tier: spec.tier(value),
                spec: spec.clone(),
                value,
            }
        })
        .collect();

    Ok(Json(ParametersResponse {
        count: data.len(),
        data,
    }))
}

/// Change a set-point
pub async fn set_parameter(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<SetPointRequest>,
) -> Result<Json<SetPointResponse>, ApiError> {
    let parameter: Parameter = name.parse()?;
    let outcome = state.monitor.set_parameter(parameter, body.value)?;

    Ok(Json(SetPointResponse {
        parameter,
        value: body.value,
        tier: state.monitor.table().get(parameter).tier(body.value),
        evaluation: outcome.map(OutcomeView::from),
    }))
}
