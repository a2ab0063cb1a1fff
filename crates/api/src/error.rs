//! API Error Responses

use alerting::AlertError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use health_classifier::ValidationError;
use monitor::MonitorError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Monitor(#[from] MonitorError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<AlertError> for ApiError {
    fn from(e: AlertError) -> Self {
        ApiError::Monitor(MonitorError::Alert(e))
    }
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl ApiError {
    /// HTTP status for the error
    pub fn status_code(&self) -> StatusCode {
        let validation = match self {
            ApiError::Validation(e) | ApiError::Monitor(MonitorError::Validation(e)) => e,
            ApiError::Monitor(MonitorError::Alert(AlertError::UnknownAlert(_))) => {
                return StatusCode::NOT_FOUND
            }
            ApiError::Monitor(MonitorError::Alert(AlertError::InvalidTransition { .. })) => {
                return StatusCode::CONFLICT
            }
            ApiError::Monitor(_) => return StatusCode::INTERNAL_SERVER_ERROR,
        };

        match validation {
            ValidationError::UnknownParameter(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_classifier::Parameter;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(AlertError::UnknownAlert(1)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AlertError::InvalidTransition {
                id: 1,
                action: "snooze",
                reason: "critical".to_string(),
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(ValidationError::UnknownParameter("Pressure".to_string())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MonitorError::Validation(ValidationError::NotFinite {
                parameter: Parameter::Humidity,
                value: f64::NAN,
            }))
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(MonitorError::StatePoisoned("lock".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
