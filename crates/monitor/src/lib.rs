//! Machine Health Monitor
//!
//! Samples the sensor panel on a fixed cadence and on every set-point
//! change, then runs classification, prediction and alert coordination
//! under a single lock.

mod monitor;
mod panel;

pub use monitor::{Monitor, MonitorSnapshot, Trigger};
pub use panel::SensorPanel;

use alerting::{AlertConfig, AlertError};
use health_classifier::ValidationError;
use prediction::{PredictionConfig, PredictionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from monitor operations
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error(transparent)]
    Alert(#[from] AlertError),
    #[error("Monitor state poisoned: {0}")]
    StatePoisoned(String),
}

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Polling period in milliseconds (default: 1000)
    pub poll_interval_ms: u64,
    /// Readings kept for the prediction window
    pub history_capacity: usize,
    /// Alert coordination settings
    pub alert: AlertConfig,
    /// Prediction settings
    pub prediction: PredictionConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            history_capacity: reading_buffer::DEFAULT_CAPACITY,
            alert: AlertConfig::default(),
            prediction: PredictionConfig::default(),
        }
    }
}
