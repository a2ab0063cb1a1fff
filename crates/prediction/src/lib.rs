//! Machine Health Prediction
//!
//! Provides the prediction collaborator: a sequence model run through
//! tract-onnx when one is loaded, and rule-based heuristics otherwise.

mod engine;
mod model;
mod onnx;
mod rules;

pub use engine::PredictionEngine;
pub use model::{ModelOutput, SequenceModel};
pub use onnx::OnnxHealthModel;
pub use rules::{rule_estimate, RuleBasedPredictor};

use health_classifier::{AggregateStatus, PARAMETER_COUNT};
use reading_buffer::ReadingHistory;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors during prediction
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Not enough history: need {required} readings, have {available}")]
    MissingHistory { required: usize, available: usize },
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
}

/// Prediction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Path to an ONNX health model; rule-based only when unset
    pub model_path: Option<String>,
    /// Readings per model input window
    pub sequence_length: usize,
    /// Minimum real readings before the model is consulted
    pub min_history: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            sequence_length: reading_buffer::DEFAULT_CAPACITY,
            min_history: 3,
        }
    }
}

/// Where a prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PredictionSource {
    /// Sequence model; `padded` when the window was filled with repeats
    Model { padded: bool },
    /// Threshold heuristics
    RuleBased,
}

/// Health prediction for the machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub status: AggregateStatus,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    /// Probabilities for Healthy, Warning, Critical
    pub health_probabilities: [f64; 3],
    /// Failure probability per parameter, in parameter order
    pub failure_probabilities: [f64; PARAMETER_COUNT],
    /// Estimated hours until failure
    pub time_to_failure_hours: f64,
    pub source: PredictionSource,
    /// Timestamp when prediction was made
    pub timestamp_ms: u64,
}

impl Prediction {
    /// Human-readable label of the prediction source
    pub fn model_label(&self) -> &'static str {
        match self.source {
            PredictionSource::Model { padded: false } => "Sequence model (full window)",
            PredictionSource::Model { padded: true } => "Sequence model (padded window)",
            PredictionSource::RuleBased => "Rule-based simulation",
        }
    }
}

/// Prediction collaborator contract
pub trait Predictor: Send + Sync {
    /// Predict machine health from the reading history
    fn predict(&self, history: &ReadingHistory) -> Result<Prediction, PredictionError>;
}
