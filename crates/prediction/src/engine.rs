//! Prediction Engine Implementation

use crate::model::SequenceModel;
use crate::onnx::OnnxHealthModel;
use crate::rules::RuleBasedPredictor;
use crate::{Prediction, PredictionConfig, PredictionError, PredictionSource, Predictor};
use health_classifier::{now_ms, ParameterClassifier, ParameterTable, PARAMETER_COUNT};
use reading_buffer::ReadingHistory;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Model-backed predictor with rule-based fallback.
///
/// The model is consulted once the history holds `min_history` readings;
/// shorter windows are padded up to the sequence length. Missing model,
/// short history and inference failures all fall back to the rules.
pub struct PredictionEngine {
    model: Option<Box<dyn SequenceModel>>,
    fallback: RuleBasedPredictor,
    table: Arc<ParameterTable>,
    config: PredictionConfig,
}

impl PredictionEngine {
    /// Create an engine with no model (rule-based only)
    pub fn new(table: Arc<ParameterTable>, config: PredictionConfig) -> Self {
        info!(
            "Creating prediction engine: sequence_length={}, min_history={}",
            config.sequence_length, config.min_history
        );
        Self {
            model: None,
            fallback: RuleBasedPredictor::new(ParameterClassifier::new(table.clone())),
            table,
            config,
        }
    }

    /// Create an engine, loading the configured model if any.
    ///
    /// A model that fails to load is logged and the engine runs on rules.
    pub fn from_config(table: Arc<ParameterTable>, config: PredictionConfig) -> Self {
        let model_path = config.model_path.clone();
        let sequence_length = config.sequence_length;
        let engine = Self::new(table, config);

        match model_path {
            Some(path) => match OnnxHealthModel::load(&path, sequence_length) {
                Ok(model) => engine.with_model(Box::new(model)),
                Err(e) => {
                    warn!("{}; running in rule-based mode", e);
                    engine
                }
            },
            None => {
                info!("No model configured; running in rule-based mode");
                engine
            }
        }
    }

    /// Attach a sequence model
    pub fn with_model(mut self, model: Box<dyn SequenceModel>) -> Self {
        info!("Using sequence model: {}", model.name());
        self.model = Some(model);
        self
    }

    /// Check if a model is attached
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    fn predict_with_model(
        &self,
        model: &dyn SequenceModel,
        history: &ReadingHistory,
    ) -> Result<Prediction, PredictionError> {
        let window = history
            .padded_window(self.config.sequence_length)
            .ok_or(PredictionError::MissingHistory {
                required: self.config.min_history,
                available: 0,
            })?;
        let padded = history.len() < self.config.sequence_length;

        let scaled: Vec<[f32; PARAMETER_COUNT]> = window
            .iter()
            .map(|reading| {
                let mut row = [0.0f32; PARAMETER_COUNT];
                for (parameter, value) in reading.iter() {
                    row[parameter.index()] = self.table.get(parameter).scale(value) as f32;
                }
                row
            })
            .collect();

        let output = model.infer(&scaled)?;
        let (status, confidence) = output.health_class()?;
        let failure_probabilities = output.failure_probabilities(status)?;
        let health_probabilities = [
            f64::from(output.health[0]),
            f64::from(output.health[1]),
            f64::from(output.health[2]),
        ];

        debug!(
            "Model prediction ({}): {} (conf={:.2})",
            if padded { "padded" } else { "full" },
            status,
            confidence
        );

        Ok(Prediction {
            status,
            confidence,
            health_probabilities,
            failure_probabilities,
            time_to_failure_hours: output.time_to_failure_hours(status),
            source: PredictionSource::Model { padded },
            timestamp_ms: now_ms(),
        })
    }
}

impl Predictor for PredictionEngine {
    fn predict(&self, history: &ReadingHistory) -> Result<Prediction, PredictionError> {
        match &self.model {
            Some(model) if history.len() >= self.config.min_history => {
                match self.predict_with_model(model.as_ref(), history) {
                    Ok(prediction) => return Ok(prediction),
                    Err(e) => warn!("Model prediction failed, falling back to rules: {}", e),
                }
            }
            Some(_) => debug!(
                "Insufficient history for model ({} < {}), using rules",
                history.len(),
                self.config.min_history
            ),
            None => debug!("No model loaded, using rules"),
        }

        self.fallback.predict(history)
    }
}
