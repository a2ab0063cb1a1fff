//! Sequence Model Contract

use crate::PredictionError;
use health_classifier::{AggregateStatus, PARAMETER_COUNT};

/// Raw outputs of a health model.
///
/// Models differ in how many heads they expose; only the health
/// classification head is required.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    /// Healthy/Warning/Critical scores
    pub health: Vec<f32>,
    /// Per-parameter failure probabilities
    pub failure: Option<Vec<f32>>,
    /// Hours until failure
    pub time_to_failure: Option<f32>,
}

impl ModelOutput {
    /// Interpret output tensors by count: health, then failure, then time to failure
    pub fn from_outputs(mut outputs: Vec<Vec<f32>>) -> Result<Self, PredictionError> {
        if outputs.is_empty() {
            return Err(PredictionError::InvalidOutput("model produced no outputs".to_string()));
        }
        let time_to_failure = if outputs.len() > 2 {
            outputs.remove(2).first().copied()
        } else {
            None
        };
        let failure = if outputs.len() > 1 { Some(outputs.remove(1)) } else { None };
        let health = outputs.remove(0);

        Ok(Self {
            health,
            failure,
            time_to_failure,
        })
    }

    /// Winning health class and its score
    pub fn health_class(&self) -> Result<(AggregateStatus, f64), PredictionError> {
        if self.health.len() != 3 {
            return Err(PredictionError::InvalidOutput(format!(
                "expected 3 health scores, got {}",
                self.health.len()
            )));
        }

        let (index, score) = self
            .health
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, s)| if s > best.1 { (i, s) } else { best });

        let status = match index {
            0 => AggregateStatus::Healthy,
            1 => AggregateStatus::Warning,
            _ => AggregateStatus::Critical,
        };
        Ok((status, f64::from(score)))
    }

    /// Failure probabilities, derived from the health class when the
    /// model has no failure head
    pub fn failure_probabilities(
        &self,
        status: AggregateStatus,
    ) -> Result<[f64; PARAMETER_COUNT], PredictionError> {
        match &self.failure {
            Some(values) if values.len() == PARAMETER_COUNT => {
                let mut out = [0.0; PARAMETER_COUNT];
                for (slot, value) in out.iter_mut().zip(values) {
                    *slot = f64::from(*value).clamp(0.0, 1.0);
                }
                Ok(out)
            }
            Some(values) => Err(PredictionError::InvalidOutput(format!(
                "expected {} failure probabilities, got {}",
                PARAMETER_COUNT,
                values.len()
            ))),
            None => {
                let derived = match status {
                    AggregateStatus::Critical => 0.8,
                    AggregateStatus::Warning => 0.5,
                    AggregateStatus::Healthy => 0.15,
                };
                Ok([derived; PARAMETER_COUNT])
            }
        }
    }

    /// Hours until failure, derived from the health class when the model
    /// has no time head; never below one hour
    pub fn time_to_failure_hours(&self, status: AggregateStatus) -> f64 {
        let hours = match self.time_to_failure {
            Some(hours) if hours.is_finite() => f64::from(hours),
            _ => match status {
                AggregateStatus::Critical => 8.0,
                AggregateStatus::Warning => 48.0,
                AggregateStatus::Healthy => 120.0,
            },
        };
        hours.max(1.0)
    }
}

/// A trained model over fixed-length windows of scaled readings
pub trait SequenceModel: Send + Sync {
    /// Run the model on one window, oldest reading first
    fn infer(&self, window: &[[f32; PARAMETER_COUNT]]) -> Result<ModelOutput, PredictionError>;

    /// Short name for logs
    fn name(&self) -> &str;
}
