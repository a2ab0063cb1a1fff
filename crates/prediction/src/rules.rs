//! Rule-Based Fallback Predictor

use crate::{Prediction, PredictionError, PredictionSource, Predictor};
use health_classifier::{
    now_ms, AggregateStatus, Classification, ParameterClassifier, Tier, PARAMETER_COUNT,
};
use reading_buffer::ReadingHistory;
use tracing::debug;

/// Threshold heuristics used when no model is available.
///
/// Status comes straight from the classifier aggregate of the latest
/// reading; confidence and time to failure are fixed per status.
#[derive(Debug, Clone)]
pub struct RuleBasedPredictor {
    classifier: ParameterClassifier,
}

impl RuleBasedPredictor {
    /// Create a fallback predictor over the given classifier
    pub fn new(classifier: ParameterClassifier) -> Self {
        Self { classifier }
    }
}

/// Confidence and hours to failure the rules assign to a classification.
///
/// Confidence grows with the number of parameters in the worst tier.
pub fn rule_estimate(classification: &Classification) -> (f64, f64) {
    let counts = classification.counts();
    match classification.aggregate {
        AggregateStatus::Critical => ((0.85 + 0.05 * counts.critical as f64).min(1.0), 4.0),
        AggregateStatus::Warning => ((0.75 + 0.05 * counts.warning as f64).min(1.0), 24.0),
        AggregateStatus::Healthy => (0.95, 120.0),
    }
}

impl Predictor for RuleBasedPredictor {
    fn predict(&self, history: &ReadingHistory) -> Result<Prediction, PredictionError> {
        let latest = history.latest().ok_or(PredictionError::MissingHistory {
            required: 1,
            available: 0,
        })?;

        let classification = self.classifier.classify(latest);
        let mut failure_probabilities = [0.0; PARAMETER_COUNT];
        for assessment in &classification.per_parameter {
            failure_probabilities[assessment.parameter.index()] = match assessment.tier {
                Tier::Optimal => 0.05,
                Tier::Warning => 0.6,
                Tier::Critical => 0.9,
            };
        }

        let (confidence, time_to_failure_hours) = rule_estimate(&classification);
        let health_probabilities = match classification.aggregate {
            AggregateStatus::Critical => [0.1, 0.2, 0.7],
            AggregateStatus::Warning => [0.2, 0.7, 0.1],
            AggregateStatus::Healthy => [0.9, 0.1, 0.0],
        };

        debug!(
            "Rule-based prediction: {} (conf={:.2}, ttf={}h)",
            classification.aggregate, confidence, time_to_failure_hours
        );

        Ok(Prediction {
            status: classification.aggregate,
            confidence,
            health_probabilities,
            failure_probabilities,
            time_to_failure_hours,
            source: PredictionSource::RuleBased,
            timestamp_ms: now_ms(),
        })
    }
}
