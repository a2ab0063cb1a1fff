//! Per-Parameter Tier Classification

use crate::parameter::{Parameter, ParameterTable};
use crate::reading::Reading;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Severity of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Optimal,
    Warning,
    Critical,
}

/// Whole-machine health derived from all parameter tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateStatus {
    Healthy,
    Warning,
    Critical,
}

impl AggregateStatus {
    /// Aggregate a set of tiers.
    ///
    /// Critical if any tier is Critical, else Warning if any tier is
    /// Warning, else Healthy.
    pub fn from_tiers(tiers: impl IntoIterator<Item = Tier>) -> Self {
        match tiers.into_iter().max() {
            Some(Tier::Critical) => AggregateStatus::Critical,
            Some(Tier::Warning) => AggregateStatus::Warning,
            _ => AggregateStatus::Healthy,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateStatus::Healthy => "HEALTHY",
            AggregateStatus::Warning => "WARNING",
            AggregateStatus::Critical => "CRITICAL",
        }
    }

    /// Whether this status may raise an alert
    pub fn is_alerting(&self) -> bool {
        !matches!(self, AggregateStatus::Healthy)
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the optimal band a value sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deviation {
    Low,
    None,
    High,
}

/// Tier of one parameter within a reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterAssessment {
    pub parameter: Parameter,
    pub value: f64,
    pub tier: Tier,
}

/// A parameter outside its optimal band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailingParameter {
    pub parameter: Parameter,
    pub value: f64,
    pub tier: Tier,
    pub deviation: Deviation,
    pub reason: String,
}

/// Number of parameters in each tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub optimal: usize,
    pub warning: usize,
    pub critical: usize,
}

/// Result of classifying one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub timestamp_ms: u64,
    pub per_parameter: Vec<ParameterAssessment>,
    pub aggregate: AggregateStatus,
    pub failing_parameters: Vec<FailingParameter>,
}

impl Classification {
    /// Tier assigned to one parameter
    pub fn tier(&self, parameter: Parameter) -> Tier {
        self.per_parameter
            .iter()
            .find(|a| a.parameter == parameter)
            .map(|a| a.tier)
            .unwrap_or(Tier::Critical)
    }

    /// Parameters outside their optimal band, in reading order
    pub fn failing(&self) -> Vec<Parameter> {
        self.failing_parameters.iter().map(|f| f.parameter).collect()
    }

    /// Tally of tiers across all parameters
    pub fn counts(&self) -> TierCounts {
        self.per_parameter
            .iter()
            .fold(TierCounts::default(), |mut counts, a| {
                match a.tier {
                    Tier::Optimal => counts.optimal += 1,
                    Tier::Warning => counts.warning += 1,
                    Tier::Critical => counts.critical += 1,
                }
                counts
            })
    }
}

/// Stateless classifier over a validated parameter table
#[derive(Debug, Clone)]
pub struct ParameterClassifier {
    table: Arc<ParameterTable>,
}

impl ParameterClassifier {
    /// Create a classifier over the given table
    pub fn new(table: Arc<ParameterTable>) -> Self {
        Self { table }
    }

    /// Table this classifier compares against
    pub fn table(&self) -> &ParameterTable {
        &self.table
    }

    /// Classify a single reading
    pub fn classify(&self, reading: &Reading) -> Classification {
        let mut per_parameter = Vec::with_capacity(crate::PARAMETER_COUNT);
        let mut failing_parameters = Vec::new();

        for (parameter, value) in reading.iter() {
            let spec = self.table.get(parameter);
            let tier = spec.tier(value);
            per_parameter.push(ParameterAssessment {
                parameter,
                value,
                tier,
            });

            if tier != Tier::Optimal {
                failing_parameters.push(FailingParameter {
                    parameter,
                    value,
                    tier,
                    deviation: spec.deviation(value),
                    reason: spec.reason(value).to_string(),
                });
            }
        }

        Classification {
            timestamp_ms: reading.timestamp_ms,
            aggregate: AggregateStatus::from_tiers(per_parameter.iter().map(|a| a.tier)),
            per_parameter,
            failing_parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::standard_specs;
    use proptest::prelude::*;

    fn classifier() -> ParameterClassifier {
        ParameterClassifier::new(Arc::new(ParameterTable::standard().unwrap()))
    }

    fn defaults() -> Reading {
        Reading::defaults(classifier().table(), 1_000)
    }

    #[test]
    fn test_defaults_are_healthy() {
        let result = classifier().classify(&defaults().with(Parameter::Temperature, 28.0));

        assert_eq!(result.aggregate, AggregateStatus::Healthy);
        assert!(result.failing_parameters.is_empty());
        assert_eq!(result.counts().optimal, 6);
    }

    #[test]
    fn test_temperature_below_critical_low() {
        let result = classifier().classify(&defaults().with(Parameter::Temperature, 19.0));

        assert_eq!(result.tier(Parameter::Temperature), Tier::Critical);
        assert_eq!(result.aggregate, AggregateStatus::Critical);
        assert_eq!(result.failing_parameters.len(), 1);
        assert_eq!(
            result.failing_parameters[0].reason,
            "Insufficient heating system performance"
        );
        assert_eq!(result.failing_parameters[0].deviation, Deviation::Low);
        assert_eq!(result.failing(), vec![Parameter::Temperature]);
    }

    #[test]
    fn test_humidity_in_upper_warning_band() {
        let result = classifier().classify(&defaults().with(Parameter::Humidity, 72.0));

        assert_eq!(result.tier(Parameter::Humidity), Tier::Warning);
        assert_eq!(result.aggregate, AggregateStatus::Warning);
        assert_eq!(
            result.failing_parameters[0].reason,
            "Insufficient air circulation or moisture extraction"
        );
        assert_eq!(result.failing(), vec![Parameter::Humidity]);
    }

    #[test]
    fn test_band_edges() {
        let classifier = classifier();
        let spec = classifier.table().get(Parameter::Temperature);

        assert_eq!(spec.tier(26.0), Tier::Optimal);
        assert_eq!(spec.tier(30.0), Tier::Optimal);
        assert_eq!(spec.tier(22.0), Tier::Warning);
        assert_eq!(spec.tier(32.0), Tier::Warning);
        assert_eq!(spec.tier(32.5), Tier::Critical); // between warning_high and critical_high
        assert_eq!(spec.tier(21.0), Tier::Critical); // between critical_low and warning_low
        assert_eq!(spec.tier(f64::NAN), Tier::Critical);
    }

    #[test]
    fn test_transitional_zone_reason_follows_direction() {
        let result = classifier().classify(&defaults().with(Parameter::FanSpeed, 2380.0));

        let failing = &result.failing_parameters[0];
        assert_eq!(failing.tier, Tier::Critical);
        assert_eq!(failing.reason, "Control system fault or motor driver malfunction");
    }

    #[test]
    fn test_critical_dominates_warning() {
        let reading = defaults()
            .with(Parameter::Humidity, 72.0)
            .with(Parameter::FanPower, 290.0);
        let result = classifier().classify(&reading);

        assert_eq!(result.aggregate, AggregateStatus::Critical);
        let counts = result.counts();
        assert_eq!((counts.optimal, counts.warning, counts.critical), (4, 1, 1));
    }

    fn parameter_strategy() -> impl Strategy<Value = Parameter> {
        prop::sample::select(Parameter::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_outside_critical_bounds_is_critical(
            parameter in parameter_strategy(),
            offset in 0.001f64..10_000.0,
            below in any::<bool>(),
        ) {
            let classifier = classifier();
            let spec = classifier.table().get(parameter);
            let value = if below { spec.critical_low - offset } else { spec.critical_high + offset };

            prop_assert_eq!(spec.tier(value), Tier::Critical);
            let result = classifier.classify(&defaults().with(parameter, value));
            prop_assert_eq!(result.aggregate, AggregateStatus::Critical);
        }

        #[test]
        fn prop_all_optimal_is_healthy(fractions in prop::array::uniform6(0.0f64..=1.0)) {
            let classifier = classifier();
            let mut reading = defaults();
            for (spec, fraction) in standard_specs().iter().zip(fractions) {
                let value = spec.optimal_low + (spec.optimal_high - spec.optimal_low) * fraction;
                reading = reading.with(spec.parameter, value);
            }

            let result = classifier.classify(&reading);
            prop_assert_eq!(result.aggregate, AggregateStatus::Healthy);
            prop_assert!(result.failing_parameters.is_empty());
        }

        #[test]
        fn prop_classification_is_idempotent(
            parameter in parameter_strategy(),
            value in -5_000.0f64..5_000.0,
        ) {
            let classifier = classifier();
            let reading = defaults().with(parameter, value);
            prop_assert_eq!(classifier.classify(&reading), classifier.classify(&reading));
        }

        #[test]
        fn prop_failing_iff_not_optimal(
            parameter in parameter_strategy(),
            value in -5_000.0f64..5_000.0,
        ) {
            let result = classifier().classify(&defaults().with(parameter, value));
            let is_failing = result.failing_parameters.iter().any(|f| f.parameter == parameter);
            prop_assert_eq!(is_failing, result.tier(parameter) != Tier::Optimal);
        }
    }
}
