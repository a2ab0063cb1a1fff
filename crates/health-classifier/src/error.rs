//! Classifier Error Types

use crate::Parameter;
use thiserror::Error;

/// Errors raised while building a parameter table.
///
/// These are setup failures: a table that fails validation must never be
/// used for classification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Thresholds are not strictly increasing
    #[error(
        "{parameter} thresholds must be strictly increasing \
         (critical_low < warning_low < optimal_low < optimal_high < warning_high < critical_high), got {thresholds:?}"
    )]
    NonMonotonicThresholds {
        parameter: Parameter,
        thresholds: [f64; 6],
    },

    /// A numeric field is NaN or infinite
    #[error("{parameter} field {field} is not finite: {value}")]
    NonFinite {
        parameter: Parameter,
        field: &'static str,
        value: f64,
    },

    /// Declared range is empty
    #[error("{parameter} range [{min}, {max}] is empty")]
    EmptyRange {
        parameter: Parameter,
        min: f64,
        max: f64,
    },

    /// Default value lies outside the declared range
    #[error("{parameter} default {default} is outside [{min}, {max}]")]
    DefaultOutOfRange {
        parameter: Parameter,
        default: f64,
        min: f64,
        max: f64,
    },

    /// Parameter listed more than once
    #[error("Duplicate parameter spec: {0}")]
    DuplicateParameter(Parameter),

    /// Parameter has no spec
    #[error("Missing parameter spec: {0}")]
    MissingParameter(Parameter),
}

/// Errors while validating sensor input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of the parameter's declared range
    #[error("{parameter} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        parameter: Parameter,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite value
    #[error("{parameter} value {value} is not a finite number")]
    NotFinite { parameter: Parameter, value: f64 },

    /// Name does not match any monitored parameter
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
}
