//! Machine Health Classification
//!
//! Provides the parameter threshold tables, sensor readings, per-parameter
//! tier classification and maintenance recommendations for the tea-factory
//! drying line.

mod classifier;
mod error;
mod maintenance;
mod parameter;
mod reading;

pub use classifier::{
    AggregateStatus, Classification, Deviation, FailingParameter, ParameterAssessment,
    ParameterClassifier, Tier, TierCounts,
};
pub use error::{ConfigurationError, ValidationError};
pub use maintenance::{recommend, Priority, Recommendation};
pub use parameter::{standard_specs, Parameter, ParameterSpec, ParameterTable, PARAMETER_COUNT};
pub use reading::{now_ms, Reading};
