//! Sensor Panel

use health_classifier::{Parameter, ParameterTable, Reading, ValidationError, PARAMETER_COUNT};
use std::sync::Arc;
use tracing::debug;

/// Current set-point of every parameter
#[derive(Debug, Clone)]
pub struct SensorPanel {
    table: Arc<ParameterTable>,
    values: [f64; PARAMETER_COUNT],
}

impl SensorPanel {
    /// Create a panel at the table's default values
    pub fn new(table: Arc<ParameterTable>) -> Self {
        let values = table.defaults();
        Self { table, values }
    }

    /// Change one set-point; out-of-range and non-finite values are rejected
    pub fn set(&mut self, parameter: Parameter, value: f64) -> Result<(), ValidationError> {
        self.table.get(parameter).check_value(value)?;
        debug!("Panel {} = {}", parameter, value);
        self.values[parameter.index()] = value;
        Ok(())
    }

    /// Current value of one parameter
    pub fn get(&self, parameter: Parameter) -> f64 {
        self.values[parameter.index()]
    }

    /// Restore every set-point to its default
    pub fn reset(&mut self) {
        self.values = self.table.defaults();
    }

    /// Sample the panel
    pub fn sample(&self, timestamp_ms: u64) -> Reading {
        Reading::new(timestamp_ms, self.values)
    }

    /// Table the panel validates against
    pub fn table(&self) -> &ParameterTable {
        &self.table
    }
}
