//! Sensor Readings

use crate::parameter::{Parameter, ParameterTable, PARAMETER_COUNT};
use serde::{Deserialize, Serialize};

/// One timestamped sample of all monitored parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Capture time, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    #[serde(with = "values_by_name")]
    values: [f64; PARAMETER_COUNT],
}

impl Reading {
    /// Create a reading from values in parameter order
    pub fn new(timestamp_ms: u64, values: [f64; PARAMETER_COUNT]) -> Self {
        Self {
            timestamp_ms,
            values,
        }
    }

    /// Reading with every parameter at its table default
    pub fn defaults(table: &ParameterTable, timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms, table.defaults())
    }

    /// Value of one parameter
    pub fn get(&self, parameter: Parameter) -> f64 {
        self.values[parameter.index()]
    }

    /// Copy of this reading with one parameter changed
    pub fn with(mut self, parameter: Parameter, value: f64) -> Self {
        self.values[parameter.index()] = value;
        self
    }

    /// Raw values in parameter order
    pub fn values(&self) -> &[f64; PARAMETER_COUNT] {
        &self.values
    }

    /// Iterate (parameter, value) pairs in parameter order
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        Parameter::ALL.into_iter().map(|p| (p, self.values[p.index()]))
    }
}

/// Current wall-clock time in milliseconds
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Serializes reading values as a `{ "Temperature": 28.0, ... }` map
mod values_by_name {
    use super::{Parameter, PARAMETER_COUNT};
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        values: &[f64; PARAMETER_COUNT],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PARAMETER_COUNT))?;
        for parameter in Parameter::ALL {
            map.serialize_entry(parameter.as_str(), &values[parameter.index()])?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[f64; PARAMETER_COUNT], D::Error> {
        let named = BTreeMap::<String, f64>::deserialize(deserializer)?;
        let mut values = [f64::NAN; PARAMETER_COUNT];
        let mut seen = [false; PARAMETER_COUNT];

        for (name, value) in named {
            let parameter: Parameter = name.parse().map_err(D::Error::custom)?;
            values[parameter.index()] = value;
            seen[parameter.index()] = true;
        }

        if let Some(missing) = Parameter::ALL.into_iter().find(|p| !seen[p.index()]) {
            return Err(D::Error::custom(format!("missing parameter {missing}")));
        }
        Ok(values)
    }
}
