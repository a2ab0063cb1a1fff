//! Monitored Parameters and Threshold Tables

use crate::classifier::{Deviation, Tier};
use crate::error::{ConfigurationError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Number of monitored parameters
pub const PARAMETER_COUNT: usize = 6;

/// A monitored machine parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    Temperature,
    Humidity,
    #[serde(rename = "Air_Flow_Rate")]
    AirFlowRate,
    #[serde(rename = "Fan_Speed")]
    FanSpeed,
    #[serde(rename = "Heating_Power")]
    HeatingPower,
    #[serde(rename = "Fan_Power")]
    FanPower,
}

impl Parameter {
    /// All parameters in reading order
    pub const ALL: [Parameter; PARAMETER_COUNT] = [
        Parameter::Temperature,
        Parameter::Humidity,
        Parameter::AirFlowRate,
        Parameter::FanSpeed,
        Parameter::HeatingPower,
        Parameter::FanPower,
    ];

    /// Position of this parameter within a reading
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature",
            Parameter::Humidity => "Humidity",
            Parameter::AirFlowRate => "Air_Flow_Rate",
            Parameter::FanSpeed => "Fan_Speed",
            Parameter::HeatingPower => "Heating_Power",
            Parameter::FanPower => "Fan_Power",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownParameter(s.to_string()))
    }
}

/// Static description of one monitored parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub parameter: Parameter,
    pub unit: String,
    /// Lowest value the sensor panel accepts
    pub min: f64,
    /// Highest value the sensor panel accepts
    pub max: f64,
    /// Initial panel value
    pub default: f64,
    pub critical_low: f64,
    pub warning_low: f64,
    pub optimal_low: f64,
    pub optimal_high: f64,
    pub warning_high: f64,
    pub critical_high: f64,
    /// Failure reason reported when the value is below the optimal band
    pub reason_low: String,
    /// Failure reason reported when the value is above the optimal band
    pub reason_high: String,
}

impl ParameterSpec {
    /// Thresholds in ascending order
    pub fn thresholds(&self) -> [f64; 6] {
        [
            self.critical_low,
            self.warning_low,
            self.optimal_low,
            self.optimal_high,
            self.warning_high,
            self.critical_high,
        ]
    }

    /// Check the spec is usable for classification
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let fields = [
            ("min", self.min),
            ("max", self.max),
            ("default", self.default),
            ("critical_low", self.critical_low),
            ("warning_low", self.warning_low),
            ("optimal_low", self.optimal_low),
            ("optimal_high", self.optimal_high),
            ("warning_high", self.warning_high),
            ("critical_high", self.critical_high),
        ];
        if let Some((field, value)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigurationError::NonFinite {
                parameter: self.parameter,
                field,
                value,
            });
        }

        if self.min >= self.max {
            return Err(ConfigurationError::EmptyRange {
                parameter: self.parameter,
                min: self.min,
                max: self.max,
            });
        }

        if self.default < self.min || self.default > self.max {
            return Err(ConfigurationError::DefaultOutOfRange {
                parameter: self.parameter,
                default: self.default,
                min: self.min,
                max: self.max,
            });
        }

        let thresholds = self.thresholds();
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigurationError::NonMonotonicThresholds {
                parameter: self.parameter,
                thresholds,
            });
        }

        Ok(())
    }

    /// Tier of a value against this parameter's bands.
    ///
    /// Total over f64: anything not inside the optimal or warning bands,
    /// NaN included, is Critical.
    pub fn tier(&self, value: f64) -> Tier {
        if self.optimal_low <= value && value <= self.optimal_high {
            Tier::Optimal
        } else if (self.warning_low <= value && value < self.optimal_low)
            || (self.optimal_high < value && value <= self.warning_high)
        {
            Tier::Warning
        } else {
            Tier::Critical
        }
    }

    /// Which side of the optimal band a value falls on
    pub fn deviation(&self, value: f64) -> Deviation {
        if value < self.optimal_low {
            Deviation::Low
        } else if value <= self.optimal_high {
            Deviation::None
        } else {
            Deviation::High
        }
    }

    /// Failure reason for a value outside the optimal band
    pub fn reason(&self, value: f64) -> &str {
        if value < self.optimal_low {
            &self.reason_low
        } else {
            &self.reason_high
        }
    }

    /// Min-max scale a value against the declared range
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }

    /// Check a sensor value is finite and inside the declared range
    pub fn check_value(&self, value: f64) -> Result<(), ValidationError> {
        if !value.is_finite() {
            Err(ValidationError::NotFinite {
                parameter: self.parameter,
                value,
            })
        } else if value < self.min || value > self.max {
            Err(ValidationError::OutOfRange {
                parameter: self.parameter,
                value,
                min: self.min,
                max: self.max,
            })
        } else {
            Ok(())
        }
    }
}

/// Validated set of specs, exactly one per parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    specs: [ParameterSpec; PARAMETER_COUNT],
}

impl ParameterTable {
    /// Build a table, validating every spec
    pub fn new(specs: Vec<ParameterSpec>) -> Result<Self, ConfigurationError> {
        let mut slots: [Option<ParameterSpec>; PARAMETER_COUNT] = Default::default();

        for spec in specs {
            spec.validate()?;
            let slot = &mut slots[spec.parameter.index()];
            if slot.is_some() {
                return Err(ConfigurationError::DuplicateParameter(spec.parameter));
            }
            *slot = Some(spec);
        }

        let [temperature, humidity, air_flow_rate, fan_speed, heating_power, fan_power] = slots;
        let missing = ConfigurationError::MissingParameter;
        let specs = [
            temperature.ok_or(missing(Parameter::Temperature))?,
            humidity.ok_or(missing(Parameter::Humidity))?,
            air_flow_rate.ok_or(missing(Parameter::AirFlowRate))?,
            fan_speed.ok_or(missing(Parameter::FanSpeed))?,
            heating_power.ok_or(missing(Parameter::HeatingPower))?,
            fan_power.ok_or(missing(Parameter::FanPower))?,
        ];

        debug!("Validated parameter table with {} specs", PARAMETER_COUNT);
        Ok(Self { specs })
    }

    /// The factory's standard drying-line table
    pub fn standard() -> Result<Self, ConfigurationError> {
        Self::new(standard_specs())
    }

    /// Standard table with some specs replaced
    pub fn with_overrides(overrides: Vec<ParameterSpec>) -> Result<Self, ConfigurationError> {
        let mut specs = standard_specs();
        let mut seen = Vec::with_capacity(overrides.len());
        for spec in overrides {
            if seen.contains(&spec.parameter) {
                return Err(ConfigurationError::DuplicateParameter(spec.parameter));
            }
            seen.push(spec.parameter);
            let index = spec.parameter.index();
            specs[index] = spec;
        }
        Self::new(specs)
    }

    /// Spec for one parameter
    pub fn get(&self, parameter: Parameter) -> &ParameterSpec {
        &self.specs[parameter.index()]
    }

    /// Iterate specs in reading order
    pub fn iter(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs.iter()
    }

    /// Default value of every parameter
    pub fn defaults(&self) -> [f64; PARAMETER_COUNT] {
        let mut values = [0.0; PARAMETER_COUNT];
        for spec in &self.specs {
            values[spec.parameter.index()] = spec.default;
        }
        values
    }
}

fn spec(
    parameter: Parameter,
    unit: &str,
    (min, max, default): (f64, f64, f64),
    [critical_low, warning_low, optimal_low, optimal_high, warning_high, critical_high]: [f64; 6],
    reason_low: &str,
    reason_high: &str,
) -> ParameterSpec {
    ParameterSpec {
        parameter,
        unit: unit.to_string(),
        min,
        max,
        default,
        critical_low,
        warning_low,
        optimal_low,
        optimal_high,
        warning_high,
        critical_high,
        reason_low: reason_low.to_string(),
        reason_high: reason_high.to_string(),
    }
}

/// Specs for the six parameters of the drying line
pub fn standard_specs() -> Vec<ParameterSpec> {
    vec![
        spec(
            Parameter::Temperature,
            "°C",
            (15.0, 40.0, 28.0),
            [20.0, 22.0, 26.0, 30.0, 32.0, 35.0],
            "Insufficient heating system performance",
            "Overheating due to poor ventilation or heating system malfunction",
        ),
        spec(
            Parameter::Humidity,
            "%",
            (30.0, 90.0, 65.0),
            [40.0, 45.0, 60.0, 70.0, 75.0, 80.0],
            "Excessive moisture removal or air intake issues",
            "Insufficient air circulation or moisture extraction",
        ),
        spec(
            Parameter::AirFlowRate,
            "CFM",
            (60.0, 180.0, 120.0),
            [80.0, 90.0, 110.0, 130.0, 140.0, 150.0],
            "Fan degradation, blockage, or air intake restrictions",
            "Fan motor overcurrent or control system malfunction",
        ),
        spec(
            Parameter::FanSpeed,
            "RPM",
            (1500.0, 2800.0, 2200.0),
            [1800.0, 1900.0, 2100.0, 2300.0, 2350.0, 2400.0],
            "Motor bearing wear, electrical supply issues, or mechanical load",
            "Control system fault or motor driver malfunction",
        ),
        spec(
            Parameter::HeatingPower,
            "kW",
            (8.0, 20.0, 15.0),
            [12.0, 13.0, 14.0, 16.0, 17.0, 18.0],
            "Heating element degradation or power supply issues",
            "Temperature control malfunction or sensor drift",
        ),
        spec(
            Parameter::FanPower,
            "W",
            (150.0, 300.0, 225.0),
            [180.0, 190.0, 210.0, 240.0, 260.0, 270.0],
            "Motor efficiency degradation or mechanical issues",
            "Motor overload, bearing problems, or electrical faults",
        ),
    ]
}
