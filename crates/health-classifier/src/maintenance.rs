//! Maintenance Recommendations

use crate::classifier::{Deviation, FailingParameter, Tier};
use crate::parameter::Parameter;
use serde::Serialize;

/// Urgency of a maintenance action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

/// A suggested maintenance action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: &'static str,
    pub description: &'static str,
    pub timeline: &'static str,
    /// Parameter the action targets, if any
    pub parameter: Option<Parameter>,
}

/// Build recommendations from the estimated time to failure and the
/// parameters currently outside their optimal band.
///
/// The first entry is always the time-based recommendation.
pub fn recommend(time_to_failure_hours: f64, failing: &[FailingParameter]) -> Vec<Recommendation> {
    let mut recommendations = Vec::with_capacity(failing.len() + 1);
    recommendations.push(time_based(time_to_failure_hours));

    for parameter in failing {
        let high = parameter.tier == Tier::Critical;
        let priority = if high { Priority::High } else { Priority::Medium };
        let soon = |urgent: &'static str| if high { urgent } else { "Next maintenance window" };

        let (action, description, timeline) = match (parameter.parameter, parameter.deviation) {
            (Parameter::Temperature, Deviation::Low) => (
                "Heating System Check",
                "Inspect heating elements, temperature sensors, and control systems.",
                soon("Next 24 hours"),
            ),
            (Parameter::Temperature, _) => (
                "Cooling System Check",
                "Inspect ventilation, fans, and temperature control systems.",
                soon("Next 24 hours"),
            ),
            (Parameter::FanSpeed, _) => (
                "Motor and Drive Inspection",
                "Check motor bearings, belt tension, electrical connections, and drive system.",
                soon("Next 12 hours"),
            ),
            (Parameter::AirFlowRate, _) => (
                "Airflow System Maintenance",
                "Clean air filters, check ductwork, inspect fan blades and housing.",
                soon("Next 24 hours"),
            ),
            (Parameter::Humidity, _) => (
                "Moisture Control Check",
                "Inspect dampers, air intake, and moisture extraction path.",
                soon("Next 24 hours"),
            ),
            (Parameter::HeatingPower, _) => (
                "Heating Element Inspection",
                "Check heating element resistance, power supply, and temperature controller calibration.",
                soon("Next 24 hours"),
            ),
            (Parameter::FanPower, _) => (
                "Fan Motor Electrical Check",
                "Measure motor current draw, inspect bearings and wiring for faults.",
                soon("Next 12 hours"),
            ),
        };

        recommendations.push(Recommendation {
            priority,
            action,
            description,
            timeline,
            parameter: Some(parameter.parameter),
        });
    }

    recommendations
}

fn time_based(time_to_failure_hours: f64) -> Recommendation {
    let (priority, action, description, timeline) = if time_to_failure_hours < 8.0 {
        (
            Priority::Urgent,
            "Immediate System Shutdown",
            "Critical failure predicted within 8 hours. Stop operations immediately.",
            "NOW",
        )
    } else if time_to_failure_hours < 24.0 {
        (
            Priority::High,
            "Emergency Maintenance",
            "Schedule emergency maintenance within the next shift.",
            "Within 4 hours",
        )
    } else if time_to_failure_hours < 72.0 {
        (
            Priority::Medium,
            "Planned Maintenance",
            "Schedule maintenance within 48 hours to prevent failure.",
            "Within 2 days",
        )
    } else {
        (
            Priority::Low,
            "Routine Inspection",
            "Continue normal operations with increased monitoring.",
            "Next scheduled maintenance",
        )
    };

    Recommendation {
        priority,
        action,
        description,
        timeline,
        parameter: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(parameter: Parameter, tier: Tier, deviation: Deviation) -> FailingParameter {
        FailingParameter {
            parameter,
            value: 0.0,
            tier,
            deviation,
            reason: String::new(),
        }
    }

    #[test]
    fn test_time_based_priority() {
        assert_eq!(recommend(4.0, &[])[0].priority, Priority::Urgent);
        assert_eq!(recommend(12.0, &[])[0].priority, Priority::High);
        assert_eq!(recommend(48.0, &[])[0].priority, Priority::Medium);
        assert_eq!(recommend(120.0, &[])[0].priority, Priority::Low);
    }

    #[test]
    fn test_temperature_direction() {
        let low = recommend(120.0, &[failing(Parameter::Temperature, Tier::Critical, Deviation::Low)]);
        assert_eq!(low[1].action, "Heating System Check");
        assert_eq!(low[1].priority, Priority::High);
        assert_eq!(low[1].timeline, "Next 24 hours");

        let high = recommend(120.0, &[failing(Parameter::Temperature, Tier::Warning, Deviation::High)]);
        assert_eq!(high[1].action, "Cooling System Check");
        assert_eq!(high[1].priority, Priority::Medium);
        assert_eq!(high[1].timeline, "Next maintenance window");
    }

    #[test]
    fn test_one_entry_per_failing_parameter() {
        let recs = recommend(
            30.0,
            &[
                failing(Parameter::FanSpeed, Tier::Critical, Deviation::Low),
                failing(Parameter::AirFlowRate, Tier::Warning, Deviation::Low),
            ],
        );
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[1].timeline, "Next 12 hours");
        assert_eq!(recs[2].parameter, Some(Parameter::AirFlowRate));
    }
}
