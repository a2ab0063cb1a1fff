//! Alert Records and Events

use health_classifier::{AggregateStatus, Classification, FailingParameter, Parameter};
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;

/// Deduplication key: aggregate status plus the sorted set of parameters
/// outside their optimal band
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AlertIdentity {
    pub status: AggregateStatus,
    pub parameters: Vec<Parameter>,
}

impl AlertIdentity {
    /// Create an identity; parameters are sorted by name and deduplicated
    pub fn new(status: AggregateStatus, mut parameters: Vec<Parameter>) -> Self {
        parameters.sort_by_key(|p| p.as_str());
        parameters.dedup();
        Self { status, parameters }
    }
}

impl fmt::Display for AlertIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_", self.status)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            f.write_str(parameter.as_str())?;
        }
        Ok(())
    }
}

/// Input to the coordinator for one evaluated reading
#[derive(Debug, Clone, PartialEq)]
pub struct AlertTrigger {
    pub status: AggregateStatus,
    /// Parameters outside their optimal band
    pub parameters: Vec<Parameter>,
    pub failing_parameters: Vec<FailingParameter>,
    /// Prediction confidence (0.0 to 1.0)
    pub confidence: f64,
    /// Predicted hours until failure
    pub time_to_failure_hours: f64,
}

impl AlertTrigger {
    /// Build a trigger from a classification and the prediction's
    /// confidence and time to failure
    pub fn new(classification: &Classification, confidence: f64, time_to_failure_hours: f64) -> Self {
        Self {
            status: classification.aggregate,
            parameters: classification.failing(),
            failing_parameters: classification.failing_parameters.clone(),
            confidence,
            time_to_failure_hours,
        }
    }

    /// Deduplication identity of this trigger
    pub fn identity(&self) -> AlertIdentity {
        AlertIdentity::new(self.status, self.parameters.clone())
    }
}

/// Lifecycle state of a live record; Inactive alerts have no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Active,
    Snoozed,
}

/// An alert owned by the coordinator
#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    pub id: u64,
    pub identity: AlertIdentity,
    pub state: AlertState,
    /// Wall-clock creation time, milliseconds since the Unix epoch
    pub created_at_ms: u64,
    pub confidence: f64,
    pub time_to_failure_hours: f64,
    pub failing_parameters: Vec<FailingParameter>,
    #[serde(skip)]
    pub(crate) raised_at: Instant,
    #[serde(skip)]
    pub(crate) snoozed_until: Option<Instant>,
}

impl AlertRecord {
    /// Status of the alert
    pub fn status(&self) -> AggregateStatus {
        self.identity.status
    }

    /// Check if the record is Active
    pub fn is_active(&self) -> bool {
        self.state == AlertState::Active
    }
}

/// Lifecycle event published to alert sinks
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AlertEvent {
    Raised { alert: AlertRecord },
    Acknowledged { id: u64, identity: AlertIdentity },
    Snoozed {
        id: u64,
        identity: AlertIdentity,
        rearm_after_seconds: u64,
    },
    Rearmed { id: u64, identity: AlertIdentity },
    Expired { id: u64, identity: AlertIdentity },
    EmergencyStopped { id: u64, identity: AlertIdentity },
    Reset,
}

impl AlertEvent {
    /// Alert id the event refers to, if any
    pub fn alert_id(&self) -> Option<u64> {
        match self {
            AlertEvent::Raised { alert } => Some(alert.id),
            AlertEvent::Acknowledged { id, .. }
            | AlertEvent::Snoozed { id, .. }
            | AlertEvent::Rearmed { id, .. }
            | AlertEvent::Expired { id, .. }
            | AlertEvent::EmergencyStopped { id, .. } => Some(*id),
            AlertEvent::Reset => None,
        }
    }
}
