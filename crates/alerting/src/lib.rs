//! Alerting System
//!
//! Decides when machine-health alerts become active, deduplicates them by
//! identity, and applies the acknowledge/snooze/emergency-stop lifecycle
//! with a shared cooldown window.

mod coordinator;
mod record;

pub use coordinator::{AlertConfig, AlertCoordinator, Evaluation, TriggerOutcome};
pub use record::{AlertEvent, AlertIdentity, AlertRecord, AlertState, AlertTrigger};

use thiserror::Error;

/// Errors from alert commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    #[error("Unknown alert: {0}")]
    UnknownAlert(u64),
    #[error("Cannot {action} alert {id}: {reason}")]
    InvalidTransition {
        id: u64,
        action: &'static str,
        reason: String,
    },
}
