//! Alert Coordinator Implementation

use crate::record::{AlertEvent, AlertIdentity, AlertRecord, AlertState, AlertTrigger};
use crate::AlertError;
use health_classifier::{now_ms, AggregateStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Confidence a Critical prediction must exceed (default: 0.80)
    pub critical_confidence_threshold: f64,
    /// Time to failure a Critical prediction must be under (hours)
    pub critical_max_time_to_failure_hours: f64,
    /// Confidence a Warning prediction must exceed (default: 0.70)
    pub warning_confidence_threshold: f64,
    /// Time to failure a Warning prediction must be under (hours)
    pub warning_max_time_to_failure_hours: f64,
    /// Quiet period after any alert is dismissed (seconds)
    pub cooldown_seconds: u64,
    /// How long a snoozed identity stays blocked (seconds)
    pub snooze_seconds: u64,
    /// Age at which an unattended Warning alert expires (seconds)
    pub warning_auto_expire_seconds: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            critical_confidence_threshold: 0.80,
            critical_max_time_to_failure_hours: 24.0,
            warning_confidence_threshold: 0.70,
            warning_max_time_to_failure_hours: 48.0,
            cooldown_seconds: 5,
            snooze_seconds: 300, // 5 minutes
            warning_auto_expire_seconds: 300,
        }
    }
}

impl AlertConfig {
    fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    /// Check whether a trigger clears the confidence/time-to-failure gate
    pub fn passes_gate(&self, trigger: &AlertTrigger) -> bool {
        match trigger.status {
            AggregateStatus::Critical => {
                trigger.confidence > self.critical_confidence_threshold
                    && trigger.time_to_failure_hours < self.critical_max_time_to_failure_hours
            }
            AggregateStatus::Warning => {
                trigger.confidence > self.warning_confidence_threshold
                    && trigger.time_to_failure_hours < self.warning_max_time_to_failure_hours
            }
            AggregateStatus::Healthy => false,
        }
    }
}

/// What happened to a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new record became Active
    Raised(u64),
    /// Aggregate status is Healthy
    NotAlerting,
    /// Session halted by an emergency stop
    Halted,
    /// Confidence or time to failure outside the gate
    BelowThreshold,
    /// Cooldown window still open
    CoolingDown { remaining: Duration },
    /// Same identity already Active
    Duplicate(u64),
    /// Same identity snoozed and not yet re-armed
    Snoozed(u64),
}

/// Result of evaluating one trigger
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub outcome: TriggerOutcome,
    /// Events in the order they occurred, housekeeping first
    pub events: Vec<AlertEvent>,
}

/// Owner of all alert records and the shared cooldown window
pub struct AlertCoordinator {
    /// Configuration
    config: AlertConfig,
    /// Live records by identity
    records: HashMap<AlertIdentity, AlertRecord>,
    /// No activation before this instant
    cooldown_until: Option<Instant>,
    /// Set by an emergency stop until the session resumes
    halted: bool,
    /// Next alert id
    next_id: u64,
}

impl AlertCoordinator {
    /// Create a new alert coordinator
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert coordinator with config: {:?}", config);
        Self {
            config,
            records: HashMap::new(),
            cooldown_until: None,
            halted: false,
            next_id: 1,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Evaluate a trigger, possibly raising a new alert
    pub fn evaluate(&mut self, trigger: &AlertTrigger) -> Evaluation {
        let now = Instant::now();
        let mut events = self.housekeep_at(now);
        let outcome = self.decide(trigger, now);

        if let TriggerOutcome::Raised(id) = outcome {
            let identity = trigger.identity();
            if let Some(record) = self.records.get(&identity) {
                events.push(AlertEvent::Raised {
                    alert: record.clone(),
                });
            }
            info!("Alert raised: {} (id {})", identity, id);
        }

        Evaluation { outcome, events }
    }

    fn decide(&mut self, trigger: &AlertTrigger, now: Instant) -> TriggerOutcome {
        if !trigger.status.is_alerting() {
            return TriggerOutcome::NotAlerting;
        }

        if self.halted {
            debug!("Alert suppressed: session halted by emergency stop");
            return TriggerOutcome::Halted;
        }

        if !self.config.passes_gate(trigger) {
            debug!(
                "Alert suppressed: {} conf={:.2} ttf={:.1}h outside gate",
                trigger.status, trigger.confidence, trigger.time_to_failure_hours
            );
            return TriggerOutcome::BelowThreshold;
        }

        if let Some(until) = self.cooldown_until {
            if now < until {
                let remaining = until - now;
                debug!("Alert suppressed: cooldown active for {:?}", remaining);
                return TriggerOutcome::CoolingDown { remaining };
            }
        }

        let identity = trigger.identity();
        if let Some(existing) = self.records.get(&identity) {
            return match existing.state {
                AlertState::Active => {
                    debug!("Alert suppressed: {} already active", identity);
                    TriggerOutcome::Duplicate(existing.id)
                }
                AlertState::Snoozed => {
                    debug!("Alert suppressed: {} snoozed", identity);
                    TriggerOutcome::Snoozed(existing.id)
                }
            };
        }

        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(
            identity.clone(),
            AlertRecord {
                id,
                identity,
                state: AlertState::Active,
                created_at_ms: now_ms(),
                confidence: trigger.confidence,
                time_to_failure_hours: trigger.time_to_failure_hours,
                failing_parameters: trigger.failing_parameters.clone(),
                raised_at: now,
                snoozed_until: None,
            },
        );
        TriggerOutcome::Raised(id)
    }

    /// Process snooze re-arming and Warning auto-expiry
    pub fn housekeep(&mut self) -> Vec<AlertEvent> {
        self.housekeep_at(Instant::now())
    }

    fn housekeep_at(&mut self, now: Instant) -> Vec<AlertEvent> {
        let expire_after = Duration::from_secs(self.config.warning_auto_expire_seconds);
        let mut rearmed = Vec::new();
        let mut expired = Vec::new();

        for (identity, record) in &self.records {
            match record.state {
                AlertState::Snoozed if record.snoozed_until.map_or(true, |t| now >= t) => {
                    rearmed.push(identity.clone());
                }
                AlertState::Active
                    if record.status() == AggregateStatus::Warning
                        && now >= record.raised_at + expire_after =>
                {
                    expired.push(identity.clone());
                }
                _ => {}
            }
        }

        let mut events = Vec::with_capacity(rearmed.len() + expired.len());
        for identity in rearmed {
            if let Some(record) = self.records.remove(&identity) {
                info!("Snooze elapsed, re-armed: {}", identity);
                events.push(AlertEvent::Rearmed {
                    id: record.id,
                    identity,
                });
            }
        }
        for identity in expired {
            if let Some(record) = self.records.remove(&identity) {
                info!("Warning alert expired unattended: {}", identity);
                self.cooldown_until = Some(now + self.config.cooldown());
                events.push(AlertEvent::Expired {
                    id: record.id,
                    identity,
                });
            }
        }
        events
    }

    fn active_record(&self, id: u64, action: &'static str) -> Result<&AlertRecord, AlertError> {
        let record = self
            .records
            .values()
            .find(|r| r.id == id)
            .ok_or(AlertError::UnknownAlert(id))?;

        if !record.is_active() {
            return Err(AlertError::InvalidTransition {
                id,
                action,
                reason: "alert is snoozed".to_string(),
            });
        }
        Ok(record)
    }

    /// Acknowledge an active alert
    pub fn acknowledge(&mut self, id: u64) -> Result<AlertEvent, AlertError> {
        let identity = self.active_record(id, "acknowledge")?.identity.clone();
        let now = Instant::now();

        self.records.remove(&identity);
        self.cooldown_until = Some(now + self.config.cooldown());
        info!("Alert acknowledged: {} (cooldown {}s)", identity, self.config.cooldown_seconds);

        Ok(AlertEvent::Acknowledged { id, identity })
    }

    /// Snooze an active Warning alert
    pub fn snooze(&mut self, id: u64) -> Result<AlertEvent, AlertError> {
        let record = self.active_record(id, "snooze")?;
        if record.status() != AggregateStatus::Warning {
            return Err(AlertError::InvalidTransition {
                id,
                action: "snooze",
                reason: format!("only WARNING alerts can be snoozed, this one is {}", record.status()),
            });
        }
        let identity = record.identity.clone();
        let now = Instant::now();

        if let Some(record) = self.records.get_mut(&identity) {
            record.state = AlertState::Snoozed;
            record.snoozed_until = Some(now + Duration::from_secs(self.config.snooze_seconds));
        }
        self.cooldown_until = Some(now + self.config.cooldown());
        info!("Alert snoozed for {}s: {}", self.config.snooze_seconds, identity);

        Ok(AlertEvent::Snoozed {
            id,
            identity,
            rearm_after_seconds: self.config.snooze_seconds,
        })
    }

    /// Dismiss an active Critical alert and halt the session
    pub fn emergency_stop(&mut self, id: u64) -> Result<AlertEvent, AlertError> {
        let record = self.active_record(id, "emergency-stop")?;
        if record.status() != AggregateStatus::Critical {
            return Err(AlertError::InvalidTransition {
                id,
                action: "emergency-stop",
                reason: format!("only CRITICAL alerts trigger an emergency stop, this one is {}", record.status()),
            });
        }
        let identity = record.identity.clone();
        let now = Instant::now();

        self.records.remove(&identity);
        self.cooldown_until = Some(now + self.config.cooldown());
        self.halted = true;
        warn!("Emergency stop on alert {}: {}", id, identity);

        Ok(AlertEvent::EmergencyStopped { id, identity })
    }

    /// Drop every record, the cooldown and any halt
    pub fn reset(&mut self) -> AlertEvent {
        info!("Resetting alert coordinator ({} records dropped)", self.records.len());
        self.records.clear();
        self.cooldown_until = None;
        self.halted = false;
        AlertEvent::Reset
    }

    /// Allow activation again after an emergency stop
    pub fn resume(&mut self) {
        if self.halted {
            info!("Alert session resumed");
        }
        self.halted = false;
    }

    /// Check if an emergency stop halted the session
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Get a record by id
    pub fn get(&self, id: u64) -> Option<&AlertRecord> {
        self.records.values().find(|r| r.id == id)
    }

    /// All live records (active and snoozed), oldest first
    pub fn records(&self) -> Vec<AlertRecord> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Number of Active records
    pub fn active_count(&self) -> usize {
        self.records.values().filter(|r| r.is_active()).count()
    }

    /// Time left in the cooldown window
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        let until = self.cooldown_until?;
        let now = Instant::now();
        (now < until).then(|| until - now)
    }
}

impl Default for AlertCoordinator {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_classifier::Parameter;

    fn critical(parameters: Vec<Parameter>) -> AlertTrigger {
        AlertTrigger {
            status: AggregateStatus::Critical,
            parameters,
            failing_parameters: Vec::new(),
            confidence: 0.9,
            time_to_failure_hours: 4.0,
        }
    }

    fn warning() -> AlertTrigger {
        AlertTrigger {
            status: AggregateStatus::Warning,
            parameters: vec![Parameter::Humidity],
            failing_parameters: Vec::new(),
            confidence: 0.8,
            time_to_failure_hours: 24.0,
        }
    }

    fn raised(evaluation: &Evaluation) -> u64 {
        match evaluation.outcome {
            TriggerOutcome::Raised(id) => id,
            other => panic!("expected Raised, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_never_raises() {
        let mut coordinator = AlertCoordinator::default();
        let mut trigger = warning();
        trigger.status = AggregateStatus::Healthy;

        assert_eq!(coordinator.evaluate(&trigger).outcome, TriggerOutcome::NotAlerting);
        assert_eq!(coordinator.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gating_thresholds() {
        let mut coordinator = AlertCoordinator::default();

        let mut low_confidence = critical(vec![Parameter::Temperature]);
        low_confidence.confidence = 0.8; // must exceed, not equal
        assert_eq!(
            coordinator.evaluate(&low_confidence).outcome,
            TriggerOutcome::BelowThreshold
        );

        let mut distant = warning();
        distant.time_to_failure_hours = 48.0;
        assert_eq!(coordinator.evaluate(&distant).outcome, TriggerOutcome::BelowThreshold);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deduplication() {
        let mut coordinator = AlertCoordinator::default();
        let trigger = critical(vec![Parameter::Temperature]);

        let first = coordinator.evaluate(&trigger);
        let id = raised(&first);
        assert_eq!(first.events.len(), 1);

        let second = coordinator.evaluate(&trigger);
        assert_eq!(second.outcome, TriggerOutcome::Duplicate(id));
        assert!(second.events.is_empty());
        assert_eq!(coordinator.active_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_identities_coexist() {
        let mut coordinator = AlertCoordinator::default();

        raised(&coordinator.evaluate(&critical(vec![Parameter::Temperature])));
        raised(&coordinator.evaluate(&critical(vec![Parameter::Temperature, Parameter::Humidity])));
        raised(&coordinator.evaluate(&warning()));

        assert_eq!(coordinator.active_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_warning_parameter_raises_new_alert() {
        use health_classifier::{ParameterClassifier, ParameterTable, Reading};
        use std::sync::Arc;

        let table = Arc::new(ParameterTable::standard().unwrap());
        let classifier = ParameterClassifier::new(table.clone());
        let humid = Reading::defaults(&table, 0).with(Parameter::Humidity, 72.0);
        let humid_and_warm = humid.with(Parameter::Temperature, 31.0);

        let mut coordinator = AlertCoordinator::default();
        let first = AlertTrigger::new(&classifier.classify(&humid), 0.8, 24.0);
        let second = AlertTrigger::new(&classifier.classify(&humid_and_warm), 0.85, 24.0);
        assert_eq!(first.identity().to_string(), "WARNING_Humidity");
        assert_eq!(second.identity().to_string(), "WARNING_Humidity-Temperature");

        let first_id = raised(&coordinator.evaluate(&first));
        let second_id = raised(&coordinator.evaluate(&second));
        assert_ne!(first_id, second_id);
        assert_eq!(coordinator.active_count(), 2);

        // Repeating either reading is still deduplicated
        assert_eq!(
            coordinator.evaluate(&second).outcome,
            TriggerOutcome::Duplicate(second_id)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_after_acknowledge() {
        let mut coordinator = AlertCoordinator::default();
        let trigger = critical(vec![Parameter::Temperature]);
        let id = raised(&coordinator.evaluate(&trigger));

        coordinator.acknowledge(id).unwrap();
        assert_eq!(coordinator.active_count(), 0);

        // Same and different identities are both held back
        assert!(matches!(
            coordinator.evaluate(&trigger).outcome,
            TriggerOutcome::CoolingDown { .. }
        ));
        assert!(matches!(
            coordinator.evaluate(&warning()).outcome,
            TriggerOutcome::CoolingDown { .. }
        ));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(coordinator.cooldown_remaining().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(coordinator.cooldown_remaining().is_none());
        let again = raised(&coordinator.evaluate(&trigger));
        assert_ne!(again, id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snooze_rearms_after_duration() {
        let mut coordinator = AlertCoordinator::default();
        let id = raised(&coordinator.evaluate(&warning()));

        let event = coordinator.snooze(id).unwrap();
        assert!(matches!(event, AlertEvent::Snoozed { rearm_after_seconds: 300, .. }));
        assert_eq!(coordinator.active_count(), 0);

        // Past the cooldown but inside the snooze
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(coordinator.evaluate(&warning()).outcome, TriggerOutcome::Snoozed(id));

        // Other identities are free once the cooldown is over
        raised(&coordinator.evaluate(&critical(vec![Parameter::FanPower])));

        tokio::time::advance(Duration::from_secs(290)).await;
        let evaluation = coordinator.evaluate(&warning());
        assert!(matches!(evaluation.events[0], AlertEvent::Rearmed { id: rearmed, .. } if rearmed == id));
        raised(&evaluation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snooze_only_for_warning() {
        let mut coordinator = AlertCoordinator::default();
        let id = raised(&coordinator.evaluate(&critical(vec![Parameter::Temperature])));

        let err = coordinator.snooze(id).unwrap_err();
        assert!(matches!(err, AlertError::InvalidTransition { action: "snooze", .. }));
        assert_eq!(coordinator.active_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_stop_halts_session() {
        let mut coordinator = AlertCoordinator::default();
        let warning_id = raised(&coordinator.evaluate(&warning()));
        assert!(coordinator.emergency_stop(warning_id).is_err());

        let id = raised(&coordinator.evaluate(&critical(vec![Parameter::Temperature])));
        let event = coordinator.emergency_stop(id).unwrap();
        assert!(matches!(event, AlertEvent::EmergencyStopped { .. }));
        assert!(coordinator.is_halted());

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(
            coordinator.evaluate(&critical(vec![Parameter::Humidity])).outcome,
            TriggerOutcome::Halted
        );

        coordinator.resume();
        raised(&coordinator.evaluate(&critical(vec![Parameter::Humidity])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_warning_auto_expires() {
        let mut coordinator = AlertCoordinator::default();
        let warning_id = raised(&coordinator.evaluate(&warning()));
        raised(&coordinator.evaluate(&critical(vec![Parameter::Temperature])));

        tokio::time::advance(Duration::from_secs(300)).await;
        let events = coordinator.housekeep();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].alert_id(), Some(warning_id));
        assert!(coordinator.get(warning_id).is_none());
        // Critical alerts never expire on their own
        assert_eq!(coordinator.active_count(), 1);
        assert!(coordinator.cooldown_remaining().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_everything() {
        let mut coordinator = AlertCoordinator::default();
        let id = raised(&coordinator.evaluate(&critical(vec![Parameter::Temperature])));
        coordinator.emergency_stop(id).unwrap();

        assert!(matches!(coordinator.reset(), AlertEvent::Reset));
        assert!(!coordinator.is_halted());
        assert!(coordinator.cooldown_remaining().is_none());
        raised(&coordinator.evaluate(&critical(vec![Parameter::Temperature])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_and_snoozed_commands() {
        let mut coordinator = AlertCoordinator::default();
        assert!(matches!(
            coordinator.acknowledge(99),
            Err(AlertError::UnknownAlert(99))
        ));

        let id = raised(&coordinator.evaluate(&warning()));
        coordinator.snooze(id).unwrap();
        assert!(matches!(
            coordinator.acknowledge(id),
            Err(AlertError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_gate_boundaries() {
        let config = AlertConfig::default();
        let mut trigger = critical(vec![]);
        assert!(config.passes_gate(&trigger));

        trigger.time_to_failure_hours = 24.0;
        assert!(!config.passes_gate(&trigger));
    }
}
