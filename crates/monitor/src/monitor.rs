//! Monitor Implementation

use crate::panel::SensorPanel;
use crate::{MonitorConfig, MonitorError};
use alerting::{AlertCoordinator, AlertEvent, AlertRecord, AlertTrigger, TriggerOutcome};
use health_classifier::{
    now_ms, recommend, Classification, Parameter, ParameterClassifier, ParameterTable, Reading,
    Recommendation, PARAMETER_COUNT,
};
use prediction::{rule_estimate, Prediction, PredictionSource, Predictor};
use reading_buffer::ReadingHistory;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Capacity of the alert event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What caused an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Periodic sample from the polling task
    Poll,
    /// Set-point change on the panel
    Instant(Parameter),
}

/// Result of the most recent evaluation
#[derive(Debug, Clone)]
struct LatestEvaluation {
    trigger: Trigger,
    reading: Reading,
    classification: Classification,
    prediction: Prediction,
    recommendations: Vec<Recommendation>,
}

/// A running monitoring session; dropping it stops the polling task
struct Session {
    id: u64,
    _stop: watch::Sender<()>,
}

struct State {
    panel: SensorPanel,
    history: ReadingHistory,
    coordinator: AlertCoordinator,
    latest: Option<LatestEvaluation>,
    session: Option<Session>,
    next_session: u64,
    data_points: u64,
}

struct Inner {
    state: Mutex<State>,
    classifier: ParameterClassifier,
    predictor: Arc<dyn Predictor>,
    events: broadcast::Sender<AlertEvent>,
    config: MonitorConfig,
}

/// Point-in-time view of the monitor
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub monitoring: bool,
    /// Set by an emergency stop until monitoring restarts
    pub halted: bool,
    pub data_points: u64,
    pub history_len: usize,
    pub history_capacity: usize,
    /// History length over capacity (0.0 to 1.0)
    pub history_fill: f64,
    pub panel: Reading,
    pub last_trigger: Option<Trigger>,
    pub reading: Option<Reading>,
    pub classification: Option<Classification>,
    pub prediction: Option<Prediction>,
    pub model: Option<&'static str>,
    pub recommendations: Vec<Recommendation>,
    pub alerts: Vec<AlertRecord>,
    pub cooldown_remaining_ms: Option<u64>,
}

/// Shared handle to the monitoring pipeline.
///
/// Panel, history, alert coordinator and the latest result sit behind one
/// mutex so the polling task and the instant path never interleave.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    /// Create a new monitor
    pub fn new(
        table: Arc<ParameterTable>,
        predictor: Arc<dyn Predictor>,
        config: MonitorConfig,
    ) -> Self {
        info!(
            "Creating monitor: poll_interval={}ms, history_capacity={}",
            config.poll_interval_ms, config.history_capacity
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = State {
            panel: SensorPanel::new(table.clone()),
            history: ReadingHistory::new(config.history_capacity),
            coordinator: AlertCoordinator::new(config.alert.clone()),
            latest: None,
            session: None,
            next_session: 1,
            data_points: 0,
        };

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                classifier: ParameterClassifier::new(table),
                predictor,
                events,
                config,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, MonitorError> {
        self.inner
            .state
            .lock()
            .map_err(|e| MonitorError::StatePoisoned(e.to_string()))
    }

    fn publish(&self, events: Vec<AlertEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.inner.events.send(event);
        }
    }

    /// Subscribe to alert lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.inner.events.subscribe()
    }

    /// Parameter table in use
    pub fn table(&self) -> &ParameterTable {
        self.inner.classifier.table()
    }

    /// Current panel set-points
    pub fn panel_values(&self) -> Result<[f64; PARAMETER_COUNT], MonitorError> {
        Ok(*self.lock()?.panel.sample(0).values())
    }

    /// Check if a monitoring session is running
    pub fn is_monitoring(&self) -> Result<bool, MonitorError> {
        Ok(self.lock()?.session.is_some())
    }

    /// Change a set-point; evaluates immediately while monitoring.
    ///
    /// Returns the alert outcome when an evaluation ran.
    pub fn set_parameter(
        &self,
        parameter: Parameter,
        value: f64,
    ) -> Result<Option<TriggerOutcome>, MonitorError> {
        let mut state = self.lock()?;
        state.panel.set(parameter, value)?;

        if state.session.is_none() {
            return Ok(None);
        }
        debug!("Instant check: {} = {:.1}", parameter, value);
        let (outcome, events) = self.evaluate(&mut state, Trigger::Instant(parameter))?;
        drop(state);

        self.publish(events);
        Ok(Some(outcome))
    }

    /// Run one polling tick for the given session
    fn poll(&self, session: u64) -> Result<Option<TriggerOutcome>, MonitorError> {
        let mut state = self.lock()?;
        if state.session.as_ref().map(|s| s.id) != Some(session) {
            return Ok(None);
        }
        let (outcome, events) = self.evaluate(&mut state, Trigger::Poll)?;
        drop(state);

        self.publish(events);
        Ok(Some(outcome))
    }

    fn evaluate(
        &self,
        state: &mut State,
        trigger: Trigger,
    ) -> Result<(TriggerOutcome, Vec<AlertEvent>), MonitorError> {
        let reading = state.panel.sample(now_ms());
        state.history.push(reading);

        let classification = self.inner.classifier.classify(&reading);
        metrics::counter!("tea_monitor_readings_classified_total").increment(1);

        let prediction = self.inner.predictor.predict(&state.history)?;
        let source = match prediction.source {
            PredictionSource::Model { .. } => "model",
            PredictionSource::RuleBased => "rule_based",
        };
        metrics::counter!("tea_monitor_predictions_total", "source" => source).increment(1);

        // The predictor's confidence only gates the status it predicted
        let (confidence, time_to_failure_hours) = if prediction.status == classification.aggregate {
            (prediction.confidence, prediction.time_to_failure_hours)
        } else {
            debug!(
                "Predicted {} disagrees with classified {}; gating on rule estimate",
                prediction.status, classification.aggregate
            );
            rule_estimate(&classification)
        };
        let alert_trigger = AlertTrigger::new(&classification, confidence, time_to_failure_hours);
        let evaluation = state.coordinator.evaluate(&alert_trigger);
        record_outcome(&evaluation.outcome, &alert_trigger);

        let recommendations = recommend(
            prediction.time_to_failure_hours,
            &classification.failing_parameters,
        );

        debug!(
            "{:?}: {} predicted {} (conf={:.2}, ttf={:.1}h) -> {:?}",
            trigger,
            classification.aggregate,
            prediction.status,
            prediction.confidence,
            prediction.time_to_failure_hours,
            evaluation.outcome
        );

        state.data_points += 1;
        state.latest = Some(LatestEvaluation {
            trigger,
            reading,
            classification,
            prediction,
            recommendations,
        });

        Ok((evaluation.outcome, evaluation.events))
    }

    /// Start a monitoring session.
    ///
    /// Clears the history, lifts any emergency-stop halt and spawns the
    /// polling task. Returns false if a session is already running.
    pub fn start(&self) -> Result<bool, MonitorError> {
        let (stop_tx, mut stop_rx) = watch::channel(());
        let session = {
            let mut state = self.lock()?;
            if state.session.is_some() {
                return Ok(false);
            }
            let id = state.next_session;
            state.next_session += 1;
            state.coordinator.resume();
            state.history.clear();
            state.data_points = 0;
            state.latest = None;
            state.session = Some(Session { id, _stop: stop_tx });
            id
        };

        let monitor = self.clone();
        let period = Duration::from_millis(self.inner.config.poll_interval_ms.max(1));
        info!("Monitoring session {} started ({:?} period)", session, period);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => match monitor.poll(session) {
                        Ok(Some(_)) => {}
                        Ok(None) => break,
                        Err(e) => warn!("Monitoring tick failed: {}", e),
                    },
                    // Sender dropped: session stopped
                    _ = stop_rx.changed() => break,
                }
            }
            info!("Monitoring session {} stopped", session);
        });

        Ok(true)
    }

    /// Stop the running session; returns false if none was running
    pub fn stop(&self) -> Result<bool, MonitorError> {
        let stopped = self.lock()?.session.take().is_some();
        if stopped {
            info!("Stopping monitoring");
        }
        Ok(stopped)
    }

    /// Stop monitoring and clear history, alerts, cooldown and set-points
    pub fn reset(&self) -> Result<(), MonitorError> {
        let event = {
            let mut state = self.lock()?;
            state.session = None;
            state.history.clear();
            state.panel.reset();
            state.latest = None;
            state.data_points = 0;
            state.coordinator.reset()
        };
        info!("System reset");
        self.publish(vec![event]);
        Ok(())
    }

    /// Acknowledge an active alert
    pub fn acknowledge(&self, id: u64) -> Result<AlertEvent, MonitorError> {
        let event = self.lock()?.coordinator.acknowledge(id)?;
        self.publish(vec![event.clone()]);
        Ok(event)
    }

    /// Snooze an active Warning alert
    pub fn snooze(&self, id: u64) -> Result<AlertEvent, MonitorError> {
        let event = self.lock()?.coordinator.snooze(id)?;
        self.publish(vec![event.clone()]);
        Ok(event)
    }

    /// Dismiss a Critical alert, halting alerts and stopping the polling task
    pub fn emergency_stop(&self, id: u64) -> Result<AlertEvent, MonitorError> {
        let event = {
            let mut state = self.lock()?;
            let event = state.coordinator.emergency_stop(id)?;
            state.session = None;
            event
        };
        warn!("Emergency stop: monitoring halted, inspect the machine before restarting");
        self.publish(vec![event.clone()]);
        Ok(event)
    }

    /// Live alerts after processing snooze re-arming and expiry
    pub fn alerts(&self) -> Result<(Vec<AlertRecord>, Option<Duration>), MonitorError> {
        let (events, records, cooldown) = {
            let mut state = self.lock()?;
            let events = state.coordinator.housekeep();
            (
                events,
                state.coordinator.records(),
                state.coordinator.cooldown_remaining(),
            )
        };
        self.publish(events);
        Ok((records, cooldown))
    }

    /// Snapshot of the current state, taken under one lock
    pub fn snapshot(&self) -> Result<MonitorSnapshot, MonitorError> {
        let (snapshot, events) = {
            let mut state = self.lock()?;
            let events = state.coordinator.housekeep();
            let latest = state.latest.clone();

            let snapshot = MonitorSnapshot {
                monitoring: state.session.is_some(),
                halted: state.coordinator.is_halted(),
                data_points: state.data_points,
                history_len: state.history.len(),
                history_capacity: state.history.capacity(),
                history_fill: state.history.fill_ratio(),
                panel: state.panel.sample(now_ms()),
                last_trigger: latest.as_ref().map(|l| l.trigger),
                model: latest.as_ref().map(|l| l.prediction.model_label()),
                reading: latest.as_ref().map(|l| l.reading),
                classification: latest.as_ref().map(|l| l.classification.clone()),
                prediction: latest.as_ref().map(|l| l.prediction.clone()),
                recommendations: latest.map(|l| l.recommendations).unwrap_or_default(),
                alerts: state.coordinator.records(),
                cooldown_remaining_ms: state
                    .coordinator
                    .cooldown_remaining()
                    .map(|d| d.as_millis() as u64),
            };
            (snapshot, events)
        };
        self.publish(events);
        Ok(snapshot)
    }
}

fn record_outcome(outcome: &TriggerOutcome, trigger: &AlertTrigger) {
    let reason = match outcome {
        TriggerOutcome::Raised(_) => {
            metrics::counter!("tea_monitor_alerts_raised_total", "status" => trigger.status.as_str())
                .increment(1);
            return;
        }
        TriggerOutcome::NotAlerting => return,
        TriggerOutcome::Halted => "halted",
        TriggerOutcome::BelowThreshold => "below_threshold",
        TriggerOutcome::CoolingDown { .. } => "cooldown",
        TriggerOutcome::Duplicate(_) => "duplicate",
        TriggerOutcome::Snoozed(_) => "snoozed",
    };
    metrics::counter!("tea_monitor_alerts_suppressed_total", "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlertError;
    use health_classifier::{AggregateStatus, ValidationError};
    use prediction::RuleBasedPredictor;
    use tokio::sync::broadcast::error::TryRecvError;

    fn monitor() -> Monitor {
        let table = Arc::new(ParameterTable::standard().unwrap());
        let predictor = RuleBasedPredictor::new(ParameterClassifier::new(table.clone()));
        Monitor::new(table, Arc::new(predictor), MonitorConfig::default())
    }

    /// Predictor that always reports a healthy machine
    struct AlwaysHealthy;

    impl Predictor for AlwaysHealthy {
        fn predict(&self, _history: &ReadingHistory) -> Result<Prediction, prediction::PredictionError> {
            Ok(Prediction {
                status: AggregateStatus::Healthy,
                confidence: 0.95,
                health_probabilities: [0.95, 0.04, 0.01],
                failure_probabilities: [0.05; PARAMETER_COUNT],
                time_to_failure_hours: 120.0,
                source: PredictionSource::Model { padded: false },
                timestamp_ms: now_ms(),
            })
        }
    }

    fn raised_id(outcome: Option<TriggerOutcome>) -> u64 {
        match outcome {
            Some(TriggerOutcome::Raised(id)) => id,
            other => panic!("expected Raised, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_path_needs_session() {
        let monitor = monitor();
        let outcome = monitor.set_parameter(Parameter::Temperature, 19.0).unwrap();

        assert!(outcome.is_none());
        let snapshot = monitor.snapshot().unwrap();
        assert_eq!(snapshot.data_points, 0);
        assert_eq!(snapshot.panel.get(Parameter::Temperature), 19.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_set_point_rejected() {
        let monitor = monitor();
        let err = monitor.set_parameter(Parameter::Humidity, 150.0).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_and_poll_share_dedup() {
        let monitor = monitor();
        let mut events = monitor.subscribe();
        assert!(monitor.start().unwrap());
        assert!(!monitor.start().unwrap());

        raised_id(monitor.set_parameter(Parameter::Temperature, 19.0).unwrap());
        tokio::time::sleep(Duration::from_millis(3500)).await;

        let snapshot = monitor.snapshot().unwrap();
        assert_eq!(snapshot.alerts.len(), 1);
        assert!(snapshot.data_points >= 4);
        assert_eq!(
            snapshot.classification.map(|c| c.aggregate),
            Some(AggregateStatus::Critical)
        );
        assert_eq!(snapshot.model, Some("Rule-based simulation"));

        assert!(matches!(events.try_recv(), Ok(AlertEvent::Raised { .. })));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_reading_alerts_despite_healthy_prediction() {
        let table = Arc::new(ParameterTable::standard().unwrap());
        let monitor = Monitor::new(table, Arc::new(AlwaysHealthy), MonitorConfig::default());
        monitor.start().unwrap();

        let id = raised_id(monitor.set_parameter(Parameter::Temperature, 19.0).unwrap());
        let snapshot = monitor.snapshot().unwrap();
        let alert = &snapshot.alerts[0];
        assert_eq!(alert.id, id);
        assert_eq!(alert.status(), AggregateStatus::Critical);
        // Gate ran on the rule estimate for one Critical parameter
        assert!((alert.confidence - 0.9).abs() < 1e-9);
        assert_eq!(alert.time_to_failure_hours, 4.0);
        assert_eq!(
            snapshot.prediction.map(|p| p.status),
            Some(AggregateStatus::Healthy)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_history_fill() {
        let monitor = monitor();
        monitor.start().unwrap();
        for value in [19.0, 20.0, 21.0, 22.0] {
            monitor.set_parameter(Parameter::Temperature, value).unwrap();
        }

        let snapshot = monitor.snapshot().unwrap();
        assert_eq!(snapshot.history_len, 4);
        assert!((snapshot.history_fill - 0.4).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_expiry_consistent_with_cooldown() {
        let monitor = monitor();
        let mut events = monitor.subscribe();
        monitor.start().unwrap();
        raised_id(monitor.set_parameter(Parameter::Humidity, 72.0).unwrap());
        monitor.stop().unwrap();
        assert!(matches!(events.try_recv(), Ok(AlertEvent::Raised { .. })));

        tokio::time::advance(Duration::from_secs(301)).await;

        // Expiry and the cooldown it starts show up in the same snapshot
        let snapshot = monitor.snapshot().unwrap();
        assert!(snapshot.alerts.is_empty());
        assert!(snapshot.cooldown_remaining_ms.is_some());
        assert!(matches!(events.try_recv(), Ok(AlertEvent::Expired { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_stop_halts_polling() {
        let monitor = monitor();
        monitor.start().unwrap();
        let id = raised_id(monitor.set_parameter(Parameter::Temperature, 19.0).unwrap());

        monitor.emergency_stop(id).unwrap();
        let before = monitor.snapshot().unwrap();
        assert!(!before.monitoring);
        assert!(before.halted);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(monitor.snapshot().unwrap().data_points, before.data_points);
        assert!(monitor.set_parameter(Parameter::Humidity, 72.0).unwrap().is_none());

        // Restarting lifts the halt
        monitor.start().unwrap();
        assert!(!monitor.snapshot().unwrap().halted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_cooldown() {
        let monitor = monitor();
        monitor.start().unwrap();
        let id = raised_id(monitor.set_parameter(Parameter::Temperature, 19.0).unwrap());

        monitor.acknowledge(id).unwrap();
        assert!(matches!(
            monitor.set_parameter(Parameter::Temperature, 18.0).unwrap(),
            Some(TriggerOutcome::CoolingDown { .. })
        ));

        monitor.reset().unwrap();
        let snapshot = monitor.snapshot().unwrap();
        assert!(!snapshot.monitoring);
        assert!(snapshot.cooldown_remaining_ms.is_none());
        assert_eq!(snapshot.data_points, 0);
        assert_eq!(snapshot.panel.get(Parameter::Temperature), 28.0);

        monitor.start().unwrap();
        let again = raised_id(monitor.set_parameter(Parameter::Temperature, 19.0).unwrap());
        assert_ne!(again, id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_polling() {
        let monitor = monitor();
        monitor.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(monitor.stop().unwrap());
        assert!(!monitor.stop().unwrap());
        let points = monitor.snapshot().unwrap().data_points;

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(monitor.snapshot().unwrap().data_points, points);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_alert_command() {
        let monitor = monitor();
        assert!(matches!(
            monitor.snooze(3),
            Err(MonitorError::Alert(AlertError::UnknownAlert(3)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_serializes() {
        let monitor = monitor();
        monitor.start().unwrap();
        monitor.set_parameter(Parameter::Humidity, 72.0).unwrap();

        let json = serde_json::to_value(monitor.snapshot().unwrap()).unwrap();
        assert_eq!(json["monitoring"], true);
        assert_eq!(json["classification"]["aggregate"], "WARNING");
        assert_eq!(json["alerts"][0]["identity"]["status"], "WARNING");
    }
}
