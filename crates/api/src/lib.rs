//! Machine Health Monitor API Server
//!
//! HTTP control surface for the drying-line monitor: sensor set-points,
//! monitoring start/stop/reset, live status and alert commands.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use alerting::AlertEvent;
use metrics_exporter_prometheus::PrometheusHandle;
use monitor::Monitor;
use serde::Serialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod error;
pub mod rate_limit;
mod routes;
pub mod settings;

pub use error::ApiError;
pub use rate_limit::{RateLimitConfig, RateLimits};
pub use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    /// Monitoring pipeline
    pub monitor: Monitor,
    /// Prometheus render handle
    pub metrics: PrometheusHandle,
    /// Label of the active predictor
    pub predictor: &'static str,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(monitor: Monitor, metrics: PrometheusHandle, predictor: &'static str) -> Self {
        Self {
            monitor,
            metrics,
            predictor,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub monitoring: bool,
    pub predictor: &'static str,
}

/// Create the application router.
///
/// Control routes (POST/PUT) are rate limited per peer IP. Set-points and
/// commands draw from separate budgets.
pub fn create_router(state: Arc<AppState>, rate_limits: &RateLimits) -> Router {
    let set_points = limited(
        Router::new().route("/api/v1/parameters/:name", put(routes::parameters::set_parameter)),
        &rate_limits.set_points,
    );
    let commands = Router::new()
        .route("/api/v1/alerts/:id/acknowledge", post(routes::alerts::acknowledge))
        .route("/api/v1/alerts/:id/snooze", post(routes::alerts::snooze))
        .route("/api/v1/alerts/:id/emergency-stop", post(routes::alerts::emergency_stop))
        .route("/api/v1/monitoring/start", post(routes::monitoring::start))
        .route("/api/v1/monitoring/stop", post(routes::monitoring::stop))
        .route("/api/v1/reset", post(routes::monitoring::reset));
    let commands = limited(commands, &rate_limits.commands);

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/parameters", get(routes::parameters::list_parameters))
        .route("/api/v1/status", get(routes::status::get_status))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/metrics", get(metrics_handler))
        .merge(set_points)
        .merge(commands)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

fn limited(routes: Router<Arc<AppState>>, rate_limit: &RateLimitConfig) -> Router<Arc<AppState>> {
    match rate_limit::create_governor_config(rate_limit) {
        Some(config) => routes.layer(GovernorLayer { config }),
        None => {
            warn!("Invalid rate limit config {:?}; routes are unlimited", rate_limit);
            routes
        }
    }
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let (status, monitoring) = match state.monitor.is_monitoring() {
        Ok(monitoring) => ("healthy", monitoring),
        Err(_) => ("degraded", false),
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        monitoring,
        predictor: state.predictor,
    })
}

/// Prometheus metrics handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.render())
}

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    metrics::describe_counter!(
        "tea_monitor_readings_classified_total",
        "Readings run through the parameter classifier"
    );
    metrics::describe_counter!(
        "tea_monitor_predictions_total",
        "Health predictions by source (model or rule_based)"
    );
    metrics::describe_counter!("tea_monitor_alerts_raised_total", "Alerts raised by status");
    metrics::describe_counter!(
        "tea_monitor_alerts_suppressed_total",
        "Alerting triggers suppressed by reason"
    );
}

/// Initialize logging
pub fn init_logging(
    settings: &settings::LoggingSettings,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = Level::from_str(&settings.level).unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);

    if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Log alert lifecycle events until the monitor goes away
pub fn spawn_alert_sink(mut events: broadcast::Receiver<AlertEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AlertEvent::Raised { alert }) => warn!(
                    "ALERT {} [{}]: confidence {:.0}%, failure in {:.1}h",
                    alert.id,
                    alert.identity,
                    alert.confidence * 100.0,
                    alert.time_to_failure_hours
                ),
                Ok(event) => info!("Alert event: {:?}", event),
                Err(RecvError::Lagged(skipped)) => warn!("Alert sink lagged, {} events skipped", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Run the server
pub async fn run_server(settings: &Settings, state: Arc<AppState>) -> std::io::Result<()> {
    let app = create_router(state, &settings.rate_limit);

    info!("Starting API server on {}", settings.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
