//! Tea Factory Machine Health Monitor - Main Entry Point

use anyhow::Context;
use api::settings::DEFAULT_SETTINGS_FILE;
use api::{describe_metrics, init_logging, run_server, spawn_alert_sink, AppState, Settings};
use metrics_exporter_prometheus::PrometheusBuilder;
use monitor::Monitor;
use prediction::PredictionEngine;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
    let settings = Settings::load(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path))?;

    init_logging(&settings.logging).context("Failed to set tracing subscriber")?;

    info!("=== Tea Factory Machine Health Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let table = Arc::new(
        settings
            .parameter_table()
            .context("Invalid parameter configuration")?,
    );

    let engine = PredictionEngine::from_config(table.clone(), settings.monitor.prediction.clone());
    let predictor = if engine.has_model() {
        "Sequence model"
    } else {
        "Rule-based simulation"
    };
    info!("Predictor: {}", predictor);

    let monitor = Monitor::new(table, Arc::new(engine), settings.monitor.clone());
    spawn_alert_sink(monitor.subscribe());

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    describe_metrics();

    let state = Arc::new(AppState::new(monitor, metrics, predictor));
    run_server(&settings, state).await?;

    Ok(())
}
