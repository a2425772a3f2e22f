//! Credit Scoring Service - Main Entry Point
//!
//! Loads the fitted transformer and trained weights once at startup, then
//! serves predictions over HTTP. Any artifact failure aborts before the
//! listener binds.

use anyhow::Result;
use credit_scoring_service::{
    config::AppConfig,
    metrics::{MetricsReporter, ServiceMetrics},
    model::Predictor,
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("credit_scoring_service={}", config.logging.level))
    });
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Credit Scoring Service");
    info!(
        transformer = %config.model.transformer_path.display(),
        weights = %config.model.weights_path.display(),
        hidden_layers = ?config.model.architecture.hidden_layers,
        "Configuration loaded"
    );

    // Load artifacts and construct the network. Fatal on any failure: the
    // service must not accept traffic in an unloaded state.
    let predictor = Arc::new(Predictor::initialize(
        &config.model.transformer_path,
        &config.model.weights_path,
        &config.model.architecture,
    )?);
    info!(
        features = predictor.feature_count(),
        "Predictor ready to serve"
    );

    // Initialize metrics and the periodic summary reporter
    let metrics = Arc::new(ServiceMetrics::new());
    let reporter_metrics = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(reporter_metrics, 30);
        reporter.start().await;
    });

    server::serve(
        AppState { predictor, metrics },
        &config.server.host,
        config.server.port,
    )
    .await
}
