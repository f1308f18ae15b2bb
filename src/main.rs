//! Score Prediction Service - Main Entry Point
//!
//! Loads the fitted artifacts, then serves the prediction form over HTTP.
//! Any artifact problem aborts startup before the listener binds.

use anyhow::Result;
use score_predict::{
    config::{AppConfig, LoggingConfig},
    http::{self, AppState},
    metrics::MetricsReporter,
    models::{inference::Predictor, loader::ArtifactLoader},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_logging(&config.logging)?;

    info!("Starting Score Prediction Service");

    let loader = ArtifactLoader::new(&config.artifacts)?;
    info!(dir = %loader.dir().display(), "Loading model artifacts");

    let artifacts = match loader.load() {
        Ok(artifacts) => artifacts,
        Err(e) => {
            error!(error = %e, "Failed to load model artifacts");
            error!(
                "Make sure {}, {} and {} exist in {}",
                config.artifacts.model_file,
                config.artifacts.scaler_file,
                config.artifacts.label_encoder_file,
                loader.dir().display()
            );
            return Err(e.into());
        }
    };

    let predictor = match Predictor::from_artifacts(artifacts) {
        Ok(predictor) => predictor,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Model artifacts are inconsistent");
            return Err(e);
        }
    };
    info!(
        classifier = predictor.classifier_kind(),
        features = ?predictor.feature_names(),
        classes = ?predictor.classes(),
        "Predictor ready"
    );

    let state = AppState::new(predictor)?;

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(
            state.metrics.clone(),
            config.metrics.report_interval_secs,
        );
        tokio::spawn(reporter.start());
    }

    let addr = config.server.bind_addr()?;
    let metrics = state.metrics.clone();

    http::serve(addr, state, shutdown_signal()).await?;

    // Print final summary
    info!("Service shutting down...");
    metrics.log_summary();

    Ok(())
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("score_predict={}", config.level).parse()?)
        .add_directive(format!("tower_http={}", config.level).parse()?);

    match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
