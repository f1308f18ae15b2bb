//! Sample Artifact Writer
//!
//! Writes a small, fixed artifact set (scaler, label encoder and a linear
//! model) so the service can run without the offline training pipeline.
//!
//! Usage: `sample-artifacts [DIR] [--force]`.
//!
//! File names and the default DIR come from the same configuration the
//! service reads, so `sample-artifacts && score-predict` works out of the box.

use anyhow::{bail, Context, Result};
use score_predict::config::AppConfig;
use score_predict::models::{LabelEncoder, LinearClassifier, Scaler};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

const GROUPS: [&str; 5] = ["group A", "group B", "group C", "group D", "group E"];

fn sample_scaler() -> Scaler {
    // Column statistics of the public student performance dataset
    Scaler::Standard {
        mean: vec![66.089, 69.169, 68.054],
        scale: vec![15.155, 14.593, 15.188],
    }
}

fn sample_model() -> Result<LinearClassifier> {
    LinearClassifier::new(
        vec![
            vec![-0.42, 0.11, 0.09],
            vec![-0.21, 0.08, 0.02],
            vec![0.01, 0.05, 0.04],
            vec![0.12, -0.06, 0.15],
            vec![0.51, -0.18, -0.12],
        ],
        vec![-0.91, -0.28, 0.41, 0.22, -0.57],
        None,
    )
}

fn write_json<T: Serialize>(path: &Path, value: &T, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote artifact");
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_artifacts=info".parse()?),
        )
        .init();

    let config = AppConfig::load()?;
    let artifacts = &config.artifacts;

    if Path::new(&artifacts.model_file).extension().and_then(|e| e.to_str()) != Some("json") {
        bail!(
            "artifacts.model_file is {:?}; sample artifacts are a JSON linear model, \
             set it to a .json file name",
            artifacts.model_file
        );
    }

    // Parse arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let force = args.iter().any(|a| a == "--force");
    let dir = match args.iter().find(|a| !a.starts_with("--")) {
        Some(dir) => PathBuf::from(dir),
        None => artifacts.resolve_dir()?,
    };

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let encoder = LabelEncoder::new(GROUPS.iter().map(|g| g.to_string()).collect())?;

    write_json(&dir.join(&artifacts.scaler_file), &sample_scaler(), force)?;
    write_json(&dir.join(&artifacts.label_encoder_file), &encoder, force)?;
    write_json(&dir.join(&artifacts.model_file), &sample_model()?, force)?;

    info!(
        dir = %dir.display(),
        classes = encoder.len(),
        "Sample artifacts ready"
    );

    Ok(())
}
