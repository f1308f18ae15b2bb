//! Startup loading of the fitted artifacts

use crate::config::ArtifactsConfig;
use crate::models::classifier::{Classifier, LinearClassifier};
use crate::models::label_encoder::LabelEncoder;
use crate::models::onnx::OnnxClassifier;
use crate::models::scaler::Scaler;
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Failure to produce a complete artifact set
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("missing artifact file(s) in {}: {}", dir.display(), missing.join(", "))]
    Missing { dir: PathBuf, missing: Vec<String> },

    #[error("failed to read artifact {}: {source:#}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("unsupported model file {} (expected .onnx or .json)", path.display())]
    UnsupportedModel { path: PathBuf },
}

/// The three fitted artifacts, loaded once per process
pub struct Artifacts {
    pub classifier: Box<dyn Classifier>,
    pub scaler: Scaler,
    pub label_encoder: LabelEncoder,
}

/// Resolves and loads artifact files from a directory
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
    model_file: String,
    scaler_file: String,
    label_encoder_file: String,
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a loader for the configured artifact directory
    pub fn new(config: &ArtifactsConfig) -> Result<Self> {
        Ok(Self::with_dir(config.resolve_dir()?, config))
    }

    /// Create a loader reading file names from `config` but files from `dir`
    pub fn with_dir<P: Into<PathBuf>>(dir: P, config: &ArtifactsConfig) -> Self {
        Self {
            dir: dir.into(),
            model_file: config.model_file.clone(),
            scaler_file: config.scaler_file.clone(),
            label_encoder_file: config.label_encoder_file.clone(),
            onnx_threads: config.onnx_threads.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load all three artifacts.
    ///
    /// Every missing file is reported together before anything is parsed.
    pub fn load(&self) -> Result<Artifacts, ArtifactError> {
        let files = [&self.model_file, &self.scaler_file, &self.label_encoder_file];

        let missing: Vec<String> = files
            .iter()
            .filter(|name| !self.dir.join(name).is_file())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ArtifactError::Missing {
                dir: self.dir.clone(),
                missing,
            });
        }

        let scaler_path = self.dir.join(&self.scaler_file);
        let scaler: Scaler = read_json(&scaler_path)?;
        scaler.validate().map_err(|source| ArtifactError::Unreadable {
            path: scaler_path.clone(),
            source,
        })?;
        info!(
            path = %scaler_path.display(),
            kind = scaler.kind(),
            features = scaler.n_features(),
            "Scaler loaded"
        );

        let encoder_path = self.dir.join(&self.label_encoder_file);
        let label_encoder: LabelEncoder = read_json(&encoder_path)?;
        info!(
            path = %encoder_path.display(),
            classes = label_encoder.len(),
            "Label encoder loaded"
        );

        let classifier = self.load_classifier()?;
        info!(
            path = %self.dir.join(&self.model_file).display(),
            kind = classifier.kind(),
            "Classifier loaded"
        );

        Ok(Artifacts {
            classifier,
            scaler,
            label_encoder,
        })
    }

    fn load_classifier(&self) -> Result<Box<dyn Classifier>, ArtifactError> {
        let path = self.dir.join(&self.model_file);
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("onnx") => OnnxClassifier::load(&path, self.onnx_threads)
                .map(|model| Box::new(model) as Box<dyn Classifier>)
                .map_err(|source| ArtifactError::Unreadable { path, source }),
            Some("json") => {
                let model: LinearClassifier = read_json(&path)?;
                model
                    .validate()
                    .map_err(|source| ArtifactError::Unreadable {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Box::new(model))
            }
            _ => Err(ArtifactError::UnsupportedModel { path }),
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let unreadable = |source: anyhow::Error| ArtifactError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let bytes = std::fs::read(path).map_err(|e| unreadable(e.into()))?;
    serde_json::from_slice(&bytes).map_err(|e| unreadable(e.into()))
}
