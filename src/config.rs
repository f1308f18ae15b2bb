//! Configuration management for the prediction service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Prefix for environment overrides, e.g. `SCORE_PREDICT__SERVER__HOST`
const ENV_PREFIX: &str = "SCORE_PREDICT";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Listening port (the `PORT` environment variable wins)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind the listener to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// Fitted artifact locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory holding the artifacts; defaults to `model/` next to the executable
    pub dir: Option<String>,
    /// Classifier file (`.onnx` or `.json`)
    pub model_file: String,
    /// Feature scaler file
    pub scaler_file: String,
    /// Label encoder file
    pub label_encoder_file: String,
    /// Intra-op threads for the ONNX session
    pub onnx_threads: usize,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            model_file: "model.onnx".to_string(),
            scaler_file: "scaler.json".to_string(),
            label_encoder_file: "label_encoder.json".to_string(),
            onnx_threads: 1,
        }
    }
}

impl ArtifactsConfig {
    /// Resolve the artifact directory.
    ///
    /// An explicit `dir` is used as given. Otherwise the directory is `model/`
    /// beside the running executable.
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(PathBuf::from(dir));
        }

        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        Ok(exe
            .parent()
            .map(|parent| parent.join("model"))
            .unwrap_or_else(|| PathBuf::from("model")))
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seconds between logged summaries; 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file (if present), the environment and `PORT`
    pub fn load() -> Result<Self> {
        Self::load_with(
            Some(Path::new(DEFAULT_CONFIG_PATH)),
            std::env::var("PORT").ok(),
        )
    }

    /// Load configuration from a specific path, which must exist
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Layer defaults, an optional file, `SCORE_PREDICT__*` variables and a port override
    pub fn load_with(path: Option<&Path>, port: Option<String>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("server.port", port)
            .context("Failed to apply PORT override")?
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
