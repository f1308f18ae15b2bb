//! Score Prediction Service Library
//!
//! Serves a web form that takes three exam scores and answers with the label
//! predicted by a pre-trained classifier. The fitted scaler, classifier and
//! label encoder are loaded once at startup and shared read-only by every
//! request.

pub mod config;
pub mod feature_extractor;
pub mod http;
pub mod metrics;
pub mod models;
pub mod render;
pub mod types;

pub use config::AppConfig;
pub use feature_extractor::FeatureExtractor;
pub use http::AppState;
pub use models::inference::Predictor;
pub use models::loader::ArtifactLoader;
pub use types::{prediction::Prediction, score::ScoreInput};
