//! Fitted model artifacts and the prediction pipeline

pub mod classifier;
pub mod inference;
pub mod label_encoder;
pub mod loader;
pub mod onnx;
pub mod scaler;

pub use classifier::{Classifier, LinearClassifier};
pub use inference::Predictor;
pub use label_encoder::LabelEncoder;
pub use loader::{ArtifactError, ArtifactLoader, Artifacts};
pub use onnx::OnnxClassifier;
pub use scaler::Scaler;
