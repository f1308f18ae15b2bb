//! Feature extraction for the score classifier.
//!
//! The fitted scaler and classifier expect one row of three raw exam scores,
//! in the same column order used during training.

use crate::types::score::ScoreInput;

/// Number of features the fitted artifacts were trained on
pub const FEATURE_COUNT: usize = 3;

/// Turns submitted scores into model input rows.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature row `[math, reading, writing]`.
    pub fn extract(&self, input: &ScoreInput) -> [f64; FEATURE_COUNT] {
        [input.math, input.reading, input.writing]
    }

    /// Get the number of features.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names in order (matching the training columns).
    pub fn feature_names(&self) -> [&'static str; FEATURE_COUNT] {
        ["math score", "reading score", "writing score"]
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
