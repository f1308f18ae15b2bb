//! Fitted feature scalers

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A pre-fitted transform from raw feature rows to the training distribution.
///
/// Serialized with a `kind` tag:
///
/// ```json
/// {"kind": "standard", "mean": [66.1, 69.2, 68.1], "scale": [15.2, 14.6, 15.2]}
/// {"kind": "min_max", "min": [0.0, -0.17, -0.1], "scale": [0.01, 0.012, 0.011]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard {
        #[serde(alias = "mean_")]
        mean: Vec<f64>,
        #[serde(alias = "scale_")]
        scale: Vec<f64>,
    },
    /// `x * scale + min`
    MinMax {
        #[serde(alias = "min_")]
        min: Vec<f64>,
        #[serde(alias = "scale_")]
        scale: Vec<f64>,
    },
}

impl Scaler {
    /// Check the fitted parameters are consistent.
    pub fn validate(&self) -> Result<()> {
        let (offset, scale) = self.parameters();

        if offset.is_empty() {
            bail!("Scaler has no fitted features");
        }
        if offset.len() != scale.len() {
            bail!(
                "Scaler parameter lengths differ ({} offsets, {} scales)",
                offset.len(),
                scale.len()
            );
        }
        if offset.iter().chain(scale).any(|v| !v.is_finite()) {
            bail!("Scaler parameters must be finite");
        }
        Ok(())
    }

    /// Number of features the scaler was fitted with
    pub fn n_features(&self) -> usize {
        self.parameters().0.len()
    }

    /// Normalize one feature row.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features() {
            bail!(
                "Scaler expects {} features, got {}",
                self.n_features(),
                row.len()
            );
        }

        let scaled = match self {
            Scaler::Standard { mean, scale } => row
                .iter()
                .zip(mean)
                .zip(scale)
                // Constant features were fitted with zero variance
                .map(|((x, m), s)| if *s == 0.0 { x - m } else { (x - m) / s })
                .collect(),
            Scaler::MinMax { min, scale } => row
                .iter()
                .zip(min)
                .zip(scale)
                .map(|((x, m), s)| x * s + m)
                .collect(),
        };

        Ok(scaled)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    fn parameters(&self) -> (&[f64], &[f64]) {
        match self {
            Scaler::Standard { mean, scale } => (mean, scale),
            Scaler::MinMax { min, scale } => (min, scale),
        }
    }
}
