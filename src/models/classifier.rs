//! Classifier abstraction and the JSON linear model

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A fitted model mapping one normalized feature row to a class index.
///
/// Implementations are shared read-only across request handlers.
pub trait Classifier: Send + Sync {
    /// Predict the class index for a single row
    fn predict(&self, row: &[f64]) -> Result<i64>;

    /// Input width, when the artifact declares it
    fn n_features(&self) -> Option<usize>;

    /// Number of classes the model can emit, when the artifact declares it
    fn n_classes(&self) -> Option<usize>;

    /// Short name of the artifact kind
    fn kind(&self) -> &'static str;
}

/// Linear decision function `row · coef[k] + intercept[k]`, predicting the
/// class with the highest score.
///
/// With a single coefficient row the model is binary: a positive decision
/// selects `classes[1]`, otherwise `classes[0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    #[serde(alias = "coef_")]
    coef: Vec<Vec<f64>>,
    #[serde(alias = "intercept_")]
    intercept: Vec<f64>,
    /// Class index emitted for each decision column
    #[serde(default, alias = "classes_", skip_serializing_if = "Option::is_none")]
    classes: Option<Vec<i64>>,
}

impl LinearClassifier {
    pub fn new(coef: Vec<Vec<f64>>, intercept: Vec<f64>, classes: Option<Vec<i64>>) -> Result<Self> {
        let model = Self {
            coef,
            intercept,
            classes,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check the fitted parameters are consistent.
    pub fn validate(&self) -> Result<()> {
        let Some(width) = self.coef.first().map(Vec::len) else {
            bail!("Linear model has no coefficient rows");
        };
        if width == 0 {
            bail!("Linear model has no features");
        }
        if self.coef.iter().any(|row| row.len() != width) {
            bail!("Linear model coefficient rows differ in length");
        }
        if self.intercept.len() != self.coef.len() {
            bail!(
                "Linear model has {} coefficient rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            );
        }
        if let Some(classes) = &self.classes {
            if classes.len() != self.class_count() {
                bail!(
                    "Linear model declares {} classes but its decision function yields {}",
                    classes.len(),
                    self.class_count()
                );
            }
        }
        Ok(())
    }

    fn class_count(&self) -> usize {
        if self.coef.len() == 1 {
            2
        } else {
            self.coef.len()
        }
    }

    fn decision(&self, row: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(weights, bias)| weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect()
    }

    fn class_at(&self, column: usize) -> i64 {
        match &self.classes {
            Some(classes) => classes.get(column).copied().unwrap_or(column as i64),
            None => column as i64,
        }
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, row: &[f64]) -> Result<i64> {
        let width = self.n_features().unwrap_or_default();
        if row.len() != width {
            bail!("Linear model expects {} features, got {}", width, row.len());
        }

        let scores = self.decision(row);
        let column = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores)
        };

        Ok(self.class_at(column))
    }

    fn n_features(&self) -> Option<usize> {
        self.coef.first().map(Vec::len)
    }

    fn n_classes(&self) -> Option<usize> {
        Some(self.class_count())
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

/// Index of the largest value; the first wins on ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_value), (i, &v)| {
            if v > best_value {
                (i, v)
            } else {
                (best, best_value)
            }
        })
        .0
}
