//! Prediction results and the page messages derived from them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded classifier output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Class index returned by the classifier
    pub class_index: usize,
    /// Label decoded by the label encoder
    pub label: String,
}

/// Text shown beneath the input form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMessage {
    Prediction(String),
    InvalidInput,
    InternalError,
}

impl PageMessage {
    pub fn text(&self) -> String {
        match self {
            PageMessage::Prediction(label) => format!("Predicted race/ethnicity: {}", label),
            PageMessage::InvalidInput => "Invalid input: please enter numeric scores.".to_string(),
            PageMessage::InternalError => "Prediction failed: internal model error.".to_string(),
        }
    }
}

impl From<&Prediction> for PageMessage {
    fn from(prediction: &Prediction) -> Self {
        PageMessage::Prediction(prediction.label.clone())
    }
}

impl fmt::Display for PageMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
