//! Type definitions for the prediction service

pub mod prediction;
pub mod score;

pub use prediction::{PageMessage, Prediction};
pub use score::{ScoreInput, ScoreParseError};
