//! Class index to label decoding

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Fitted mapping between class labels and integer indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderFile")]
pub struct LabelEncoder {
    /// Known classes; a label's position is its index
    classes: Vec<String>,
}

/// On-disk layout, validated into a [`LabelEncoder`]
#[derive(Deserialize)]
struct EncoderFile {
    #[serde(alias = "classes_")]
    classes: Vec<String>,
}

impl TryFrom<EncoderFile> for LabelEncoder {
    type Error = anyhow::Error;

    fn try_from(file: EncoderFile) -> Result<Self> {
        Self::new(file.classes)
    }
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            bail!("Label encoder has no classes");
        }
        Ok(Self { classes })
    }

    /// Decode a class index returned by a classifier.
    pub fn inverse_transform(&self, index: i64) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Class index {} is outside the {} known classes",
                    index,
                    self.classes.len()
                )
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
