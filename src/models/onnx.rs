//! ONNX Runtime classifier

use crate::models::classifier::Classifier;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{
    DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor, ValueType,
};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier backed by an ONNX Runtime session.
///
/// Accepts graphs exported from common toolkits: an int64 label output is
/// preferred, then a float probability tensor, then `seq(map(int64, float))`
/// probabilities.
pub struct OnnxClassifier {
    /// Running a session needs exclusive access
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output carrying predicted labels, if the graph has one
    label_output: Option<String>,
    /// Output carrying class probabilities, if the graph has one
    probability_output: Option<String>,
    /// Feature width declared by the input, when it is fixed
    n_features: Option<usize>,
}

impl OnnxClassifier {
    /// Load an ONNX model from file
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let n_features = session
            .inputs
            .first()
            .and_then(|input| input_width(&input.input_type));

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());

        if label_output.is_none() && probability_output.is_none() {
            anyhow::bail!(
                "Model {:?} has neither a label nor a probability output",
                path
            );
        }

        info!(
            input = %input_name,
            n_features = ?n_features,
            label_output = ?label_output,
            probability_output = ?probability_output,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
            n_features,
        })
    }

    fn extract_class(&self, outputs: &SessionOutputs) -> Result<i64> {
        if let Some(output) = self.label_output.as_deref().and_then(|name| outputs.get(name)) {
            if let Ok((_, labels)) = output.try_extract_tensor::<i64>() {
                if let Some(&label) = labels.first() {
                    debug!(label = label, "Extracted from label tensor");
                    return Ok(label);
                }
            }
        }

        if let Some(output) = self
            .probability_output
            .as_deref()
            .and_then(|name| outputs.get(name))
        {
            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let dims: Vec<i64> = shape.iter().copied().collect();
                if let Some(class) = class_from_probabilities(&dims, data) {
                    debug!(class = class, "Extracted from probability tensor");
                    return Ok(class);
                }
            }

            if DynSequenceValueType::can_downcast(&output.dtype()) {
                let class = extract_from_sequence_map(output)?;
                debug!(class = class, "Extracted from seq(map)");
                return Ok(class);
            }
        }

        anyhow::bail!("Could not extract a class from the model outputs")
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, row: &[f64]) -> Result<i64> {
        let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;
        let class = self.extract_class(&outputs)?;

        Ok(class)
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn n_classes(&self) -> Option<usize> {
        None
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

/// Last dimension of a tensor input; dynamic (`-1`) or missing dims give `None`
fn input_width(input_type: &ValueType) -> Option<usize> {
    input_type
        .tensor_shape()
        .and_then(|shape| shape.last())
        .and_then(|&dim| usize::try_from(dim).ok())
        .filter(|&dim| dim > 0)
}

/// Extract the most probable class from seq(map(int64, float)) output
fn extract_from_sequence_map(output: &DynValue) -> Result<i64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    // Batch size is always 1
    let map_value = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty sequence"))?;

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    class_from_key_values(&kv_pairs).ok_or_else(|| anyhow::anyhow!("No probability found in map"))
}

/// Most probable class of the first row of a `[batch, classes]` or `[classes]` tensor
fn class_from_probabilities(dims: &[i64], data: &[f32]) -> Option<i64> {
    let num_classes = match dims {
        [_, classes] | [classes] => usize::try_from(*classes).ok()?,
        _ => return None,
    };

    let row = data.get(..num_classes)?;
    if row.is_empty() {
        return None;
    }

    let row: Vec<f64> = row.iter().map(|&p| f64::from(p)).collect();
    Some(crate::models::classifier::argmax(&row) as i64)
}

fn class_from_key_values(pairs: &[(i64, f32)]) -> Option<i64> {
    pairs
        .iter()
        .fold(None, |best: Option<(i64, f32)>, &(class, prob)| match best {
            Some((_, best_prob)) if best_prob >= prob => best,
            _ => Some((class, prob)),
        })
        .map(|(class, _)| class)
}
