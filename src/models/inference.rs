//! Scaler → classifier → label encoder prediction pipeline

use crate::feature_extractor::{FeatureExtractor, FEATURE_COUNT};
use crate::models::classifier::Classifier;
use crate::models::label_encoder::LabelEncoder;
use crate::models::loader::Artifacts;
use crate::models::scaler::Scaler;
use crate::types::prediction::Prediction;
use crate::types::score::ScoreInput;
use anyhow::{bail, Context, Result};
use tracing::debug;

/// Runs submitted scores through the fitted artifacts.
///
/// Immutable once built; share it behind an `Arc`.
pub struct Predictor {
    extractor: FeatureExtractor,
    scaler: Scaler,
    classifier: Box<dyn Classifier>,
    label_encoder: LabelEncoder,
}

impl Predictor {
    /// Assemble a predictor, checking the artifacts agree with each other
    pub fn new(
        scaler: Scaler,
        classifier: Box<dyn Classifier>,
        label_encoder: LabelEncoder,
    ) -> Result<Self> {
        let extractor = FeatureExtractor::new();
        let expected = extractor.feature_count();

        if scaler.n_features() != expected {
            bail!(
                "Scaler was fitted on {} features, expected {}",
                scaler.n_features(),
                expected
            );
        }

        if let Some(width) = classifier.n_features() {
            if width != expected {
                bail!(
                    "{} classifier expects {} features, expected {}",
                    classifier.kind(),
                    width,
                    expected
                );
            }
        }

        if let Some(classes) = classifier.n_classes() {
            if classes > label_encoder.len() {
                bail!(
                    "Classifier emits {} classes but the label encoder knows {}",
                    classes,
                    label_encoder.len()
                );
            }
        }

        Ok(Self {
            extractor,
            scaler,
            classifier,
            label_encoder,
        })
    }

    pub fn from_artifacts(artifacts: Artifacts) -> Result<Self> {
        Self::new(
            artifacts.scaler,
            artifacts.classifier,
            artifacts.label_encoder,
        )
    }

    /// Predict the label for one set of scores
    pub fn predict(&self, input: &ScoreInput) -> Result<Prediction> {
        let features = self.extractor.extract(input);

        let scaled = self
            .scaler
            .transform(&features)
            .context("Failed to scale features")?;

        let index = self
            .classifier
            .predict(&scaled)
            .context("Classifier inference failed")?;

        let label = self.label_encoder.inverse_transform(index)?.to_string();

        debug!(
            class_index = index,
            label = %label,
            "Prediction complete"
        );

        Ok(Prediction {
            // inverse_transform succeeded, so the index is in range
            class_index: index as usize,
            label,
        })
    }

    /// Labels the predictor can return
    pub fn classes(&self) -> &[String] {
        self.label_encoder.classes()
    }

    /// Input columns, in the order the artifacts were fitted on
    pub fn feature_names(&self) -> [&'static str; FEATURE_COUNT] {
        self.extractor.feature_names()
    }

    pub fn classifier_kind(&self) -> &'static str {
        self.classifier.kind()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::classifier::LinearClassifier;
    use crate::models::onnx::OnnxClassifier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) fn encoder() -> LabelEncoder {
        LabelEncoder::new(
            ["group A", "group B", "group C", "group D", "group E"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
        .unwrap()
    }

    pub(crate) fn scaler() -> Scaler {
        Scaler::Standard {
            mean: vec![66.0, 69.0, 68.0],
            scale: vec![15.0, 14.6, 15.2],
        }
    }

    /// Classifier returning a fixed index and counting its calls
    pub(crate) struct FixedClassifier {
        pub index: i64,
        pub calls: Arc<AtomicUsize>,
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, _row: &[f64]) -> Result<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.index)
        }

        fn n_features(&self) -> Option<usize> {
            Some(FEATURE_COUNT)
        }

        fn n_classes(&self) -> Option<usize> {
            None
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    fn linear_predictor() -> Predictor {
        // Math-heavy rows favour group E, reading-heavy rows group A
        let classifier = LinearClassifier::new(
            vec![
                vec![-1.0, 1.0, 0.0],
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.1],
                vec![0.0, 0.0, 0.0],
                vec![1.0, -1.0, 0.0],
            ],
            vec![0.0; 5],
            None,
        )
        .unwrap();

        Predictor::new(scaler(), Box::new(classifier), encoder()).unwrap()
    }

    #[test]
    fn test_predict_decodes_label() {
        let predictor = linear_predictor();

        let prediction = predictor
            .predict(&ScoreInput::new(90.0, 60.0, 70.0))
            .unwrap();
        assert_eq!(prediction.label, "group E");
        assert_eq!(prediction.class_index, 4);

        let prediction = predictor
            .predict(&ScoreInput::new(50.0, 95.0, 70.0))
            .unwrap();
        assert_eq!(prediction.label, "group A");
    }

    #[test]
    fn test_prediction_is_always_a_known_class() {
        let predictor = linear_predictor();

        for math in (0..=100).step_by(20) {
            for reading in (0..=100).step_by(25) {
                let input = ScoreInput::new(f64::from(math), f64::from(reading), 65.0);
                let prediction = predictor.predict(&input).unwrap();
                assert!(predictor.classes().contains(&prediction.label));
            }
        }
    }

    #[test]
    fn test_predict_is_idempotent() {
        let predictor = linear_predictor();
        let input = ScoreInput::new(60.0, 70.0, 65.0);

        assert_eq!(
            predictor.predict(&input).unwrap(),
            predictor.predict(&input).unwrap()
        );
    }

    #[test]
    fn test_out_of_range_class_is_an_error() {
        let classifier = FixedClassifier {
            index: 7,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let predictor = Predictor::new(scaler(), Box::new(classifier), encoder()).unwrap();

        assert!(predictor.predict(&ScoreInput::new(1.0, 2.0, 3.0)).is_err());
    }

    #[test]
    fn test_scaler_width_mismatch_rejected() {
        let scaler = Scaler::Standard {
            mean: vec![0.0; 4],
            scale: vec![1.0; 4],
        };
        let classifier = FixedClassifier {
            index: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        };

        assert!(Predictor::new(scaler, Box::new(classifier), encoder()).is_err());
    }

    #[test]
    fn test_classifier_with_more_classes_than_encoder_rejected() {
        let classifier =
            LinearClassifier::new(vec![vec![0.0; 3]; 6], vec![0.0; 6], None).unwrap();

        assert!(Predictor::new(scaler(), Box::new(classifier), encoder()).is_err());
    }

    #[test]
    fn test_feature_names_follow_form_order() {
        assert_eq!(
            linear_predictor().feature_names(),
            ["math score", "reading score", "writing score"]
        );
    }

    #[test]
    fn test_onnx_width_mismatch_rejected() {
        let path = format!("{}/tests/fixtures/argmax_4.onnx", env!("CARGO_MANIFEST_DIR"));
        let classifier = OnnxClassifier::load(path, 1).unwrap();

        let err = Predictor::new(scaler(), Box::new(classifier), encoder())
            .err()
            .unwrap();
        assert!(err.to_string().contains("onnx classifier expects 4 features"));
    }

    #[test]
    fn test_onnx_pipeline_decodes_label() {
        let path = format!("{}/tests/fixtures/argmax_3.onnx", env!("CARGO_MANIFEST_DIR"));
        let classifier = OnnxClassifier::load(path, 1).unwrap();
        let predictor = Predictor::new(scaler(), Box::new(classifier), encoder()).unwrap();

        // Reading is furthest above its mean once scaled
        let prediction = predictor
            .predict(&ScoreInput::new(60.0, 95.0, 70.0))
            .unwrap();
        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.label, "group B");
    }
}
