use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use log::{error, info};
use thiserror::Error;
use tract_onnx::prelude::*;

use crate::models::{
    LoanApplication, LoanStatus, PredictionResult, FEATURE_COUNT, FEATURE_NAMES,
};

/// A single-row feature matrix, `[1, FEATURE_COUNT]`.
pub type FeatureMatrix = tract_ndarray::Array2<f32>;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("expected input of shape [1, {expected}], got {got:?}")]
    Shape { expected: usize, got: (usize, usize) },
    #[error("Input contains infinity or a value too large for dtype('float32') in {feature}")]
    NonFinite { feature: &'static str },
    #[error("classifier returned no predictions")]
    EmptyOutput,
    #[error(transparent)]
    Runtime(#[from] anyhow::Error),
}

/// A pre-trained binary decision model.
///
/// Implementations are shared read-only across request workers.
pub trait Classifier: Send + Sync {
    /// Returns one class label per row of `batch`.
    fn predict(&self, batch: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError>;
}

pub struct OnnxClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(model_path: P) -> anyhow::Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("reading model artifact {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, FEATURE_COUNT)),
            )?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { model })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, batch: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        if batch.dim() != (1, FEATURE_COUNT) {
            return Err(ClassifierError::Shape {
                expected: FEATURE_COUNT,
                got: batch.dim(),
            });
        }

        let input: Tensor = batch.clone().into();
        let outputs = self.model.run(tvec!(input.into()))?;
        let labels = outputs
            .first()
            .ok_or(ClassifierError::EmptyOutput)?
            .cast_to::<i64>()?;

        Ok(labels.as_slice::<i64>()?.to_vec())
    }
}

/// Loads the classifier once at startup. A missing or unreadable artifact
/// leaves the service running without a model.
pub fn load_classifier<P: AsRef<Path>>(model_path: P) -> Option<Arc<dyn Classifier>> {
    let model_path = model_path.as_ref();
    match OnnxClassifier::load(model_path) {
        Ok(model) => {
            info!("Model loaded from {}", model_path.display());
            Some(Arc::new(model))
        }
        Err(e) => {
            error!("Error loading the model: {:#}", e);
            None
        }
    }
}

/// Narrows the application to `f32`. Values that overflow `f32` are
/// refused here instead of reaching the classifier as infinities.
pub fn feature_matrix(application: &LoanApplication) -> Result<FeatureMatrix, ClassifierError> {
    let features = application.to_array();
    if let Some((feature, _)) = FEATURE_NAMES
        .iter()
        .zip(features.iter())
        .find(|(_, value)| !value.is_finite())
    {
        return Err(ClassifierError::NonFinite { feature: *feature });
    }
    tract_ndarray::Array2::from_shape_vec((1, FEATURE_COUNT), features.to_vec())
        .map_err(|e| ClassifierError::Runtime(e.into()))
}

/// Runs one application through `classifier` and maps the first label.
pub fn predict_status(
    classifier: &dyn Classifier,
    application: &LoanApplication,
) -> Result<PredictionResult, ClassifierError> {
    let batch = feature_matrix(application)?;
    let labels = classifier.predict(&batch)?;
    let label = *labels.first().ok_or(ClassifierError::EmptyOutput)?;

    Ok(PredictionResult {
        loan_status: LoanStatus::from_label(label),
    })
}
