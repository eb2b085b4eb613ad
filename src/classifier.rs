//! Model inference and score post-processing.

use std::path::Path;
use std::time::Instant;

use ndarray::Array4;
use tract_onnx::prelude::*;

use crate::error::{ApiError, Result};
use crate::models::DiseaseClass;

/// Anything that maps a preprocessed batch of one image to raw class scores.
pub trait Classifier: Send + Sync {
    fn scores(&self, input: Array4<f32>) -> Result<Vec<f32>>;
}

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX model executed with tract.
pub struct TractClassifier {
    model: OnnxPlan,
}

impl TractClassifier {
    pub fn load(path: impl AsRef<Path>, input_size: u32) -> Result<Self> {
        let path = path.as_ref();
        let started = Instant::now();
        let side = input_size as usize;

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| ApiError::ModelLoad(format!("{}: {}", path.display(), e)))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, side, side, 3)),
            )
            .map_err(|e| ApiError::ModelLoad(e.to_string()))?
            .into_optimized()
            .map_err(|e| ApiError::ModelLoad(format!("optimization failed: {}", e)))?
            .into_runnable()
            .map_err(|e| ApiError::ModelLoad(format!("model is not runnable: {}", e)))?;

        tracing::info!(
            path = %path.display(),
            input_size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model loaded"
        );

        Ok(Self { model })
    }
}

impl Classifier for TractClassifier {
    fn scores(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let tensor = input.into_tensor();

        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| ApiError::Inference(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| ApiError::Inference("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| ApiError::Inference(e.to_string()))?;

        Ok(view.iter().copied().collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class: DiseaseClass,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
}

pub fn classify(classifier: &dyn Classifier, input: Array4<f32>) -> Result<Prediction> {
    let scores = classifier.scores(input)?;
    interpret(scores)
}

/// Validate raw scores and pick the most probable class.
pub fn interpret(scores: Vec<f32>) -> Result<Prediction> {
    if scores.len() != DiseaseClass::ALL.len() {
        return Err(ApiError::Inference(format!(
            "expected {} scores, model produced {}",
            DiseaseClass::ALL.len(),
            scores.len()
        )));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(ApiError::Inference(format!(
            "model produced non-finite scores: {:?}",
            scores
        )));
    }

    let probabilities = if is_distribution(&scores) {
        scores
    } else {
        softmax(&scores)
    };

    // Strict comparison keeps the lowest index on ties.
    let (index, confidence) = probabilities.iter().copied().enumerate().fold(
        (0, f32::NEG_INFINITY),
        |best, (i, p)| if p > best.1 { (i, p) } else { best },
    );
    let class = DiseaseClass::from_index(index)
        .ok_or_else(|| ApiError::Inference(format!("no class for index {}", index)))?;

    Ok(Prediction {
        class,
        confidence: confidence.clamp(0.0, 1.0),
        probabilities,
    })
}

fn is_distribution(scores: &[f32]) -> bool {
    let sum: f32 = scores.iter().sum();
    scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() <= 1e-3
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
