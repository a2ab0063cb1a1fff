//! ONNX Health Model

use crate::model::{ModelOutput, SequenceModel};
use crate::PredictionError;
use health_classifier::PARAMETER_COUNT;
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

type HealthPlan = TypedRunnableModel<TypedModel>;

/// Health model loaded from an ONNX file and optimized by tract.
///
/// Input is `[1, sequence_length, 6]` f32 scaled readings. Outputs are
/// read in order: health scores, then optional failure probabilities,
/// then optional time to failure.
pub struct OnnxHealthModel {
    plan: HealthPlan,
    name: String,
    sequence_length: usize,
}

impl OnnxHealthModel {
    /// Load and optimize the model at `path`
    pub fn load(path: impl AsRef<Path>, sequence_length: usize) -> Result<Self, PredictionError> {
        let path = path.as_ref();
        info!("Loading ONNX health model from {}", path.display());

        let plan = build_plan(path, sequence_length)
            .map_err(|e| PredictionError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        info!("Model loaded successfully");
        Ok(Self {
            plan,
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "onnx".to_string()),
            sequence_length,
        })
    }

    fn run(&self, flat: Vec<f32>) -> TractResult<Vec<Vec<f32>>> {
        let input: Tensor =
            tract_ndarray::Array3::from_shape_vec((1, self.sequence_length, PARAMETER_COUNT), flat)?
                .into();
        let outputs = self.plan.run(tvec!(input.into()))?;

        outputs
            .iter()
            .map(|output| Ok(output.to_array_view::<f32>()?.iter().copied().collect()))
            .collect()
    }
}

fn build_plan(path: &Path, sequence_length: usize) -> TractResult<HealthPlan> {
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, f32::fact([1, sequence_length, PARAMETER_COUNT]).into())?
        .into_optimized()?
        .into_runnable()
}

impl SequenceModel for OnnxHealthModel {
    fn infer(&self, window: &[[f32; PARAMETER_COUNT]]) -> Result<ModelOutput, PredictionError> {
        if window.len() != self.sequence_length {
            return Err(PredictionError::InvalidInputShape {
                expected: format!("[1, {}, {}]", self.sequence_length, PARAMETER_COUNT),
                actual: format!("[1, {}, {}]", window.len(), PARAMETER_COUNT),
            });
        }

        let flat: Vec<f32> = window.iter().flatten().copied().collect();
        let outputs = self
            .run(flat)
            .map_err(|e| PredictionError::InferenceFailed(e.to_string()))?;
        debug!("ONNX model produced {} outputs", outputs.len());

        ModelOutput::from_outputs(outputs)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
