use machine_learning::optimization::OptimizerSpec;
use serde::{Deserialize, Serialize};

use super::ModelConfig;
use crate::error::PipelineError;

/// The initialization step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Seeds both the synthetic sample and the initial kernels, `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    /// The class the synthetic sample is labeled with.
    pub class_index: usize,
    pub optimizer: OptimizerSpec,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: Some(42),
            class_index: 0,
            optimizer: OptimizerSpec::default(),
        }
    }
}

impl TrainingConfig {
    pub(super) fn validate(&self, model: &ModelConfig) -> Result<(), PipelineError> {
        if self.class_index >= model.num_classes.max(1) {
            return Err(PipelineError::InvalidConfig(format!(
                "class_index ({}) must be lower than num_classes ({})",
                self.class_index, model.num_classes
            )));
        }

        Ok(())
    }
}
