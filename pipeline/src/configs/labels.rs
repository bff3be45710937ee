use serde::{Deserialize, Serialize};

use crate::{error::PipelineError, labels::CANONICAL_ALPHABET};

/// Where class names come from: each `char` of `alphabet` names the class of the same index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub alphabet: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            alphabet: CANONICAL_ALPHABET.to_string(),
        }
    }
}

impl LabelsConfig {
    pub(super) fn validate(&self) -> Result<(), PipelineError> {
        if self.alphabet.is_empty() {
            return Err(PipelineError::InvalidConfig("the alphabet is empty".into()));
        }

        Ok(())
    }
}
