use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Where the artifacts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub out_dir: PathBuf,
    pub model_file: String,
    pub labels_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("assets/ml"),
            model_file: "asl_alphabet.safetensors".into(),
            labels_file: "asl_labels.txt".into(),
        }
    }
}

impl OutputConfig {
    pub(super) fn validate(&self) -> Result<(), PipelineError> {
        if self.out_dir.as_os_str().is_empty() {
            return Err(PipelineError::InvalidConfig("out_dir is empty".into()));
        }

        let names = [
            ("model_file", &self.model_file),
            ("labels_file", &self.labels_file),
        ];

        for (field, name) in names {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{field} must be a plain file name, got {name:?}"
                )));
            }
        }

        if self.model_file == self.labels_file {
            return Err(PipelineError::InvalidConfig(
                "model_file and labels_file must differ".into(),
            ));
        }

        Ok(())
    }
}
