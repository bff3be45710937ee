mod labels;
mod model;
mod output;
mod training;

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

pub use labels::LabelsConfig;
pub use model::ModelConfig;
pub use output::OutputConfig;
pub use training::TrainingConfig;

use crate::error::PipelineError;

/// The whole configuration of an export run. Every field has a default, so a JSON file only needs
/// to name what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub labels: LabelsConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Reads a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PipelineError::Filesystem {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&json).map_err(|e| {
            PipelineError::InvalidConfig(format!("{}: {e}", path.display()))
        })
    }

    /// Checks the values no later stage validates on its own.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.training.validate(&self.model)?;
        self.labels.validate()?;
        self.output.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_asl_export() {
        let config = PipelineConfig::default();

        assert_eq!(config.model.input_shape.dims(), [28, 28, 1]);
        assert_eq!(config.model.num_classes, 26);
        assert_eq!(config.training.seed, Some(42));
        assert_eq!(config.labels.alphabet, "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(config.output.out_dir, Path::new("assets/ml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_the_other_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{ "model": { "num_classes": 10 }, "output": { "out_dir": "/tmp/out" } }"#,
        )
        .unwrap();

        assert_eq!(config.model.num_classes, 10);
        assert_eq!(config.model.hidden_units, 128);
        assert_eq!(config.output.out_dir, Path::new("/tmp/out"));
        assert_eq!(config.output.model_file, "asl_alphabet.safetensors");
    }

    #[test]
    fn unknown_files_are_filesystem_errors() {
        let err = PipelineConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, PipelineError::Filesystem { .. }));
    }
}
