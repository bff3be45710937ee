use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use exporter::SerializedModel;
use log::debug;

use crate::{configs::OutputConfig, error::PipelineError, labels::LabelSet};

/// What an `ArtifactSink` wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub model_bytes: usize,
    pub num_labels: usize,
}

/// Writes the serialized model and its labels into a directory, replacing older artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSink {
    out_dir: PathBuf,
    model_file: String,
    labels_file: String,
}

impl From<&OutputConfig> for ArtifactSink {
    fn from(config: &OutputConfig) -> Self {
        Self {
            out_dir: config.out_dir.clone(),
            model_file: config.model_file.clone(),
            labels_file: config.labels_file.clone(),
        }
    }
}

impl ArtifactSink {
    /// Creates a sink writing the default file names into `out_dir`.
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Self::from(&OutputConfig::default())
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.out_dir.join(&self.model_file)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.out_dir.join(&self.labels_file)
    }

    /// Creates the output directory if needed and writes both files.
    ///
    /// # Returns
    /// The written paths, or a `Filesystem` error naming the path that failed. A failure while
    /// writing the labels leaves the freshly written model in place.
    pub fn write(
        &self,
        model: &SerializedModel,
        labels: &LabelSet,
    ) -> Result<Artifacts, PipelineError> {
        fs::create_dir_all(&self.out_dir).map_err(|source| PipelineError::Filesystem {
            path: self.out_dir.clone(),
            source,
        })?;

        let model_path = self.model_path();
        write_file(&model_path, model.as_bytes())?;
        debug!(bytes = model.len(); "wrote {}", model_path.display());

        let labels_path = self.labels_path();
        write_file(&labels_path, labels.to_text().as_bytes())?;
        debug!(labels = labels.len(); "wrote {}", labels_path.display());

        Ok(Artifacts {
            model_path,
            labels_path,
            model_bytes: model.len(),
            num_labels: labels.len(),
        })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let fs_err = |source: io::Error| PipelineError::Filesystem {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(fs_err)?);
    writer.write_all(bytes).map_err(fs_err)?;

    let file = writer.into_inner().map_err(|e| fs_err(e.into_error()))?;
    file.sync_all().map_err(fs_err)
}
