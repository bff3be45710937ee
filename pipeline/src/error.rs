use std::{fmt, io, path::PathBuf};

use exporter::ExportErr;
use machine_learning::MlErr;

/// All errors that can end an export run.
#[derive(Debug)]
pub enum PipelineError {
    /// Invalid configuration, caught before any stage runs.
    InvalidConfig(String),
    /// The architecture could not be built for the configured shapes.
    Architecture(MlErr),
    /// The synthetic sample or the training step failed.
    Initialization(MlErr),
    Export(ExportErr),
    /// The alphabet does not name every output of the network.
    LabelCount { expected: usize, got: usize },
    Filesystem { path: PathBuf, source: io::Error },
}

impl PipelineError {
    /// Returns the name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "config",
            Self::Architecture(_) => "architecture",
            Self::Initialization(_) => "initialization",
            Self::Export(_) => "export",
            Self::LabelCount { .. } => "labels",
            Self::Filesystem { .. } => "sink",
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Architecture(e) => write!(f, "architecture: {e}"),
            Self::Initialization(e) => write!(f, "initialization: {e}"),
            Self::Export(e) => write!(f, "export: {e}"),
            Self::LabelCount { expected, got } => write!(
                f,
                "labels: the model has {expected} outputs but the alphabet has {got} labels"
            ),
            Self::Filesystem { path, source } => {
                write!(f, "sink: {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Architecture(e) | Self::Initialization(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Filesystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExportErr> for PipelineError {
    fn from(e: ExportErr) -> Self {
        Self::Export(e)
    }
}
