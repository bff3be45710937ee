use std::{
    error::Error,
    fmt::{self, Display},
};

use machine_learning::MlErr;
use safetensors::SafeTensorError;

pub type Result<T> = std::result::Result<T, ExportErr>;

/// The error type of exporting and loading a serialized model.
#[derive(Debug)]
pub enum ExportErr {
    /// The graph uses an activation the serialized format cannot express.
    UnsupportedActivation { layer: usize, act_fn: &'static str },
    /// The serialized model would hold no bytes.
    Empty,
    /// Writing or parsing the tensor container failed.
    SafeTensors(SafeTensorError),
    /// Writing or parsing the manifest failed.
    Json(serde_json::Error),
    /// The manifest is missing or describes something this loader does not understand.
    Manifest(String),
    MissingTensor(String),
    TensorShape {
        name: String,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    UnsupportedDtype { name: String, dtype: String },
    /// The network does not output one value per class.
    OutputWidth { got: usize, expected: usize },
    Model(MlErr),
}

impl Display for ExportErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportErr::UnsupportedActivation { layer, act_fn } => write!(
                f,
                "layer {layer} uses the {act_fn} activation, which cannot be exported"
            ),
            ExportErr::Empty => f.write_str("the serialized model is empty"),
            ExportErr::SafeTensors(e) => write!(f, "tensor container error: {e}"),
            ExportErr::Json(e) => write!(f, "manifest encoding error: {e}"),
            ExportErr::Manifest(msg) => write!(f, "invalid manifest: {msg}"),
            ExportErr::MissingTensor(name) => write!(f, "missing tensor {name}"),
            ExportErr::TensorShape {
                name,
                got,
                expected,
            } => write!(
                f,
                "tensor {name} has shape {got:?}, expected {expected:?}"
            ),
            ExportErr::UnsupportedDtype { name, dtype } => {
                write!(f, "tensor {name} has dtype {dtype}, expected F32")
            }
            ExportErr::OutputWidth { got, expected } => write!(
                f,
                "the model outputs {got} values but declares {expected} classes"
            ),
            ExportErr::Model(e) => write!(f, "model error: {e}"),
        }
    }
}

impl Error for ExportErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExportErr::SafeTensors(e) => Some(e),
            ExportErr::Json(e) => Some(e),
            ExportErr::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SafeTensorError> for ExportErr {
    fn from(value: SafeTensorError) -> Self {
        Self::SafeTensors(value)
    }
}

impl From<serde_json::Error> for ExportErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<MlErr> for ExportErr {
    fn from(value: MlErr) -> Self {
        Self::Model(value)
    }
}
