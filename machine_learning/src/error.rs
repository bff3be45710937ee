use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;

use crate::initialization::RandErr;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    /// A layer would produce (or was declared with) a non-positive or incompatible shape.
    InvalidShape {
        layer: usize,
        kind: &'static str,
        detail: String,
    },
    /// The declared amount of output classes is not usable.
    InvalidClassCount { got: usize },
    /// A tensor's shape disagrees with the one declared by the graph.
    ShapeMismatch {
        what: &'static str,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    /// A flat buffer's length disagrees with the expected amount of values.
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A training sample is malformed.
    InvalidSample(String),
    /// A parameter generator could not be created.
    ParamGen(RandErr),
    /// An `ndarray` reshape or view failed.
    Tensor(ShapeError),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::InvalidShape {
                layer,
                kind,
                detail,
            } => write!(f, "invalid shape at layer {layer} ({kind}): {detail}"),
            MlErr::InvalidClassCount { got } => {
                write!(f, "the number of classes must be at least 1, got {got}")
            }
            MlErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "shape mismatch for {what}: got {got:?}, expected {expected:?}"
            ),
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "size mismatch for {what}: got {got}, expected {expected}"
            ),
            MlErr::InvalidSample(msg) => write!(f, "invalid training sample: {msg}"),
            MlErr::ParamGen(e) => write!(f, "failed to create a parameter generator: {e}"),
            MlErr::Tensor(e) => write!(f, "tensor error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::ParamGen(e) => Some(e),
            MlErr::Tensor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RandErr> for MlErr {
    fn from(value: RandErr) -> Self {
        Self::ParamGen(value)
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Tensor(value)
    }
}
