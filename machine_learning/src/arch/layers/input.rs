use ndarray::ArrayD;

use crate::{MlErr, Result, arch::InputShape};

/// The entry point of a network, it checks that the incoming batch has the declared shape.
#[derive(Clone, Debug)]
pub struct Input {
    shape: InputShape,
}

impl Input {
    pub fn new(shape: InputShape) -> Self {
        Self { shape }
    }

    pub fn forward(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let expected = self.shape.dims();

        if x.ndim() != 4 || x.shape()[1..] != expected {
            let batch = x.shape().first().copied().unwrap_or_default();

            return Err(MlErr::ShapeMismatch {
                what: "input",
                got: x.shape().to_vec(),
                expected: [&[batch][..], &expected[..]].concat(),
            });
        }

        Ok(x)
    }
}
