use ndarray::prelude::*;

use crate::Result;

/// Reshapes each `height x width x channels` feature map of a batch into a vector.
#[derive(Clone, Debug, Default)]
pub struct Flatten {
    input_shape: Vec<usize>,
}

impl Flatten {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        let (n, h, w, c) = x.dim();
        self.input_shape = x.shape().to_vec();

        Ok(x.to_shape((n, h * w * c))?.into_owned().into_dyn())
    }

    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        Ok(d.to_shape(IxDyn(&self.input_shape))?.into_owned())
    }
}
