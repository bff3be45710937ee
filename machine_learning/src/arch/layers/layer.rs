use ndarray::ArrayD;

use super::{conv2d, dense, flatten, input, max_pool2d};
use crate::{
    Result,
    arch::{LayerSpec, TensorShape, activations::ActFn},
};

/// A runnable layer of a `Sequential` model.
#[derive(Clone, Debug)]
pub enum Layer {
    Input(input::Input),
    Conv2d(conv2d::Conv2d),
    MaxPool2d(max_pool2d::MaxPool2d),
    Flatten(flatten::Flatten),
    Dense(dense::Dense),
}

use Layer::*;

impl Layer {
    /// Instantiates the layer described by `spec`.
    ///
    /// # Arguments
    /// * `spec` - The description of the layer.
    /// * `input_shape` - The shape of a single sample fed to the layer.
    pub fn from_spec(spec: &LayerSpec, input_shape: TensorShape) -> Self {
        match *spec {
            LayerSpec::Input { shape } => Input(input::Input::new(shape)),
            LayerSpec::Conv2d {
                filters,
                kernel,
                act_fn,
            } => Conv2d(conv2d::Conv2d::new(
                input_shape.width(),
                filters,
                kernel,
                ActFn::from_spec(act_fn),
            )),
            LayerSpec::MaxPool2d { pool } => MaxPool2d(max_pool2d::MaxPool2d::new(pool)),
            LayerSpec::Flatten => Flatten(flatten::Flatten::new()),
            LayerSpec::Dense { units, act_fn } => Dense(dense::Dense::new(
                (input_shape.numel(), units),
                ActFn::from_spec(act_fn),
            )),
        }
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        match self {
            Conv2d(l) => l.size(),
            Dense(l) => l.size(),
            Input(_) | MaxPool2d(_) | Flatten(_) => 0,
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        match self {
            Input(l) => l.forward(x),
            Conv2d(l) => l.forward(params, x),
            MaxPool2d(l) => l.forward(x),
            Flatten(l) => l.forward(x),
            Dense(l) => l.forward(params, x),
        }
    }

    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d: ArrayD<f32>,
    ) -> Result<ArrayD<f32>> {
        match self {
            Input(_) => Ok(d),
            Conv2d(l) => l.backward(params, grad, d),
            MaxPool2d(l) => l.backward(d),
            Flatten(l) => l.backward(d),
            Dense(l) => l.backward(params, grad, d),
        }
    }
}
