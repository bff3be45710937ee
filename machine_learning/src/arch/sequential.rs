use ndarray::{Array2, ArrayD, Ix2};

use super::{Model, ModelGraph, layers::Layer, loss::LossFn};
use crate::{MlErr, Result, optimization::Optimizer};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// The model does not own its parameters, every pass receives one flat slice holding the
/// parameters of each layer back to back, in layer order.
#[derive(Clone, Debug)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// Instantiates every layer of `graph`.
    pub fn from_graph(graph: &ModelGraph) -> Self {
        Self::new(
            graph
                .layers()
                .iter()
                .enumerate()
                .map(|(i, spec)| Layer::from_spec(spec, graph.input_shape_of(i))),
        )
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `params` - The parameters of every layer.
    /// * `x` - The input batch.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn forward(&mut self, params: &[f32], mut x: ArrayD<f32>) -> Result<Array2<f32>> {
        self.check_params(params.len())?;
        let mut rest = params;

        for layer in self.layers.iter_mut() {
            let (curr, next) = rest.split_at(layer.size());
            x = layer.forward(curr, x)?;
            rest = next;
        }

        Ok(x.into_dimensionality::<Ix2>()?)
    }

    fn check_params(&self, got: usize) -> Result<()> {
        let expected = self.size();

        if got != expected {
            return Err(MlErr::SizeMismatch {
                what: "model parameters",
                got,
                expected,
            });
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(Layer::size).sum()
    }

    fn backprop<L, O, I>(
        &mut self,
        params: &mut [f32],
        grad: &mut [f32],
        loss_fn: &L,
        optimizer: &mut O,
        batches: I,
    ) -> Result<f32>
    where
        L: LossFn,
        O: Optimizer,
        I: Iterator<Item = (ArrayD<f32>, Array2<f32>)>,
    {
        self.check_params(grad.len())?;

        let mut total_loss = 0.0;
        let mut num_batches = 0;

        for (x, y) in batches {
            grad.fill(0.0);

            let y_pred = self.forward(params, x)?;
            if y_pred.dim() != y.dim() {
                return Err(MlErr::ShapeMismatch {
                    what: "targets",
                    got: y.shape().to_vec(),
                    expected: y_pred.shape().to_vec(),
                });
            }

            total_loss += loss_fn.loss(y_pred.view(), y.view());
            num_batches += 1;

            let mut d = loss_fn.loss_prime(y_pred.view(), y.view()).into_dyn();
            let mut params_end = params.len();

            for layer in self.layers.iter_mut().rev() {
                let start = params_end - layer.size();
                let range = start..params_end;
                d = layer.backward(&params[range.clone()], &mut grad[range], d)?;
                params_end = start;
            }

            optimizer.update_params(grad, params)?;
        }

        Ok(total_loss / num_batches.max(1) as f32)
    }
}
