use crate::arch::ModelGraph;

/// Returns the name under which a parameter tensor is stored, e.g. `layers.01.conv2d.kernel`.
pub fn tensor_name(index: usize, kind: &str, suffix: &str) -> String {
    format!("layers.{index:02}.{kind}.{suffix}")
}

/// A borrowed parameter tensor of an `InitializedGraph`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor<'a> {
    pub name: String,
    pub layer: usize,
    pub shape: Vec<usize>,
    pub data: &'a [f32],
}

/// A `ModelGraph` together with the parameters it holds after its initialization step.
#[derive(Debug, Clone)]
pub struct InitializedGraph {
    graph: ModelGraph,
    params: Vec<f32>,
    loss: f32,
}

impl InitializedGraph {
    pub(super) fn new(graph: ModelGraph, params: Vec<f32>, loss: f32) -> Self {
        Self {
            graph,
            params,
            loss,
        }
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Returns every parameter of the network, layer after layer, kernels before biases.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Returns the loss of the sample measured before the update.
    pub fn loss(&self) -> f32 {
        self.loss
    }

    /// Splits the flat parameters into the named tensors of each layer, in layer order.
    pub fn tensors(&self) -> Vec<NamedTensor<'_>> {
        let mut tensors = Vec::new();
        let mut rest = self.params.as_slice();

        for (i, layer) in self.graph.layers().iter().enumerate() {
            for (suffix, shape) in layer.param_shapes(self.graph.input_shape_of(i)) {
                let (data, next) = rest.split_at(shape.iter().product());
                rest = next;

                tensors.push(NamedTensor {
                    name: tensor_name(i, layer.kind(), suffix),
                    layer: i,
                    shape,
                    data,
                });
            }
        }

        tensors
    }
}
