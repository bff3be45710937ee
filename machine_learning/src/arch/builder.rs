use log::debug;

use super::{ActFnSpec, InputShape, LayerSpec, ModelGraph};
use crate::{MlErr, Result};

/// Builds the classifier's `ModelGraph`: two convolution and max-pool stages followed by a
/// flatten, a hidden dense layer and a softmax output layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchitectureBuilder {
    conv_filters: [usize; 2],
    kernel: (usize, usize),
    pool: (usize, usize),
    hidden_units: usize,
}

impl Default for ArchitectureBuilder {
    fn default() -> Self {
        Self {
            conv_filters: [32, 64],
            kernel: (3, 3),
            pool: (2, 2),
            hidden_units: 128,
        }
    }
}

impl ArchitectureBuilder {
    /// Creates a new `ArchitectureBuilder` with the default topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the amount of filters of each convolution stage.
    pub fn with_conv_filters(mut self, conv_filters: [usize; 2]) -> Self {
        self.conv_filters = conv_filters;
        self
    }

    /// Sets the kernel size shared by both convolutions.
    pub fn with_kernel(mut self, kernel: (usize, usize)) -> Self {
        self.kernel = kernel;
        self
    }

    /// Sets the window shared by both max-pool layers.
    pub fn with_pool(mut self, pool: (usize, usize)) -> Self {
        self.pool = pool;
        self
    }

    /// Sets the width of the hidden dense layer.
    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = hidden_units;
        self
    }

    /// Builds the graph for the given input shape and amount of classes.
    ///
    /// # Arguments
    /// * `input_shape` - The shape of a single input image, every dimension must be positive.
    /// * `num_classes` - The width of the output layer, at least 1.
    ///
    /// # Returns
    /// The graph, or an `InvalidShape` error if some stage would shrink the image to nothing.
    pub fn build(&self, input_shape: InputShape, num_classes: usize) -> Result<ModelGraph> {
        if !input_shape.is_positive() {
            return Err(MlErr::InvalidShape {
                layer: 0,
                kind: "input",
                detail: format!(
                    "input dimensions must be positive, got {:?}",
                    input_shape.dims()
                ),
            });
        }

        if num_classes == 0 {
            return Err(MlErr::InvalidClassCount { got: num_classes });
        }

        let mut layers = vec![LayerSpec::Input { shape: input_shape }];

        for filters in self.conv_filters {
            layers.push(LayerSpec::Conv2d {
                filters,
                kernel: self.kernel,
                act_fn: ActFnSpec::Relu,
            });
            layers.push(LayerSpec::MaxPool2d { pool: self.pool });
        }

        layers.extend([
            LayerSpec::Flatten,
            LayerSpec::Dense {
                units: self.hidden_units,
                act_fn: ActFnSpec::Relu,
            },
            LayerSpec::Dense {
                units: num_classes,
                act_fn: ActFnSpec::Softmax,
            },
        ]);

        let graph = ModelGraph::new(input_shape, num_classes, layers)?;

        for (i, (layer, shape)) in graph.layers().iter().zip(graph.output_shapes()).enumerate() {
            debug!("layer {i}: {} -> {:?}", layer.kind(), shape.dims());
        }

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::TensorShape;

    #[test]
    fn default_topology_for_28x28_grayscale() {
        let graph = ArchitectureBuilder::new()
            .build(InputShape::new(28, 28, 1), 26)
            .unwrap();

        let dims: Vec<_> = graph.output_shapes().iter().map(TensorShape::dims).collect();
        assert_eq!(
            dims,
            [
                vec![28, 28, 1],
                vec![26, 26, 32],
                vec![13, 13, 32],
                vec![11, 11, 64],
                vec![5, 5, 64],
                vec![1600],
                vec![128],
                vec![26],
            ]
        );

        let expected =
            (3 * 3 * 32 + 32) + (3 * 3 * 32 * 64 + 64) + (1600 * 128 + 128) + (128 * 26 + 26);
        assert_eq!(graph.param_count(), expected);
        assert_eq!(
            graph.layers().last().and_then(LayerSpec::act_fn),
            Some(ActFnSpec::Softmax)
        );
    }

    #[test]
    fn output_width_follows_the_class_count() {
        let builder = ArchitectureBuilder::new();

        for num_classes in [1, 2, 10, 26, 100] {
            let graph = builder.build(InputShape::new(28, 28, 1), num_classes).unwrap();
            assert_eq!(graph.output_width(), num_classes);
            assert_eq!(graph.num_classes(), num_classes);
        }
    }

    #[test]
    fn accepts_rectangular_and_multichannel_inputs() {
        let graph = ArchitectureBuilder::new()
            .build(InputShape::new(32, 20, 3), 5)
            .unwrap();

        assert_eq!(graph.output_shapes()[4].dims(), [6, 3, 64]);
    }

    #[test]
    fn smallest_accepted_input() {
        // 10 -> 8 -> 4 -> 2 -> 1
        let builder = ArchitectureBuilder::new();
        assert!(builder.build(InputShape::new(10, 10, 1), 26).is_ok());

        // 9 -> 7 -> 3 -> 1 -> 0
        let err = builder.build(InputShape::new(9, 9, 1), 26).unwrap_err();
        assert!(matches!(err, MlErr::InvalidShape { layer: 4, .. }));
    }

    #[test]
    fn tiny_input_is_rejected() {
        let err = ArchitectureBuilder::new()
            .build(InputShape::new(4, 4, 1), 26)
            .unwrap_err();

        assert!(matches!(err, MlErr::InvalidShape { .. }));
    }

    #[test]
    fn non_positive_arguments_are_rejected() {
        let builder = ArchitectureBuilder::new();

        let err = builder.build(InputShape::new(28, 0, 1), 26).unwrap_err();
        assert!(matches!(err, MlErr::InvalidShape { layer: 0, .. }));

        let err = builder.build(InputShape::new(28, 28, 1), 0).unwrap_err();
        assert!(matches!(err, MlErr::InvalidClassCount { got: 0 }));
    }

    #[test]
    fn zero_sized_kernel_is_rejected() {
        let err = ArchitectureBuilder::new()
            .with_kernel((0, 3))
            .build(InputShape::new(28, 28, 1), 26)
            .unwrap_err();

        assert!(matches!(err, MlErr::InvalidShape { layer: 1, .. }));
    }
}
