use super::{InputShape, LayerSpec, TensorShape};
use crate::{MlErr, Result};

/// An ordered description of a network's layers and the shapes flowing between them.
///
/// A `ModelGraph` can only be obtained through `ModelGraph::new`, which guarantees that:
///   1. The first layer is an `Input` layer declaring `input_shape`.
///   2. Every intermediate shape is strictly positive.
///   3. The last layer produces a flat tensor of width `num_classes`.
///   4. Every shape and the parameter count fit a `usize`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGraph {
    input_shape: InputShape,
    num_classes: usize,
    layers: Vec<LayerSpec>,
    shapes: Vec<TensorShape>,
    sizes: Vec<usize>,
    param_count: usize,
}

impl ModelGraph {
    /// Creates a new `ModelGraph`.
    ///
    /// # Arguments
    /// * `input_shape` - The shape of a single input image.
    /// * `num_classes` - The width of the network's output.
    /// * `layers` - The layers of the network, starting with its input layer.
    ///
    /// # Returns
    /// The validated graph or the first invariant it breaks.
    pub fn new<I>(input_shape: InputShape, num_classes: usize, layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = LayerSpec>,
    {
        let layers: Vec<_> = layers.into_iter().collect();

        if num_classes == 0 {
            return Err(MlErr::InvalidClassCount { got: num_classes });
        }

        match layers.first() {
            Some(LayerSpec::Input { shape }) if *shape == input_shape => {}
            Some(LayerSpec::Input { shape }) => {
                return Err(MlErr::ShapeMismatch {
                    what: "input layer",
                    got: shape.dims().to_vec(),
                    expected: input_shape.dims().to_vec(),
                });
            }
            Some(other) => {
                return Err(MlErr::InvalidShape {
                    layer: 0,
                    kind: other.kind(),
                    detail: "the first layer must be an input layer".into(),
                });
            }
            None => {
                return Err(MlErr::InvalidShape {
                    layer: 0,
                    kind: "input",
                    detail: "a graph needs at least an input layer".into(),
                });
            }
        }

        let mut shapes = Vec::with_capacity(layers.len());
        let mut sizes = Vec::with_capacity(layers.len());
        let mut param_count = 0usize;
        let mut curr = TensorShape::from(input_shape);

        for (i, layer) in layers.iter().enumerate() {
            let overflow = |what: &str| MlErr::InvalidShape {
                layer: i,
                kind: layer.kind(),
                detail: format!("{what} does not fit a usize"),
            };

            let next = layer.output_shape(i, curr)?;
            next.checked_numel().ok_or_else(|| overflow("the output size"))?;

            let size = layer
                .param_count(curr)
                .ok_or_else(|| overflow("the parameter count"))?;
            param_count = param_count
                .checked_add(size)
                .ok_or_else(|| overflow("the total parameter count"))?;

            curr = next;
            sizes.push(size);
            shapes.push(curr);
        }

        if curr != (TensorShape::Flat { len: num_classes }) {
            return Err(MlErr::ShapeMismatch {
                what: "output layer",
                got: curr.dims(),
                expected: vec![num_classes],
            });
        }

        Ok(Self {
            input_shape,
            num_classes,
            layers,
            shapes,
            sizes,
            param_count,
        })
    }

    /// Returns the shape of a single input image.
    pub fn input_shape(&self) -> InputShape {
        self.input_shape
    }

    /// Returns the amount of classes the network predicts.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Returns the layers of the network in order.
    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Returns the shape produced by each layer, in order.
    pub fn output_shapes(&self) -> &[TensorShape] {
        &self.shapes
    }

    /// Returns the shape fed to the `index`-th layer.
    pub fn input_shape_of(&self, index: usize) -> TensorShape {
        match index {
            0 => self.input_shape.into(),
            i => self.shapes[i - 1],
        }
    }

    /// Returns the width of the network's output.
    pub fn output_width(&self) -> usize {
        self.shapes
            .last()
            .map(TensorShape::width)
            .unwrap_or_default()
    }

    /// Returns the amount of trainable parameters of each layer.
    pub fn layer_sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Returns the total amount of trainable parameters.
    pub fn param_count(&self) -> usize {
        self.param_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ActFnSpec;

    fn input(shape: InputShape) -> LayerSpec {
        LayerSpec::Input { shape }
    }

    fn dense(units: usize) -> LayerSpec {
        LayerSpec::Dense {
            units,
            act_fn: ActFnSpec::Softmax,
        }
    }

    #[test]
    fn tracks_intermediate_shapes() {
        let shape = InputShape::new(4, 4, 2);
        let layers = [input(shape), LayerSpec::Flatten, dense(3)];
        let graph = ModelGraph::new(shape, 3, layers).unwrap();

        assert_eq!(
            graph.output_shapes(),
            [
                TensorShape::from(shape),
                TensorShape::Flat { len: 32 },
                TensorShape::Flat { len: 3 },
            ]
        );
        assert_eq!(graph.layer_sizes(), [0, 0, 32 * 3 + 3]);
        assert_eq!(graph.output_width(), 3);
    }

    #[test]
    fn output_width_must_match_classes() {
        let shape = InputShape::new(4, 4, 1);
        let layers = [input(shape), LayerSpec::Flatten, dense(3)];
        let err = ModelGraph::new(shape, 5, layers).unwrap_err();

        assert!(matches!(
            err,
            MlErr::ShapeMismatch {
                what: "output layer",
                ..
            }
        ));
    }

    #[test]
    fn first_layer_must_declare_the_input_shape() {
        let shape = InputShape::new(4, 4, 1);
        let other = InputShape::new(5, 4, 1);

        let err = ModelGraph::new(shape, 3, [input(other), LayerSpec::Flatten, dense(3)]);
        assert!(matches!(err, Err(MlErr::ShapeMismatch { .. })));

        let err = ModelGraph::new(shape, 3, [LayerSpec::Flatten, dense(3)]);
        assert!(matches!(err, Err(MlErr::InvalidShape { layer: 0, .. })));

        let err = ModelGraph::new(shape, 3, []);
        assert!(matches!(err, Err(MlErr::InvalidShape { layer: 0, .. })));
    }

    #[test]
    fn overflowing_parameter_counts_are_rejected() {
        let shape = InputShape::new(4, 4, 1);
        let layers = [
            input(shape),
            LayerSpec::Flatten,
            LayerSpec::Dense {
                units: 1 << 61,
                act_fn: ActFnSpec::Relu,
            },
            dense(3),
        ];

        let err = ModelGraph::new(shape, 3, layers).unwrap_err();
        assert!(matches!(err, MlErr::InvalidShape { layer: 2, kind: "dense", .. }));
    }

    #[test]
    fn zero_classes_is_rejected() {
        let shape = InputShape::new(4, 4, 1);
        let err = ModelGraph::new(shape, 0, [input(shape), LayerSpec::Flatten, dense(1)]);
        assert!(matches!(err, Err(MlErr::InvalidClassCount { got: 0 })));
    }
}
