use serde::{Deserialize, Serialize};

use super::{InputShape, TensorShape, shape::checked_product};
use crate::{MlErr, Result};

/// The serializable description of an `ActFn`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnSpec {
    Linear,
    Relu,
    Sigmoid { amp: f32 },
    Softmax,
}

impl ActFnSpec {
    /// Returns the name of the activation.
    pub fn name(&self) -> &'static str {
        match self {
            ActFnSpec::Linear => "linear",
            ActFnSpec::Relu => "relu",
            ActFnSpec::Sigmoid { .. } => "sigmoid",
            ActFnSpec::Softmax => "softmax",
        }
    }
}

/// The serializable description of a single layer of a `ModelGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSpec {
    Input {
        shape: InputShape,
    },
    Conv2d {
        filters: usize,
        kernel: (usize, usize),
        act_fn: ActFnSpec,
    },
    MaxPool2d {
        pool: (usize, usize),
    },
    Flatten,
    Dense {
        units: usize,
        act_fn: ActFnSpec,
    },
}

impl LayerSpec {
    /// Returns the name of the layer kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LayerSpec::Input { .. } => "input",
            LayerSpec::Conv2d { .. } => "conv2d",
            LayerSpec::MaxPool2d { .. } => "max_pool2d",
            LayerSpec::Flatten => "flatten",
            LayerSpec::Dense { .. } => "dense",
        }
    }

    /// Returns the activation applied by this layer, if it has one.
    pub fn act_fn(&self) -> Option<ActFnSpec> {
        match *self {
            LayerSpec::Conv2d { act_fn, .. } | LayerSpec::Dense { act_fn, .. } => Some(act_fn),
            _ => None,
        }
    }

    /// Computes the shape this layer produces given the shape it receives.
    ///
    /// Convolutions use valid padding and unit stride, pooling uses a stride equal to its window
    /// and drops the trailing rows and columns that do not fill a whole window.
    ///
    /// # Arguments
    /// * `index` - The position of the layer in its graph, used for error reporting.
    /// * `input` - The shape of the tensor fed to this layer.
    ///
    /// # Returns
    /// The output shape, or an `InvalidShape` error if it would not be strictly positive or the
    /// layer's activation is ill-formed.
    pub fn output_shape(&self, index: usize, input: TensorShape) -> Result<TensorShape> {
        let kind = self.kind();
        let invalid = |detail: String| MlErr::InvalidShape {
            layer: index,
            kind,
            detail,
        };

        match self.act_fn() {
            Some(ActFnSpec::Sigmoid { amp }) if !(amp.is_finite() && amp > 0.) => {
                return Err(invalid(format!("sigmoid amplitude must be positive, got {amp}")));
            }
            _ => {}
        }

        match (*self, input) {
            (LayerSpec::Input { shape }, _) => {
                if index != 0 {
                    return Err(invalid("an input layer can only be the first layer".into()));
                }

                if !shape.is_positive() {
                    return Err(invalid(format!(
                        "input dimensions must be positive, got {:?}",
                        shape.dims()
                    )));
                }

                Ok(shape.into())
            }
            (
                LayerSpec::Conv2d {
                    filters,
                    kernel: (kh, kw),
                    ..
                },
                TensorShape::Spatial {
                    height,
                    width,
                    channels: _,
                },
            ) => {
                if filters == 0 || kh == 0 || kw == 0 {
                    return Err(invalid(format!(
                        "filters and kernel must be positive, got {filters} filters of {kh}x{kw}"
                    )));
                }

                if kh > height || kw > width {
                    return Err(invalid(format!(
                        "a {kh}x{kw} kernel does not fit a {height}x{width} input"
                    )));
                }

                Ok(TensorShape::Spatial {
                    height: height - kh + 1,
                    width: width - kw + 1,
                    channels: filters,
                })
            }
            (
                LayerSpec::MaxPool2d { pool: (ph, pw) },
                TensorShape::Spatial {
                    height,
                    width,
                    channels,
                },
            ) => {
                if ph == 0 || pw == 0 {
                    return Err(invalid(format!(
                        "pool window must be positive, got {ph}x{pw}"
                    )));
                }

                let (height, width) = (height / ph, width / pw);
                if height == 0 || width == 0 {
                    return Err(invalid(format!(
                        "pooling by {ph}x{pw} leaves a {height}x{width} output"
                    )));
                }

                Ok(TensorShape::Spatial {
                    height,
                    width,
                    channels,
                })
            }
            (LayerSpec::Flatten, TensorShape::Spatial { .. }) => match input.checked_numel() {
                Some(len) => Ok(TensorShape::Flat { len }),
                None => Err(invalid(format!(
                    "{:?} has more values than fit a usize",
                    input.dims()
                ))),
            },
            (LayerSpec::Dense { units, .. }, TensorShape::Flat { .. }) => {
                if units == 0 {
                    return Err(invalid("a dense layer needs at least one unit".into()));
                }

                Ok(TensorShape::Flat { len: units })
            }
            (_, input) => Err(invalid(format!(
                "cannot be applied to a tensor of shape {:?}",
                input.dims()
            ))),
        }
    }

    /// Returns the named parameter tensors of this layer and their shapes, kernel first.
    ///
    /// Convolution kernels are laid out as `[kh, kw, in_channels, filters]` and dense kernels as
    /// `[inputs, units]`.
    pub fn param_shapes(&self, input: TensorShape) -> Vec<(&'static str, Vec<usize>)> {
        match *self {
            LayerSpec::Conv2d {
                filters,
                kernel: (kh, kw),
                ..
            } => vec![
                ("kernel", vec![kh, kw, input.width(), filters]),
                ("bias", vec![filters]),
            ],
            LayerSpec::Dense { units, .. } => vec![
                ("kernel", vec![input.numel(), units]),
                ("bias", vec![units]),
            ],
            LayerSpec::Input { .. } | LayerSpec::MaxPool2d { .. } | LayerSpec::Flatten => vec![],
        }
    }

    /// Returns the amount of trainable parameters of this layer, or `None` if it does not fit a
    /// `usize`.
    pub fn param_count(&self, input: TensorShape) -> Option<usize> {
        self.param_shapes(input)
            .iter()
            .try_fold(0usize, |acc, (_, shape)| acc.checked_add(checked_product(shape)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spatial(height: usize, width: usize, channels: usize) -> TensorShape {
        TensorShape::Spatial {
            height,
            width,
            channels,
        }
    }

    #[test]
    fn conv_uses_valid_padding() {
        let conv = LayerSpec::Conv2d {
            filters: 32,
            kernel: (3, 3),
            act_fn: ActFnSpec::Relu,
        };

        let out = conv.output_shape(1, spatial(28, 28, 1)).unwrap();
        assert_eq!(out, spatial(26, 26, 32));
        assert_eq!(conv.param_count(spatial(28, 28, 1)), Some(3 * 3 * 32 + 32));
    }

    #[test]
    fn pool_floors_odd_dimensions() {
        let pool = LayerSpec::MaxPool2d { pool: (2, 2) };
        let out = pool.output_shape(2, spatial(11, 11, 64)).unwrap();
        assert_eq!(out, spatial(5, 5, 64));
    }

    #[test]
    fn kernel_larger_than_input_is_invalid() {
        let conv = LayerSpec::Conv2d {
            filters: 1,
            kernel: (3, 3),
            act_fn: ActFnSpec::Relu,
        };

        let err = conv.output_shape(3, spatial(2, 5, 1)).unwrap_err();
        assert!(matches!(err, MlErr::InvalidShape { layer: 3, .. }));
    }

    #[test]
    fn pooling_to_zero_is_invalid() {
        let pool = LayerSpec::MaxPool2d { pool: (2, 2) };
        let err = pool.output_shape(1, spatial(1, 4, 3)).unwrap_err();
        assert!(matches!(err, MlErr::InvalidShape { .. }));
    }

    #[test]
    fn dense_requires_a_flat_input() {
        let dense = LayerSpec::Dense {
            units: 4,
            act_fn: ActFnSpec::Relu,
        };

        assert!(dense.output_shape(1, spatial(2, 2, 1)).is_err());
        assert_eq!(
            dense.output_shape(1, TensorShape::Flat { len: 8 }).unwrap(),
            TensorShape::Flat { len: 4 }
        );
        assert_eq!(dense.param_count(TensorShape::Flat { len: 8 }), Some(8 * 4 + 4));
    }

    #[test]
    fn sigmoid_amplitude_must_be_positive() {
        for amp in [0.0, -1.0, f32::NAN] {
            let dense = LayerSpec::Dense {
                units: 2,
                act_fn: ActFnSpec::Sigmoid { amp },
            };

            let err = dense.output_shape(2, TensorShape::Flat { len: 4 }).unwrap_err();
            assert!(matches!(err, MlErr::InvalidShape { layer: 2, .. }));
        }

        let dense = LayerSpec::Dense {
            units: 2,
            act_fn: ActFnSpec::Sigmoid { amp: 1.0 },
        };
        assert!(dense.output_shape(2, TensorShape::Flat { len: 4 }).is_ok());
    }

    #[test]
    fn overflowing_param_count_is_none() {
        let dense = LayerSpec::Dense {
            units: 1 << 61,
            act_fn: ActFnSpec::Relu,
        };

        assert_eq!(dense.param_count(TensorShape::Flat { len: 1600 }), None);
    }

    #[test]
    fn input_must_come_first() {
        let input = LayerSpec::Input {
            shape: InputShape::new(4, 4, 1),
        };

        assert!(input.output_shape(0, spatial(4, 4, 1)).is_ok());
        assert!(input.output_shape(2, spatial(4, 4, 1)).is_err());
    }

    #[test]
    fn serde_tagging_is_snake_case() {
        let json = serde_json::to_string(&LayerSpec::MaxPool2d { pool: (2, 2) }).unwrap();
        assert_eq!(json, r#"{"max_pool2d":{"pool":[2,2]}}"#);
    }
}
