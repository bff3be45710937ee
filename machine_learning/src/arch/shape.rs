use serde::{Deserialize, Serialize};

/// The shape of a single input image: `height x width x channels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl InputShape {
    /// Creates a new `InputShape`.
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Whether every dimension is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.height > 0 && self.width > 0 && self.channels > 0
    }

    /// Returns the dimensions as `[height, width, channels]`.
    pub fn dims(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }

    /// Returns the amount of values of a single image, saturating at `usize::MAX`.
    pub fn numel(&self) -> usize {
        TensorShape::from(*self).numel()
    }
}

/// The shape of the tensor flowing between two layers, excluding the batch dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorShape {
    Spatial {
        height: usize,
        width: usize,
        channels: usize,
    },
    Flat {
        len: usize,
    },
}

impl TensorShape {
    /// Returns the dimensions of the tensor, without the batch dimension.
    pub fn dims(&self) -> Vec<usize> {
        match *self {
            TensorShape::Spatial {
                height,
                width,
                channels,
            } => vec![height, width, channels],
            TensorShape::Flat { len } => vec![len],
        }
    }

    /// Returns the amount of values of the tensor, or `None` if it does not fit a `usize`.
    pub fn checked_numel(&self) -> Option<usize> {
        checked_product(&self.dims())
    }

    /// Returns the amount of values of the tensor, saturating at `usize::MAX`.
    ///
    /// Every shape of a `ModelGraph` has a representable amount of values, so this only saturates
    /// on shapes built by hand.
    pub fn numel(&self) -> usize {
        self.checked_numel().unwrap_or(usize::MAX)
    }

    /// Returns the size of the innermost dimension, the *width* a dense consumer sees.
    pub fn width(&self) -> usize {
        match *self {
            TensorShape::Spatial { channels, .. } => channels,
            TensorShape::Flat { len } => len,
        }
    }
}

/// Multiplies `dims` together, `None` on overflow.
pub(crate) fn checked_product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

impl From<InputShape> for TensorShape {
    fn from(value: InputShape) -> Self {
        TensorShape::Spatial {
            height: value.height,
            width: value.width,
            channels: value.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numel_and_dims() {
        let input = InputShape::new(28, 28, 1);
        assert_eq!(input.numel(), 784);
        assert_eq!(TensorShape::from(input).dims(), [28, 28, 1]);
        assert_eq!(TensorShape::Flat { len: 26 }.numel(), 26);
    }

    #[test]
    fn overflowing_shapes_have_no_numel() {
        let huge = TensorShape::Spatial {
            height: 1 << 32,
            width: 1 << 32,
            channels: 2,
        };

        assert_eq!(huge.checked_numel(), None);
        assert_eq!(huge.numel(), usize::MAX);
        assert_eq!(TensorShape::Flat { len: 1 << 40 }.checked_numel(), Some(1 << 40));
    }

    #[test]
    fn zero_dimension_is_not_positive() {
        assert!(InputShape::new(28, 28, 1).is_positive());
        assert!(!InputShape::new(28, 0, 1).is_positive());
        assert!(!InputShape::new(28, 28, 0).is_positive());
    }
}
