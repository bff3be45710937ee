use ndarray::prelude::*;
use ndarray_rand::{RandomExt, rand_distr::Uniform};
use rand::Rng;

use crate::{MlErr, Result, arch::InputShape};

/// A batch of NHWC images together with their one-hot labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    x: Array4<f32>,
    y: Array2<f32>,
}

impl TrainingSample {
    /// Creates a new `TrainingSample`.
    ///
    /// # Arguments
    /// * `x` - The images, with shape `(batch, height, width, channels)`.
    /// * `y` - The labels, one row per image holding a single `1.0` and zeros everywhere else.
    ///
    /// # Returns
    /// The sample, or `InvalidSample` if the batch is empty, the batch sizes disagree or some row
    /// of `y` is not one-hot.
    pub fn new(x: Array4<f32>, y: Array2<f32>) -> Result<Self> {
        if x.is_empty() || y.ncols() == 0 {
            return Err(MlErr::InvalidSample("the sample is empty".into()));
        }

        if x.len_of(Axis(0)) != y.nrows() {
            return Err(MlErr::InvalidSample(format!(
                "{} images but {} labels",
                x.len_of(Axis(0)),
                y.nrows()
            )));
        }

        for (i, row) in y.rows().into_iter().enumerate() {
            let ones = row.iter().filter(|&&v| v == 1.0).count();
            let zeros = row.iter().filter(|&&v| v == 0.0).count();

            if ones != 1 || ones + zeros != row.len() {
                return Err(MlErr::InvalidSample(format!("label {i} is not one-hot")));
            }
        }

        Ok(Self { x, y })
    }

    /// Creates a single image of uniform `[0, 1)` noise labeled as `class_index`.
    ///
    /// # Arguments
    /// * `shape` - The shape of the image.
    /// * `num_classes` - The width of the label.
    /// * `class_index` - The position of the label's `1.0`.
    /// * `rng` - The source of the pixels.
    pub fn synthetic<R: Rng>(
        shape: InputShape,
        num_classes: usize,
        class_index: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if class_index >= num_classes {
            return Err(MlErr::InvalidSample(format!(
                "class {class_index} is out of range for {num_classes} classes"
            )));
        }

        let [height, width, channels] = shape.dims();
        let distribution =
            Uniform::<f32>::new(0., 1.).map_err(|e| MlErr::InvalidSample(e.to_string()))?;
        let x = Array4::random_using((1, height, width, channels), distribution, rng);

        let mut y = Array2::zeros((1, num_classes));
        y[(0, class_index)] = 1.;

        Self::new(x, y)
    }

    /// Returns the images.
    pub fn x(&self) -> ArrayView4<'_, f32> {
        self.x.view()
    }

    /// Returns the one-hot labels.
    pub fn y(&self) -> ArrayView2<'_, f32> {
        self.y.view()
    }

    /// Returns the amount of images.
    pub fn batch_size(&self) -> usize {
        self.y.nrows()
    }

    /// Returns the class of each image.
    pub fn classes(&self) -> Vec<usize> {
        self.y
            .rows()
            .into_iter()
            .map(|row| row.iter().position(|&v| v == 1.0).unwrap_or_default())
            .collect()
    }
}
