use ndarray::{Array2, ArrayView2, Zip};

use super::LossFn;

/// Categorical cross entropy between one-hot targets and predicted class probabilities.
///
/// Predictions are clipped to `[epsilon, 1 - epsilon]` so the logarithm stays finite.
#[derive(Clone, Copy, Debug)]
pub struct CrossEntropy {
    epsilon: f32,
}

impl Default for CrossEntropy {
    fn default() -> Self {
        Self { epsilon: 1e-7 }
    }
}

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self::default()
    }

    fn clip(&self, p: f32) -> f32 {
        p.clamp(self.epsilon, 1.0 - self.epsilon)
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        let n = y_pred.nrows().max(1) as f32;

        let total = Zip::from(&y_pred)
            .and(&y)
            .fold(0.0, |acc, &p, &y| acc - y * self.clip(p).ln());

        total / n
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let n = y_pred.nrows().max(1) as f32;
        Zip::from(&y_pred)
            .and(&y)
            .map_collect(|&p, &y| -y / (self.clip(p) * n))
    }
}
