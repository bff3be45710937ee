use ndarray::{Array2, ArrayView2};

/// A loss function over batches of predictions, one sample per row.
pub trait LossFn {
    /// Returns the mean loss of the batch.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;

    /// Returns the derivative of `loss` with respect to each prediction.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32>;
}
