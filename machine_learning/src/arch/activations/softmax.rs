use ndarray::{ArrayView1, ArrayViewMut1};

/// Normalizes a vector into a probability distribution.
///
/// Unlike the other activations it is not applied element-wise, it acts on whole lanes of the
/// innermost axis.
#[derive(Clone, Copy, Debug, Default)]
pub struct Softmax;

impl Softmax {
    pub fn new() -> Self {
        Self
    }

    /// Replaces `z` by its softmax, shifting by the maximum first to avoid overflowing `exp`.
    pub fn f(&self, mut z: ArrayViewMut1<f32>) {
        let max = z.fold(f32::NEG_INFINITY, |acc, &z| acc.max(z));
        z.mapv_inplace(|z| (z - max).exp());

        let sum = z.sum();
        z.mapv_inplace(|e| e / sum);
    }

    /// Backpropagates `d` through the softmax given its output `a`, that is, the product of the
    /// softmax jacobian with `d`.
    pub fn df(&self, a: ArrayView1<f32>, mut d: ArrayViewMut1<f32>) {
        let dot = a.dot(&d);
        d.zip_mut_with(&a, |d, &a| *d = a * (*d - dot));
    }
}
