use ndarray::{Array, Axis, Dimension, Zip};

use super::{Relu, Sigmoid, Softmax};
use crate::arch::ActFnSpec;

/// The activation applied at the end of a layer.
#[derive(Clone, Debug)]
pub enum ActFn {
    Linear,
    Relu(Relu),
    Sigmoid(Sigmoid),
    Softmax(Softmax),
}

impl ActFn {
    pub fn relu() -> Self {
        Self::Relu(Relu::new())
    }

    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    pub fn softmax() -> Self {
        Self::Softmax(Softmax::new())
    }

    /// Resolves the activation described by `spec`.
    pub fn from_spec(spec: ActFnSpec) -> Self {
        match spec {
            ActFnSpec::Linear => Self::Linear,
            ActFnSpec::Relu => Self::relu(),
            ActFnSpec::Sigmoid { amp } => Self::sigmoid(amp),
            ActFnSpec::Softmax => Self::softmax(),
        }
    }

    /// Applies the activation to the layer's weighted sums.
    ///
    /// # Arguments
    /// * `z` - The weighted sums, softmax is computed along its innermost axis.
    ///
    /// # Returns
    /// The activations, with the same shape as `z`.
    pub fn forward<D: Dimension>(&self, mut z: Array<f32, D>) -> Array<f32, D> {
        match self {
            ActFn::Linear => {}
            ActFn::Relu(act) => z.mapv_inplace(|z| act.f(z)),
            ActFn::Sigmoid(act) => z.mapv_inplace(|z| act.f(z)),
            ActFn::Softmax(act) => {
                let axis = Axis(z.ndim() - 1);
                z.lanes_mut(axis).into_iter().for_each(|lane| act.f(lane));
            }
        }

        z
    }

    /// Backpropagates the incoming delta through the activation, in place.
    ///
    /// # Arguments
    /// * `a` - The activations computed on the forward pass.
    /// * `d` - The delta with respect to the activations, replaced by the delta with respect to
    ///   the weighted sums.
    pub fn backward<D: Dimension>(&self, a: &Array<f32, D>, d: &mut Array<f32, D>) {
        match self {
            ActFn::Linear => {}
            ActFn::Relu(act) => d.zip_mut_with(a, |d, &a| *d *= act.df(a)),
            ActFn::Sigmoid(act) => d.zip_mut_with(a, |d, &a| *d *= act.df(a)),
            ActFn::Softmax(act) => {
                let axis = Axis(a.ndim() - 1);
                Zip::from(a.lanes(axis))
                    .and(d.lanes_mut(axis))
                    .for_each(|a, d| act.df(a, d));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn relu_clamps_negatives() {
        let a = ActFn::relu().forward(array![[-1.0, 0.0, 2.5]]);
        assert_eq!(a, array![[0.0, 0.0, 2.5]]);

        let mut d = array![[1.0, 1.0, 1.0]];
        ActFn::relu().backward(&a, &mut d);
        assert_eq!(d, array![[0.0, 0.0, 1.0]]);
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let a = ActFn::softmax().forward(array![[1.0, 2.0, 3.0], [1000.0, 1000.0, 1000.0]]);

        for row in a.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-6);
            assert!(row.iter().all(|p| p.is_finite()));
        }

        assert!(a[[0, 2]] > a[[0, 1]] && a[[0, 1]] > a[[0, 0]]);
        assert!((a[[1, 0]] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn softmax_backward_of_uniform_delta_is_zero() {
        let act = ActFn::softmax();
        let a = act.forward(array![[0.3, -1.2, 2.0, 0.0]]);
        let mut d = array![[1.0, 1.0, 1.0, 1.0]];

        act.backward(&a, &mut d);
        assert!(d.iter().all(|d| d.abs() < 1e-6));
    }

    #[test]
    fn sigmoid_matches_its_definition() {
        let act = ActFn::sigmoid(1.0);
        let a = act.forward(array![0.0, 2.0]);

        assert!((a[0] - 0.5).abs() < 1e-6);
        assert!((a[1] - 1.0 / (1.0 + (-2.0f32).exp())).abs() < 1e-6);

        let mut d = array![1.0, 1.0];
        act.backward(&a, &mut d);
        assert!((d[0] - 0.25).abs() < 1e-6);
    }
}
