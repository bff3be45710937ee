use ndarray::{linalg, prelude::*};

use super::check_len;
use crate::{MlErr, Result, arch::activations::ActFn};

/// A 2D convolution over NHWC batches with valid padding and unit stride.
///
/// Its parameters are laid out as the `[kh, kw, in_channels, filters]` kernel in row major order
/// followed by the `filters` biases. The forward pass unrolls every receptive field into a row
/// of a matrix so the convolution becomes a single matrix product with the kernel.
#[derive(Clone, Debug)]
pub struct Conv2d {
    in_channels: usize,
    filters: usize,
    kernel: (usize, usize),
    act_fn: ActFn,
    size: usize,

    // Forward metadata
    input_dim: (usize, usize, usize, usize),
    cols: Array2<f32>,
    a: Array4<f32>,
}

impl Conv2d {
    /// Creates a new `Conv2d` layer.
    ///
    /// # Arguments
    /// * `in_channels` - The amount of channels of the input.
    /// * `filters` - The amount of output channels.
    /// * `kernel` - The height and width of the kernel.
    /// * `act_fn` - The activation applied to the feature maps.
    pub fn new(in_channels: usize, filters: usize, kernel: (usize, usize), act_fn: ActFn) -> Self {
        let (kh, kw) = kernel;

        Self {
            in_channels,
            filters,
            kernel,
            act_fn,
            size: (kh * kw * in_channels + 1) * filters,
            input_dim: (0, 0, 0, 0),
            cols: Array2::zeros((0, 0)),
            a: Array4::zeros((0, 0, 0, 0)),
        }
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    fn patch_len(&self) -> usize {
        self.kernel.0 * self.kernel.1 * self.in_channels
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        let (n, h, w, c) = x.dim();
        let (kh, kw) = self.kernel;

        if c != self.in_channels || h < kh || w < kw {
            return Err(MlErr::ShapeMismatch {
                what: "conv2d input",
                got: x.shape().to_vec(),
                expected: vec![n, h.max(kh), w.max(kw), self.in_channels],
            });
        }

        let (oh, ow) = (h - kh + 1, w - kw + 1);
        let mut cols = Array2::zeros((n * oh * ow, self.patch_len()));

        for (row, mut col) in cols.rows_mut().into_iter().enumerate() {
            let (b, i, j) = (row / (oh * ow), (row / ow) % oh, row % ow);
            let field = x.slice(s![b, i..i + kh, j..j + kw, ..]);

            for (dst, &src) in col.iter_mut().zip(field.iter()) {
                *dst = src;
            }
        }

        let (k, bias) = self.view_params(params)?;
        let mut z = Array2::zeros((n * oh * ow, self.filters));
        linalg::general_mat_mul(1.0, &cols, &k, 0.0, &mut z);
        z += &bias;

        let z = z.into_shape_with_order((n, oh, ow, self.filters))?;
        self.input_dim = (n, h, w, c);
        self.cols = cols;
        self.a = self.act_fn.forward(z);
        Ok(self.a.clone().into_dyn())
    }

    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d: ArrayD<f32>,
    ) -> Result<ArrayD<f32>> {
        let mut d = d.into_dimensionality::<Ix4>()?;

        if d.dim() != self.a.dim() {
            return Err(MlErr::ShapeMismatch {
                what: "conv2d delta",
                got: d.shape().to_vec(),
                expected: self.a.shape().to_vec(),
            });
        }

        self.act_fn.backward(&self.a, &mut d);

        let (n, oh, ow, filters) = d.dim();
        let d = d.to_shape((n * oh * ow, filters))?;

        let (mut dk, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &self.cols.t(), &d, 0.0, &mut dk);
        db.assign(&d.sum_axis(Axis(0)));

        let (k, _) = self.view_params(params)?;
        let d_cols = d.dot(&k.t());

        let (kh, kw) = self.kernel;
        let mut dx = Array4::zeros(self.input_dim);

        for (row, d_col) in d_cols.rows().into_iter().enumerate() {
            let (b, i, j) = (row / (oh * ow), (row / ow) % oh, row % ow);
            let mut field = dx.slice_mut(s![b, i..i + kh, j..j + kw, ..]);

            for (dst, &src) in field.iter_mut().zip(d_col.iter()) {
                *dst += src;
            }
        }

        Ok(dx.into_dyn())
    }

    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        check_len("conv2d gradient", grad.len(), self.size)?;

        let (dk_raw, db_raw) = grad.split_at_mut(self.size - self.filters);
        let dk = ArrayViewMut2::from_shape((self.patch_len(), self.filters), dk_raw)?;
        let db = ArrayViewMut1::from_shape(self.filters, db_raw)?;
        Ok((dk, db))
    }

    /// Gives a view of the raw parameter slice as the unrolled kernel and the biases.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        check_len("conv2d parameters", params.len(), self.size)?;

        let (k_raw, b_raw) = params.split_at(self.size - self.filters);
        let kernel = ArrayView2::from_shape((self.patch_len(), self.filters), k_raw)?;
        let biases = ArrayView1::from_shape(self.filters, b_raw)?;
        Ok((kernel, biases))
    }
}
