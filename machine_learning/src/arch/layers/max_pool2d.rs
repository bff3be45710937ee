use ndarray::prelude::*;

use crate::{MlErr, Result};

/// Keeps the maximum of each non overlapping `pool` window of every channel.
///
/// Rows and columns that do not fill a whole window are dropped.
#[derive(Clone, Debug)]
pub struct MaxPool2d {
    pool: (usize, usize),

    // Forward metadata
    input_dim: (usize, usize, usize, usize),
    argmax: Vec<usize>,
}

impl MaxPool2d {
    /// Creates a new `MaxPool2d` layer.
    pub fn new(pool: (usize, usize)) -> Self {
        Self {
            pool,
            input_dim: (0, 0, 0, 0),
            argmax: Vec::new(),
        }
    }

    pub fn forward(&mut self, x: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let x = x.into_dimensionality::<Ix4>()?;
        let (n, h, w, c) = x.dim();
        let (ph, pw) = self.pool;
        let (oh, ow) = (h / ph, w / pw);

        if oh == 0 || ow == 0 {
            return Err(MlErr::ShapeMismatch {
                what: "max_pool2d input",
                got: x.shape().to_vec(),
                expected: vec![n, h.max(ph), w.max(pw), c],
            });
        }

        let mut out = Array4::zeros((n, oh, ow, c));
        let mut argmax = Vec::with_capacity(out.len());

        for ((b, i, j, ch), o) in out.indexed_iter_mut() {
            let mut best = f32::NEG_INFINITY;
            let mut best_idx = ((b * h + i * ph) * w + j * pw) * c + ch;

            for r in i * ph..(i + 1) * ph {
                for col in j * pw..(j + 1) * pw {
                    let v = x[(b, r, col, ch)];
                    if v > best {
                        best = v;
                        best_idx = ((b * h + r) * w + col) * c + ch;
                    }
                }
            }

            *o = best;
            argmax.push(best_idx);
        }

        self.input_dim = (n, h, w, c);
        self.argmax = argmax;
        Ok(out.into_dyn())
    }

    /// Routes each delta back to the input position that won its window.
    pub fn backward(&mut self, d: ArrayD<f32>) -> Result<ArrayD<f32>> {
        if d.len() != self.argmax.len() {
            return Err(MlErr::SizeMismatch {
                what: "max_pool2d delta",
                got: d.len(),
                expected: self.argmax.len(),
            });
        }

        let (n, h, w, c) = self.input_dim;
        let mut dx = Array1::zeros(n * h * w * c);

        for (&idx, &g) in self.argmax.iter().zip(d.iter()) {
            dx[idx] += g;
        }

        Ok(dx.into_shape_with_order((n, h, w, c))?.into_dyn())
    }
}
