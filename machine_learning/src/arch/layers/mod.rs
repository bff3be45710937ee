mod conv2d;
mod dense;
mod flatten;
mod input;
mod layer;
mod max_pool2d;

pub use conv2d::Conv2d;
pub use dense::Dense;
pub use flatten::Flatten;
pub use input::Input;
pub use layer::Layer;
pub use max_pool2d::MaxPool2d;

use crate::{MlErr, Result};

/// Checks that a layer received exactly the amount of parameters (or gradients) it owns.
fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(MlErr::SizeMismatch {
            what,
            got,
            expected,
        });
    }

    Ok(())
}
