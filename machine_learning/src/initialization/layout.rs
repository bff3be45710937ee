use std::{cell::RefCell, rc::Rc};

use log::debug;
use rand::Rng;

use super::{ChainedParamGen, ConstParamGen, ParamGen, RandParamGen};
use crate::{
    Result,
    arch::{LayerSpec, ModelGraph},
};

/// Builds the parameter generator for every trainable tensor of `graph`, in the order the
/// parameters are laid out in the model's flat parameter slice.
///
/// Kernels are drawn from a Glorot uniform distribution whose fans follow the layer kind (a
/// convolution's fans are scaled by its receptive field) and biases start at zero.
///
/// # Arguments
/// * `graph` - The graph to initialize.
/// * `rng` - The random number generator shared by every kernel.
///
/// # Returns
/// A generator yielding exactly `graph.param_count()` values.
pub fn glorot_param_gen<R: Rng + 'static>(
    graph: &ModelGraph,
    rng: Rc<RefCell<R>>,
) -> Result<ChainedParamGen> {
    let mut param_gens: Vec<Box<dyn ParamGen>> = Vec::new();

    for (i, layer) in graph.layers().iter().enumerate() {
        let input = graph.input_shape_of(i);

        let (fan_in, fan_out) = match *layer {
            LayerSpec::Conv2d {
                filters,
                kernel: (kh, kw),
                ..
            } => (kh * kw * input.width(), kh * kw * filters),
            LayerSpec::Dense { units, .. } => (input.numel(), units),
            _ => continue,
        };

        for (name, shape) in layer.param_shapes(input) {
            let len = shape.iter().product();

            if name == "bias" {
                param_gens.push(Box::new(ConstParamGen::new(0., len)));
                continue;
            }

            debug!(
                layer = i,
                fan_in = fan_in,
                fan_out = fan_out;
                "glorot uniform kernel of {len} values"
            );
            param_gens.push(Box::new(RandParamGen::xavier_uniform(
                rng.clone(),
                len,
                fan_in,
                fan_out,
            )?));
        }
    }

    Ok(ChainedParamGen::new(param_gens))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::{ArchitectureBuilder, InputShape};

    #[test]
    fn fills_every_parameter_once() {
        let graph = ArchitectureBuilder::new()
            .with_conv_filters([2, 3])
            .with_hidden_units(4)
            .build(InputShape::new(10, 10, 1), 5)
            .unwrap();
        let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(0)));

        let mut param_gen = glorot_param_gen(&graph, rng).unwrap();
        let params = param_gen.sample(graph.param_count()).unwrap();

        assert_eq!(params.len(), graph.param_count());
        assert!(param_gen.sample(1).is_none());

        // The first convolution: a 3x3x1x2 kernel and then 2 zero biases.
        let limit = (6f32 / (9. + 18.)).sqrt();
        assert!(params[..18].iter().all(|w| w.abs() < limit));
        assert_eq!(params[18..20], [0., 0.]);
    }
}
