use std::{cell::RefCell, rc::Rc};

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};

use super::{InitializedGraph, TrainingSample};
use crate::{
    MlErr, Result,
    arch::{Model, ModelGraph, Sequential, loss::CrossEntropy},
    initialization::{ParamGen, glorot_param_gen},
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer, OptimizerSpec},
};

/// Gives a `ModelGraph` concrete parameters: Glorot uniform kernels and zero biases followed by a
/// single optimization step over one sample with categorical cross entropy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphInitializer {
    optimizer: OptimizerSpec,
    seed: Option<u64>,
}

impl Default for GraphInitializer {
    fn default() -> Self {
        Self::new(OptimizerSpec::default(), None)
    }
}

impl GraphInitializer {
    /// Creates a new `GraphInitializer`.
    ///
    /// # Arguments
    /// * `optimizer` - The optimizer used for the training step.
    /// * `seed` - The seed of the kernels' generator, `None` to seed it from the OS.
    pub fn new(optimizer: OptimizerSpec, seed: Option<u64>) -> Self {
        Self { optimizer, seed }
    }

    /// Initializes the parameters of `graph` and trains them on `sample` once.
    ///
    /// # Arguments
    /// * `graph` - The graph to initialize.
    /// * `sample` - The sample of the training step, its images and labels must match the graph's
    ///   input shape and amount of classes.
    ///
    /// # Returns
    /// The initialized graph, or a `ShapeMismatch` error if the sample does not fit the graph.
    pub fn initialize(
        &self,
        graph: &ModelGraph,
        sample: &TrainingSample,
    ) -> Result<InitializedGraph> {
        check_sample(graph, sample)?;

        let len = graph.param_count();
        let rng = generate_rng(self.seed);
        let mut param_gen = glorot_param_gen(graph, rng)?;
        let params = param_gen.sample(len).unwrap_or_default();

        if params.len() != len {
            return Err(MlErr::SizeMismatch {
                what: "initial parameters",
                got: params.len(),
                expected: len,
            });
        }

        debug!(num_params = len, optimizer = self.optimizer.name(); "drew initial parameters");

        let (params, loss) = match self.optimizer {
            OptimizerSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                let optimizer = Adam::new(len, learning_rate, beta1, beta2, epsilon);
                train_step(graph, params, sample, optimizer)?
            }
            OptimizerSpec::GradientDescent { learning_rate } => {
                train_step(graph, params, sample, GradientDescent::new(learning_rate))?
            }
            OptimizerSpec::GradientDescentWithMomentum {
                learning_rate,
                momentum,
            } => {
                let optimizer = GradientDescentWithMomentum::new(len, learning_rate, momentum);
                train_step(graph, params, sample, optimizer)?
            }
        };

        info!(loss = loss; "initialization step done");
        Ok(InitializedGraph::new(graph.clone(), params, loss))
    }
}

fn generate_rng(seed: Option<u64>) -> Rc<RefCell<StdRng>> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Rc::new(RefCell::new(rng))
}

fn check_sample(graph: &ModelGraph, sample: &TrainingSample) -> Result<()> {
    let x = sample.x();

    if x.shape()[1..] != graph.input_shape().dims() {
        return Err(MlErr::ShapeMismatch {
            what: "sample images",
            got: x.shape().to_vec(),
            expected: [&[sample.batch_size()][..], &graph.input_shape().dims()[..]].concat(),
        });
    }

    if sample.y().ncols() != graph.num_classes() {
        return Err(MlErr::ShapeMismatch {
            what: "sample labels",
            got: sample.y().shape().to_vec(),
            expected: vec![sample.batch_size(), graph.num_classes()],
        });
    }

    Ok(())
}

fn train_step<O: Optimizer>(
    graph: &ModelGraph,
    mut params: Vec<f32>,
    sample: &TrainingSample,
    mut optimizer: O,
) -> Result<(Vec<f32>, f32)> {
    let mut model = Sequential::from_graph(graph);
    let mut grad = vec![0.; model.size()];
    let batch = (sample.x().to_owned().into_dyn(), sample.y().to_owned());

    let loss = model.backprop(
        &mut params,
        &mut grad,
        &CrossEntropy::new(),
        &mut optimizer,
        std::iter::once(batch),
    )?;

    Ok((params, loss))
}
