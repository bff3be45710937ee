pub mod configs;
pub mod error;
pub mod labels;
pub mod sink;

use exporter::ModelExporter;
use log::info;
use machine_learning::training::{GraphInitializer, TrainingSample};
use rand::{Rng, SeedableRng, rngs::StdRng};

use configs::PipelineConfig;
use error::PipelineError;
use labels::LabelWriter;
use sink::{ArtifactSink, Artifacts};

/// Runs every stage of the export in order: builds the architecture, initializes it with one
/// training step over a synthetic sample, serializes it, computes its labels and writes both
/// artifacts.
///
/// Nothing is written unless every previous stage succeeded.
///
/// # Arguments
/// * `config` - The configuration of the run.
///
/// # Returns
/// The written artifacts or the error of the first stage that failed.
pub fn run(config: &PipelineConfig) -> Result<Artifacts, PipelineError> {
    config.validate()?;

    let model = &config.model;
    let graph = model
        .builder()
        .build(model.input_shape, model.num_classes)
        .map_err(PipelineError::Architecture)?;

    info!(
        layers = graph.layers().len(),
        params = graph.param_count();
        "architecture built"
    );

    let training = &config.training;
    let mut rng = match training.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let sample = TrainingSample::synthetic(
        graph.input_shape(),
        graph.num_classes(),
        training.class_index,
        &mut rng,
    )
    .map_err(PipelineError::Initialization)?;

    // The kernels draw from their own stream, seeded off the sample's.
    let weights_seed = rng.random::<u64>();
    let initialized = GraphInitializer::new(training.optimizer, Some(weights_seed))
        .initialize(&graph, &sample)
        .map_err(PipelineError::Initialization)?;

    let serialized = ModelExporter::new().export(&initialized)?;
    info!(bytes = serialized.len(); "model exported");

    let labels = LabelWriter::new(&config.labels.alphabet)?.labels_for(graph.output_width())?;

    let artifacts = ArtifactSink::from(&config.output).write(&serialized, &labels)?;
    info!(
        "artifacts written to {} and {}",
        artifacts.model_path.display(),
        artifacts.labels_path.display()
    );

    Ok(artifacts)
}
