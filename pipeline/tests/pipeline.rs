use std::fs;

use exporter::LoadedModel;
use machine_learning::{
    arch::InputShape,
    training::{GraphInitializer, TrainingSample},
};
use pipeline::{
    configs::PipelineConfig,
    error::PipelineError,
    labels::CANONICAL_ALPHABET,
    run,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tempfile::tempdir;

fn config_in(dir: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.output.out_dir = dir.join("assets").join("ml");
    config
}

#[test]
fn writes_a_loadable_model_and_the_alphabet() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    let artifacts = run(&config).unwrap();
    assert_eq!(artifacts.num_labels, 26);

    let labels = fs::read_to_string(&artifacts.labels_path).unwrap();
    let lines: Vec<_> = labels.lines().collect();
    let expected: Vec<String> = CANONICAL_ALPHABET.chars().map(String::from).collect();
    assert_eq!(lines, expected);
    assert!(labels.ends_with("Z\n"));

    let bytes = fs::read(&artifacts.model_path).unwrap();
    assert_eq!(bytes.len(), artifacts.model_bytes);

    let mut model = LoadedModel::from_bytes(&bytes).unwrap();
    assert_eq!(model.graph().output_width(), lines.len());

    let mut rng = StdRng::seed_from_u64(5);
    let x = TrainingSample::synthetic(InputShape::new(28, 28, 1), 26, 0, &mut rng)
        .unwrap()
        .x()
        .to_owned();
    let y = model.predict(x).unwrap();
    assert_eq!(y.ncols(), 26);
}

#[test]
fn short_alphabet_fails_before_writing() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.labels.alphabet = CANONICAL_ALPHABET[..25].to_string();

    let err = run(&config).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::LabelCount {
            expected: 26,
            got: 25
        }
    ));
    assert!(!config.output.out_dir.exists());
}

#[test]
fn overwrites_previous_artifacts() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let out_dir = &config.output.out_dir;

    fs::create_dir_all(out_dir).unwrap();
    fs::write(out_dir.join("asl_alphabet.safetensors"), b"stale").unwrap();
    fs::write(out_dir.join("asl_labels.txt"), "OLD\n").unwrap();

    let artifacts = run(&config).unwrap();

    let bytes = fs::read(&artifacts.model_path).unwrap();
    assert!(LoadedModel::from_bytes(&bytes).is_ok());
    assert!(fs::read_to_string(&artifacts.labels_path).unwrap().starts_with("A\n"));
}

#[test]
fn running_twice_leaves_the_same_two_files() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    let first = run(&config).unwrap();
    let first_bytes = fs::read(&first.model_path).unwrap();
    let second = run(&config).unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read(&second.model_path).unwrap(), first_bytes);

    let mut names: Vec<_> = fs::read_dir(&config.output.out_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, ["asl_alphabet.safetensors", "asl_labels.txt"]);

    for name in names {
        let len = fs::metadata(config.output.out_dir.join(name)).unwrap().len();
        assert!(len > 0);
    }
}

#[test]
fn other_class_counts_need_a_matching_alphabet() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.model.num_classes = 10;
    config.labels.alphabet = "0123456789".into();

    let artifacts = run(&config).unwrap();
    assert_eq!(artifacts.num_labels, 10);

    let model = LoadedModel::from_bytes(&fs::read(&artifacts.model_path).unwrap()).unwrap();
    assert_eq!(model.manifest().num_classes, 10);
}

#[test]
fn invalid_shapes_are_architecture_errors() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.model.input_shape = InputShape::new(8, 8, 1);

    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Architecture(_)));
    assert_eq!(err.stage(), "architecture");
}

#[test]
fn unwritable_destination_is_a_filesystem_error() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "a file, not a directory").unwrap();

    let mut config = PipelineConfig::default();
    config.output.out_dir = blocker.join("ml");

    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Filesystem { .. }));
}

#[test]
fn config_files_are_read_from_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "training": { "seed": 7, "class_index": 3 } }"#).unwrap();

    let config = PipelineConfig::from_json_file(&path).unwrap();
    assert_eq!(config.training.seed, Some(7));
    assert_eq!(config.training.class_index, 3);
    assert_eq!(config.model.num_classes, 26);

    fs::write(&path, "{ not json").unwrap();
    let err = PipelineConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

#[test]
fn kernels_do_not_reuse_the_sample_stream() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let artifacts = run(&config).unwrap();
    let loaded = LoadedModel::from_bytes(&fs::read(&artifacts.model_path).unwrap()).unwrap();

    let model = &config.model;
    let graph = model
        .builder()
        .build(model.input_shape, model.num_classes)
        .unwrap();

    let seed = config.training.seed.unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let sample =
        TrainingSample::synthetic(graph.input_shape(), graph.num_classes(), 0, &mut rng).unwrap();
    let derived = rng.random::<u64>();

    let optimizer = config.training.optimizer;
    let expected = GraphInitializer::new(optimizer, Some(derived))
        .initialize(&graph, &sample)
        .unwrap();
    assert_eq!(loaded.params(), expected.params());

    let shared = GraphInitializer::new(optimizer, Some(seed))
        .initialize(&graph, &sample)
        .unwrap();
    assert_ne!(loaded.params(), shared.params());
}
