use std::env;

use anyhow::Context;
use log::error;
use pipeline::configs::PipelineConfig;

/// Names an optional JSON file with the configuration of the run.
const CONFIG_VAR: &str = "ASL_EXPORT_CONFIG";

/// Overrides the configured output directory.
const OUT_DIR_VAR: &str = "ASL_EXPORT_OUT_DIR";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = match env::var(CONFIG_VAR) {
        Ok(path) => PipelineConfig::from_json_file(&path)
            .with_context(|| format!("loading the config named by {CONFIG_VAR}"))?,
        Err(_) => PipelineConfig::default(),
    };

    if let Ok(out_dir) = env::var(OUT_DIR_VAR) {
        config.output.out_dir = out_dir.into();
    }

    let artifacts =
        pipeline::run(&config).inspect_err(|e| error!("{} stage failed: {e}", e.stage()))?;

    println!(
        "Model saved to {} ({} bytes)",
        artifacts.model_path.display(),
        artifacts.model_bytes
    );
    println!(
        "Labels saved to {} ({} labels)",
        artifacts.labels_path.display(),
        artifacts.num_labels
    );

    Ok(())
}
