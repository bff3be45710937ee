// Tensors are written and read in host byte order, which only matches the format on
// little-endian targets.
#[cfg(target_endian = "big")]
compile_error!("the exporter only supports little-endian targets");

mod error;
mod export;
mod load;
mod manifest;

pub use error::{ExportErr, Result};
pub use export::{ModelExporter, SerializedModel};
pub use load::LoadedModel;
pub use manifest::{FORMAT, LayerRecord, METADATA_KEY, ModelManifest, VERSION};
