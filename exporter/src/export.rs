use std::collections::HashMap;

use log::debug;
use machine_learning::training::InitializedGraph;
use safetensors::{Dtype, tensor::TensorView};

use crate::{ExportErr, METADATA_KEY, ModelManifest, Result};

/// The bytes of an exported model, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedModel(Vec<u8>);

impl SerializedModel {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Serializes initialized graphs into SafeTensors blobs.
///
/// The parameters of each layer are stored as little-endian `f32` tensors named after the layer
/// (see `machine_learning::training::tensor_name`) and the header metadata carries a JSON
/// `ModelManifest` under `METADATA_KEY`. The same graph and parameters always produce the same
/// bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelExporter;

impl ModelExporter {
    pub fn new() -> Self {
        Self
    }

    /// Exports `model`.
    ///
    /// # Returns
    /// The serialized model, or an error if the graph cannot be described by a `ModelManifest`.
    pub fn export(&self, model: &InitializedGraph) -> Result<SerializedModel> {
        let manifest = ModelManifest::from_graph(model.graph())?;
        let metadata = HashMap::from([(METADATA_KEY.to_string(), manifest.to_json()?)]);

        let tensors = model.tensors();
        let mut views = Vec::with_capacity(tensors.len());

        for tensor in &tensors {
            debug!(layer = tensor.layer; "exporting {} {:?}", tensor.name, tensor.shape);

            let bytes: &[u8] = bytemuck::cast_slice(tensor.data);
            let view = TensorView::new(Dtype::F32, tensor.shape.clone(), bytes)?;
            views.push((tensor.name.as_str(), view));
        }

        let bytes = safetensors::serialize(views, &Some(metadata))?;
        if bytes.is_empty() {
            return Err(ExportErr::Empty);
        }

        Ok(SerializedModel(bytes))
    }
}
