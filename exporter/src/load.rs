use machine_learning::{
    arch::{ModelGraph, Sequential},
    training::tensor_name,
};
use ndarray::{Array2, Array4};
use safetensors::{Dtype, SafeTensors};

use crate::{ExportErr, METADATA_KEY, ModelManifest, Result};

/// A serialized model read back into a runnable network.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    manifest: ModelManifest,
    graph: ModelGraph,
    params: Vec<f32>,
    model: Sequential,
}

impl LoadedModel {
    /// Parses a blob produced by `ModelExporter::export`.
    ///
    /// # Returns
    /// The model, or an error if the manifest is missing or unknown, or if a tensor is missing,
    /// mis-shaped or not `f32`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ExportErr::Empty);
        }

        let (_, metadata) = SafeTensors::read_metadata(bytes)?;
        let json = metadata
            .metadata()
            .as_ref()
            .and_then(|metadata| metadata.get(METADATA_KEY))
            .ok_or_else(|| ExportErr::Manifest(format!("no {METADATA_KEY} entry in the header")))?;

        let manifest = ModelManifest::from_json(json)?;
        let graph = manifest.to_graph()?;

        let tensors = SafeTensors::deserialize(bytes)?;
        // The manifest is untrusted, the blob bounds how many values can really be read.
        let capacity = graph.param_count().min(bytes.len() / size_of::<f32>());
        let mut params = Vec::with_capacity(capacity);

        for (i, layer) in graph.layers().iter().enumerate() {
            for (suffix, expected) in layer.param_shapes(graph.input_shape_of(i)) {
                let name = tensor_name(i, layer.kind(), suffix);
                let view = tensors
                    .tensor(&name)
                    .map_err(|_| ExportErr::MissingTensor(name.clone()))?;

                if view.dtype() != Dtype::F32 {
                    return Err(ExportErr::UnsupportedDtype {
                        name,
                        dtype: format!("{:?}", view.dtype()),
                    });
                }

                if view.shape() != expected {
                    return Err(ExportErr::TensorShape {
                        name,
                        got: view.shape().to_vec(),
                        expected,
                    });
                }

                params.extend(bytemuck::pod_collect_to_vec::<u8, f32>(view.data()));
            }
        }

        let model = Sequential::from_graph(&graph);

        Ok(Self {
            manifest,
            graph,
            params,
            model,
        })
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Returns the parameters in the same order `InitializedGraph::params` lays them out.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Computes the class probabilities of a batch of NHWC images.
    ///
    /// # Returns
    /// One row of `num_classes` probabilities per image.
    pub fn predict(&mut self, x: Array4<f32>) -> Result<Array2<f32>> {
        let y = self.model.forward(&self.params, x.into_dyn())?;

        if y.ncols() != self.graph.num_classes() {
            return Err(ExportErr::OutputWidth {
                got: y.ncols(),
                expected: self.graph.num_classes(),
            });
        }

        Ok(y)
    }
}
