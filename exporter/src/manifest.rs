use machine_learning::arch::{ActFnSpec, InputShape, LayerSpec, ModelGraph};
use serde::{Deserialize, Serialize};

use crate::{ExportErr, Result};

/// The value of the manifest's `format` field.
pub const FORMAT: &str = "asl-cnn";

/// The current version of the manifest.
pub const VERSION: u32 = 1;

/// The header metadata key holding the JSON encoded manifest.
pub const METADATA_KEY: &str = "asl.manifest";

/// A layer of the serialized network: its description and the shape it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub spec: LayerSpec,
    pub output_shape: Vec<usize>,
}

/// Everything needed to rebuild the network around the serialized tensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub format: String,
    pub version: u32,
    pub input_shape: InputShape,
    pub num_classes: usize,
    pub layers: Vec<LayerRecord>,
}

impl ModelManifest {
    /// Describes `graph`.
    ///
    /// # Returns
    /// The manifest, or `UnsupportedActivation` if some layer is activated by anything other than
    /// relu or softmax.
    pub fn from_graph(graph: &ModelGraph) -> Result<Self> {
        let mut layers = Vec::with_capacity(graph.layers().len());

        for (i, (spec, shape)) in graph.layers().iter().zip(graph.output_shapes()).enumerate() {
            match spec.act_fn() {
                None | Some(ActFnSpec::Relu | ActFnSpec::Softmax) => {}
                Some(act_fn) => {
                    return Err(ExportErr::UnsupportedActivation {
                        layer: i,
                        act_fn: act_fn.name(),
                    });
                }
            }

            layers.push(LayerRecord {
                spec: *spec,
                output_shape: shape.dims(),
            });
        }

        Ok(Self {
            format: FORMAT.into(),
            version: VERSION,
            input_shape: graph.input_shape(),
            num_classes: graph.num_classes(),
            layers,
        })
    }

    /// Rebuilds the graph this manifest describes, checking it is one this crate produces.
    pub fn to_graph(&self) -> Result<ModelGraph> {
        if self.format != FORMAT {
            return Err(ExportErr::Manifest(format!(
                "unknown format {:?}, expected {FORMAT:?}",
                self.format
            )));
        }

        if self.version != VERSION {
            return Err(ExportErr::Manifest(format!(
                "unsupported version {}, expected {VERSION}",
                self.version
            )));
        }

        let width = self
            .layers
            .last()
            .and_then(|layer| layer.output_shape.last().copied())
            .unwrap_or_default();

        if self.layers.last().map(|l| l.output_shape.len()) != Some(1) || width != self.num_classes
        {
            return Err(ExportErr::OutputWidth {
                got: width,
                expected: self.num_classes,
            });
        }

        let graph = ModelGraph::new(
            self.input_shape,
            self.num_classes,
            self.layers.iter().map(|layer| layer.spec),
        )?;

        for (i, (record, shape)) in self.layers.iter().zip(graph.output_shapes()).enumerate() {
            if record.output_shape != shape.dims() {
                return Err(ExportErr::Manifest(format!(
                    "layer {i} declares output {:?} but produces {:?}",
                    record.output_shape,
                    shape.dims()
                )));
            }
        }

        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use machine_learning::arch::{ArchitectureBuilder, TensorShape};

    use super::*;

    fn graph() -> ModelGraph {
        ArchitectureBuilder::new()
            .build(InputShape::new(28, 28, 1), 26)
            .unwrap()
    }

    #[test]
    fn describes_every_layer() {
        let manifest = ModelManifest::from_graph(&graph()).unwrap();

        assert_eq!(manifest.format, FORMAT);
        assert_eq!(manifest.version, VERSION);
        assert_eq!(manifest.layers.len(), 8);
        assert_eq!(manifest.layers[4].output_shape, [5, 5, 64]);
        assert_eq!(manifest.layers[7].output_shape, [26]);
        assert_eq!(manifest.to_graph().unwrap(), graph());
    }

    #[test]
    fn json_round_trip_preserves_the_graph() {
        let manifest = ModelManifest::from_graph(&graph()).unwrap();
        let parsed = ModelManifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn sigmoid_cannot_be_exported() {
        let shape = InputShape::new(2, 2, 1);
        let graph = ModelGraph::new(
            shape,
            2,
            [
                LayerSpec::Input { shape },
                LayerSpec::Flatten,
                LayerSpec::Dense {
                    units: 2,
                    act_fn: ActFnSpec::Sigmoid { amp: 1.0 },
                },
            ],
        )
        .unwrap();

        let err = ModelManifest::from_graph(&graph).unwrap_err();
        assert!(matches!(
            err,
            ExportErr::UnsupportedActivation {
                layer: 2,
                act_fn: "sigmoid"
            }
        ));
    }

    #[test]
    fn unknown_format_or_version() {
        let mut manifest = ModelManifest::from_graph(&graph()).unwrap();
        manifest.version = 2;
        assert!(matches!(manifest.to_graph(), Err(ExportErr::Manifest(_))));

        manifest.version = VERSION;
        manifest.format = "tflite".into();
        assert!(matches!(manifest.to_graph(), Err(ExportErr::Manifest(_))));
    }

    #[test]
    fn output_width_must_match_the_classes() {
        let mut manifest = ModelManifest::from_graph(&graph()).unwrap();
        manifest.num_classes = 25;

        let err = manifest.to_graph().unwrap_err();
        assert!(matches!(
            err,
            ExportErr::OutputWidth {
                got: 26,
                expected: 25
            }
        ));
    }

    #[test]
    fn tampered_output_shapes_are_rejected() {
        let mut manifest = ModelManifest::from_graph(&graph()).unwrap();
        manifest.layers[2].output_shape = TensorShape::Flat { len: 3 }.dims();
        assert!(matches!(manifest.to_graph(), Err(ExportErr::Manifest(_))));
    }
}
