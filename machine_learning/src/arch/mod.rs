pub mod activations;
mod builder;
mod graph;
pub mod layers;
pub mod loss;
mod model;
mod sequential;
mod shape;
mod spec;

pub use builder::ArchitectureBuilder;
pub use graph::ModelGraph;
pub use model::Model;
pub use sequential::Sequential;
pub use shape::{InputShape, TensorShape};
pub use spec::{ActFnSpec, LayerSpec};
