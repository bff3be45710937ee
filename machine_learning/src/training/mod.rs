mod initialized;
mod initializer;
mod sample;

pub use initialized::{InitializedGraph, NamedTensor, tensor_name};
pub use initializer::GraphInitializer;
pub use sample::TrainingSample;
