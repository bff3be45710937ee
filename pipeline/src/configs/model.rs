use machine_learning::arch::{ArchitectureBuilder, InputShape};
use serde::{Deserialize, Serialize};

/// The topology of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub input_shape: InputShape,
    pub num_classes: usize,
    pub conv_filters: [usize; 2],
    pub kernel: (usize, usize),
    pub pool: (usize, usize),
    pub hidden_units: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_shape: InputShape::new(28, 28, 1),
            num_classes: 26,
            conv_filters: [32, 64],
            kernel: (3, 3),
            pool: (2, 2),
            hidden_units: 128,
        }
    }
}

impl ModelConfig {
    pub fn builder(&self) -> ArchitectureBuilder {
        ArchitectureBuilder::new()
            .with_conv_filters(self.conv_filters)
            .with_kernel(self.kernel)
            .with_pool(self.pool)
            .with_hidden_units(self.hidden_units)
    }
}
