use serde::{Deserialize, Serialize};

/// The serializable description of an `Optimizer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam {
        learning_rate: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: f32,
    },
    GradientDescentWithMomentum {
        learning_rate: f32,
        momentum: f32,
    },
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self::Adam {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

impl OptimizerSpec {
    /// Returns the name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerSpec::Adam { .. } => "adam",
            OptimizerSpec::GradientDescent { .. } => "gradient_descent",
            OptimizerSpec::GradientDescentWithMomentum { .. } => "gradient_descent_with_momentum",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_adam() {
        let spec: OptimizerSpec = serde_json::from_str(
            r#"{"adam":{"learning_rate":0.001,"beta1":0.9,"beta2":0.999,"epsilon":1e-7}}"#,
        )
        .unwrap();
        assert_eq!(spec, OptimizerSpec::default());
    }

    #[test]
    fn parses_gradient_descent() {
        let spec: OptimizerSpec =
            serde_json::from_str(r#"{"gradient_descent":{"learning_rate":0.5}}"#).unwrap();
        assert_eq!(spec, OptimizerSpec::GradientDescent { learning_rate: 0.5 });
        assert_eq!(spec.name(), "gradient_descent");
    }
}
