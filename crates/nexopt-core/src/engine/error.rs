use thiserror::Error;

use super::config::ConfigError;
use super::pipeline::StepError;
use crate::core::forest::ForestError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid study configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Alias '{name}' target '{target}' is invalid: {reason}")]
    AliasTarget {
        name: String,
        target: String,
        reason: String,
    },

    #[error("Path resolution failed for '{path}': {source}")]
    PathResolution {
        path: String,
        #[source]
        source: ForestError,
    },

    #[error("Pipeline step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },

    #[error("Non-finite value {value} computed for '{quantity}'")]
    NonFinite { quantity: String, value: f64 },

    #[error("Expected {expected} design variables, got {actual}")]
    VectorLength { expected: usize, actual: usize },
}
