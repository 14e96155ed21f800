//! Error taxonomy for the placement engine

use antennae_spatial::SpatialError;
use thiserror::Error;

/// Errors that can occur while configuring or running an optimization
#[derive(Error, Debug)]
pub enum AntennaError {
    /// Bad or missing spatial data, or invalid sizes, detected before any generation runs
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Bad per-call parameter (neighbour count, out-of-domain coordinate, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Every individual scored zero coverage during selection
    #[error("Degenerate fitness: all {population} individuals have zero coverage in generation {generation}")]
    DegenerateFitness { generation: usize, population: usize },

    /// History queried for a generation that has not completed yet
    #[error("Generation {generation} out of range: {completed} generation(s) recorded")]
    IndexOutOfRange { generation: usize, completed: usize },

    #[error("Dataset error at line {line}: {message}")]
    Dataset { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AntennaResult<T> = Result<T, AntennaError>;

impl From<SpatialError> for AntennaError {
    fn from(err: SpatialError) -> Self {
        match err {
            SpatialError::EmptyPointSet | SpatialError::NonFiniteCoordinate { .. } => {
                AntennaError::Configuration(err.to_string())
            }
            SpatialError::NonFiniteQuery { .. } | SpatialError::InvalidK { .. } => {
                AntennaError::InvalidArgument(err.to_string())
            }
        }
    }
}
