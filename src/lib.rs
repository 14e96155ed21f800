//! Antenna placement by genetic search
//!
//! Places a fixed number of antennae over a population-weighted grid so that
//! the population reached by the antennae's nearest neighbours is as large
//! as possible.
//!
//! - [`grid`]: weighted points, dataset loading, the nearest-neighbour index
//! - [`coverage`]: fitness of a layout as covered population mass
//! - [`engine`]: selection, crossover and mutation over generations
//! - [`history`]: per-generation statistics and population snapshots
//!
//! ## Example Usage
//!
//! ```rust
//! use antennae::{GaConfig, GeneticEngine, SpatialIndex, WeightedPoint};
//! use std::sync::Arc;
//!
//! let index = SpatialIndex::build(vec![
//!     WeightedPoint::new(0.2, 0.3, 10.0),
//!     WeightedPoint::new(0.8, 0.7, 30.0),
//!     WeightedPoint::new(0.5, 0.9, 5.0),
//! ])
//! .unwrap();
//!
//! let config = GaConfig {
//!     population_size: 8,
//!     n_antennae: 2,
//!     k_neighbors: 1,
//!     n_generations: 10,
//!     ..GaConfig::default()
//! };
//!
//! let mut engine = GeneticEngine::with_seed(config, Arc::new(index), 42).unwrap();
//! let history = engine.run().unwrap();
//! assert_eq!(history.len(), 10);
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod grid;
pub mod history;
pub mod report;

pub use config::GaConfig;
pub use coverage::CoverageEvaluator;
pub use engine::{EngineState, GeneticEngine, Phase};
pub use error::{AntennaError, AntennaResult};
pub use grid::{Domain, GeoGrid, SpatialIndex, WeightedPoint};
pub use history::{GenerationRecord, RunHistory};
pub use report::{LayoutReport, RunSummary};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
