//! Coverage fitness
//!
//! The fitness of a layout is the population mass reached by the union of
//! the `k_neighbors` nearest weighted points of each of its antennae. A
//! point reached by several antennae counts once.

use crate::error::{AntennaError, AntennaResult};
use crate::grid::SpatialIndex;
use ndarray::{Array1, ArrayView2, ArrayView3};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Scores antenna layouts against a [`SpatialIndex`].
#[derive(Debug, Clone, Copy)]
pub struct CoverageEvaluator {
    k_neighbors: usize,
    parallel: bool,
}

impl CoverageEvaluator {
    pub fn new(k_neighbors: usize) -> AntennaResult<Self> {
        if k_neighbors == 0 {
            return Err(AntennaError::InvalidArgument(
                "k_neighbors must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            k_neighbors,
            parallel: false,
        })
    }

    /// Score individuals on the rayon pool. Results are identical to the
    /// sequential path.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    /// Fitness of one layout of shape `(n_antennae, 2)`.
    pub fn layout_fitness(&self, layout: ArrayView2<f64>, index: &SpatialIndex) -> AntennaResult<f64> {
        let domain = index.domain();
        let mut covered = BTreeSet::new();
        for antenna in layout.outer_iter() {
            let location = [antenna[0], antenna[1]];
            if !domain.contains(location) {
                return Err(AntennaError::InvalidArgument(format!(
                    "antenna at ({}, {}) lies outside the domain [0, {}] x [0, {}]",
                    location[0], location[1], domain.x_max, domain.y_max
                )));
            }
            let neighbours = index.query_k_nearest(location, self.k_neighbors)?;
            covered.extend(neighbours.indices);
        }
        Ok(index.covered_weight(covered))
    }

    /// FitnessVector for a population of shape `(P, n_antennae, 2)`,
    /// index-aligned with the first axis.
    pub fn evaluate(&self, layouts: ArrayView3<f64>, index: &SpatialIndex) -> AntennaResult<Array1<f64>> {
        let scores: Vec<f64> = if self.parallel {
            layouts
                .outer_iter()
                .into_par_iter()
                .map(|layout| self.layout_fitness(layout, index))
                .collect::<AntennaResult<Vec<f64>>>()?
        } else {
            layouts
                .outer_iter()
                .map(|layout| self.layout_fitness(layout, index))
                .collect::<AntennaResult<Vec<f64>>>()?
        };
        Ok(Array1::from(scores))
    }
}
