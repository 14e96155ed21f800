//! Population-weighted spatial grid
//!
//! A [`SpatialIndex`] holds the static set of weighted points the antennae
//! compete to cover. It is built once, normalizes the weights to a unit
//! probability mass, and answers k-nearest-neighbour queries through the
//! k-d tree of `antennae-spatial`.

pub mod dataset;

use crate::error::{AntennaError, AntennaResult};
use antennae_spatial::{KdTree, KnnResult, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

pub use dataset::{DatasetRecord, GeoGrid};

/// Bounded rectangular domain `[0, x_max) × [0, y_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub x_max: f64,
    pub y_max: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self::unit()
    }
}

impl Domain {
    pub fn unit() -> Self {
        Self { x_max: 1.0, y_max: 1.0 }
    }

    pub fn new(x_max: f64, y_max: f64) -> AntennaResult<Self> {
        if !(x_max.is_finite() && y_max.is_finite() && x_max > 0.0 && y_max > 0.0) {
            return Err(AntennaError::Configuration(format!(
                "domain extent must be finite and positive, got ({}, {})",
                x_max, y_max
            )));
        }
        Ok(Self { x_max, y_max })
    }

    pub fn center(&self) -> Point {
        [self.x_max / 2.0, self.y_max / 2.0]
    }

    pub fn extent(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.x_max
        } else {
            self.y_max
        }
    }

    /// Closed-box membership, used to validate antenna coordinates.
    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.x_max).contains(&point[0]) && (0.0..=self.y_max).contains(&point[1])
    }

    /// Periodic boundary: map a coordinate into `[0, extent)`.
    pub fn wrap(&self, value: f64, axis: usize) -> f64 {
        let extent = self.extent(axis);
        let wrapped = value.rem_euclid(extent);
        // rem_euclid can round up to `extent` for tiny negative inputs
        if wrapped >= extent {
            0.0
        } else {
            wrapped
        }
    }
}

/// A populated location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedPoint {
    pub location: Point,
    pub weight: f64,
}

impl WeightedPoint {
    pub fn new(x: f64, y: f64, weight: f64) -> Self {
        Self { location: [x, y], weight }
    }
}

/// Static weighted point set with nearest-neighbour lookup.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: KdTree,
    weights: Vec<f64>,
    domain: Domain,
}

impl SpatialIndex {
    /// Build over the unit square.
    pub fn build(points: Vec<WeightedPoint>) -> AntennaResult<Self> {
        Self::build_in(points, Domain::unit())
    }

    /// Build over an explicit domain. Weights are renormalized to sum to 1.
    pub fn build_in(points: Vec<WeightedPoint>, domain: Domain) -> AntennaResult<Self> {
        if let Some(index) = points
            .iter()
            .position(|p| !p.weight.is_finite() || p.weight < 0.0)
        {
            return Err(AntennaError::Configuration(format!(
                "point {} has invalid weight {}",
                index, points[index].weight
            )));
        }
        if let Some(index) = points
            .iter()
            .position(|p| p.location.iter().all(|c| c.is_finite()) && !domain.contains(p.location))
        {
            let [x, y] = points[index].location;
            return Err(AntennaError::Configuration(format!(
                "point {} at ({}, {}) lies outside the domain [0, {}] x [0, {}]",
                index, x, y, domain.x_max, domain.y_max
            )));
        }
        let total: f64 = points.iter().map(|p| p.weight).sum();
        if !points.is_empty() && total <= 0.0 {
            return Err(AntennaError::Configuration(
                "total population weight must be positive".to_string(),
            ));
        }

        let weights: Vec<f64> = points.iter().map(|p| p.weight / total).collect();
        let tree = KdTree::build(points.iter().map(|p| p.location).collect())?;

        info!(points = tree.len(), x_max = domain.x_max, y_max = domain.y_max, "spatial index built");
        Ok(Self { tree, weights, domain })
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Normalized weights, index-aligned with [`SpatialIndex::points`].
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> &[Point] {
        self.tree.points()
    }

    /// The `k` nearest weighted points to `query`; equidistant points are
    /// ordered by ascending point index.
    pub fn query_k_nearest(&self, query: Point, k: usize) -> AntennaResult<KnnResult> {
        Ok(self.tree.query_k_nearest(query, k)?)
    }

    /// Sum of weights over the distinct points in `indices`, accumulated in
    /// index order so the result is reproducible.
    pub fn covered_weight<I>(&self, indices: I) -> f64
    where
        I: IntoIterator<Item = usize>,
    {
        let unique: BTreeSet<usize> = indices.into_iter().collect();
        unique.into_iter().map(|i| self.weights[i]).sum()
    }
}
