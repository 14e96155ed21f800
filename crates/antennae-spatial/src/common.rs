//! Shared types for spatial queries

use thiserror::Error;

/// A location in the plane, `[x, y]`
pub type Point = [f64; 2];

/// Errors raised while building or querying a spatial index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    #[error("cannot build a spatial index over an empty point set")]
    EmptyPointSet,

    #[error("point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    #[error("query point has a non-finite coordinate: ({x}, {y})")]
    NonFiniteQuery { x: f64, y: f64 },

    #[error("k must be in 1..={len}, got {k}")]
    InvalidK { k: usize, len: usize },
}

pub type SpatialResult<T> = Result<T, SpatialError>;

/// Result of a k-nearest-neighbour query.
///
/// Both vectors are sorted by ascending distance; equidistant points are
/// ordered by ascending point index.
#[derive(Debug, Clone, PartialEq)]
pub struct KnnResult {
    pub distances: Vec<f64>,
    pub indices: Vec<usize>,
}

impl KnnResult {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[inline]
pub(crate) fn squared_distance(a: &Point, b: &Point) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
