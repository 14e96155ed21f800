//! Static 2-D k-d tree with exact k-nearest-neighbour queries
//!
//! The tree is stored implicitly: `order` is a permutation of point indices
//! where every sub-range `[lo, hi)` is a subtree whose root sits at the
//! midpoint, split on the axis recorded in `axes` for that slot.

use super::common::{squared_distance, KnnResult, Point, SpatialError, SpatialResult};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist2: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on (distance, index): the worst kept neighbour is on top
        self.dist2
            .partial_cmp(&other.dist2)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Immutable k-d tree over a fixed set of points.
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Point>,
    order: Vec<usize>,
    axes: Vec<u8>,
}

impl KdTree {
    /// Build a balanced tree by recursive median splits, alternating axes.
    pub fn build(points: Vec<Point>) -> SpatialResult<Self> {
        if points.is_empty() {
            return Err(SpatialError::EmptyPointSet);
        }
        if let Some(index) = points
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(SpatialError::NonFiniteCoordinate { index });
        }

        let mut order: Vec<usize> = (0..points.len()).collect();
        let mut axes = vec![0u8; points.len()];
        Self::partition(&points, &mut order, &mut axes, 0, points.len(), 0);

        debug!(points = points.len(), "built k-d tree");
        Ok(Self { points, order, axes })
    }

    fn partition(
        points: &[Point],
        order: &mut [usize],
        axes: &mut [u8],
        lo: usize,
        hi: usize,
        depth: usize,
    ) {
        if hi - lo <= 1 {
            if hi > lo {
                axes[lo] = (depth % 2) as u8;
            }
            return;
        }
        let axis = depth % 2;
        let mid = lo + (hi - lo) / 2;
        order[lo..hi].select_nth_unstable_by(mid - lo, |&a, &b| {
            points[a][axis]
                .partial_cmp(&points[b][axis])
                .unwrap_or(Ordering::Equal)
        });
        axes[mid] = axis as u8;
        Self::partition(points, order, axes, lo, mid, depth + 1);
        Self::partition(points, order, axes, mid + 1, hi, depth + 1);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Return the `k` points closest to `query` under Euclidean distance.
    ///
    /// Ties are resolved in favour of the lowest point index, so results are
    /// identical to [`KdTree::query_k_nearest_linear`].
    pub fn query_k_nearest(&self, query: Point, k: usize) -> SpatialResult<KnnResult> {
        self.check_query(&query, k)?;
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(&query, k, 0, self.order.len(), &mut heap);
        Ok(Self::finish(heap))
    }

    /// Linear-scan reference query with the same tie-breaking rule.
    pub fn query_k_nearest_linear(&self, query: Point, k: usize) -> SpatialResult<KnnResult> {
        self.check_query(&query, k)?;
        let mut heap = BinaryHeap::with_capacity(k + 1);
        for (index, point) in self.points.iter().enumerate() {
            Self::offer(
                &mut heap,
                k,
                Candidate {
                    dist2: squared_distance(&query, point),
                    index,
                },
            );
        }
        Ok(Self::finish(heap))
    }

    fn check_query(&self, query: &Point, k: usize) -> SpatialResult<()> {
        if !query[0].is_finite() || !query[1].is_finite() {
            return Err(SpatialError::NonFiniteQuery {
                x: query[0],
                y: query[1],
            });
        }
        if k == 0 || k > self.points.len() {
            return Err(SpatialError::InvalidK {
                k,
                len: self.points.len(),
            });
        }
        Ok(())
    }

    fn search(
        &self,
        query: &Point,
        k: usize,
        lo: usize,
        hi: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let index = self.order[mid];
        let point = &self.points[index];
        Self::offer(
            heap,
            k,
            Candidate {
                dist2: squared_distance(query, point),
                index,
            },
        );

        let axis = self.axes[mid] as usize;
        let diff = query[axis] - point[axis];
        let (near, far) = if diff < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(query, k, near.0, near.1, heap);

        // Non-strict bound: equidistant points on the far side may still win the tie-break
        let must_visit = match heap.peek() {
            Some(worst) if heap.len() >= k => diff * diff <= worst.dist2,
            _ => true,
        };
        if must_visit {
            self.search(query, k, far.0, far.1, heap);
        }
    }

    fn offer(heap: &mut BinaryHeap<Candidate>, k: usize, candidate: Candidate) {
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            if candidate < *worst {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    fn finish(heap: BinaryHeap<Candidate>) -> KnnResult {
        let sorted = heap.into_sorted_vec();
        KnnResult {
            distances: sorted.iter().map(|c| c.dist2.sqrt()).collect(),
            indices: sorted.iter().map(|c| c.index).collect(),
        }
    }
}
