pub mod common;
pub mod kdtree;

pub use common::{KnnResult, Point, SpatialError, SpatialResult};
pub use kdtree::KdTree;
