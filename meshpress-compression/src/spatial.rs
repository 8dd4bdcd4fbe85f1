//! Spatial index abstraction used by the compressor

use meshpress_core::{Point3f, Result};

/// Nearest-vertex lookup over the active vertex set at a fixed resolution.
///
/// Implementations partition space into axis-aligned cubes of side
/// `resolution` ("cells"). Indexed points are identified by *slots*: indices
/// into the caller's active-vertex sequence, assigned in insertion order
/// starting from zero (and from zero again after [`reset`](Self::reset)).
///
/// Two points mapped to the same cell must be reported as matches of each
/// other; points in different cells may be reported as non-matches. When a
/// cell holds several points the reported slot is backend-chosen but stable
/// within a call.
///
/// The resolution must be positive and finite.
pub trait SpatialIndex {
    /// Create an empty index at the given cell resolution.
    fn with_resolution(resolution: f64) -> Self
    where
        Self: Sized;

    /// Drop all indexed points and re-index the given points in order.
    fn reset(&mut self, points: &[Point3f]);

    /// Index a point under the next slot.
    ///
    /// Fails without mutating the index if the point cannot be indexed
    /// (non-finite coordinates).
    fn insert(&mut self, point: &Point3f) -> Result<()>;

    /// Slot of some indexed point sharing the query's resolution cell.
    fn nearest_within_cell(&self, point: &Point3f) -> Option<usize>;
}

pub(crate) fn point_is_finite(point: &Point3f) -> bool {
    point.x.is_finite() && point.y.is_finite() && point.z.is_finite()
}
