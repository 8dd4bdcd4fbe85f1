//! Voxel-clearing spatial index

use meshpress_core::{Point3f, Result};

use crate::spatial::SpatialIndex;
use crate::voxel_grid::VoxelGridIndex;

/// Hash-grid backend whose cells can be evicted wholesale.
///
/// Behaves exactly like [`VoxelGridIndex`] for insertion and lookup, and
/// additionally supports clearing a set of cells so that pruners evicting
/// whole regions (archived mesh blocks, for instance) can reopen them for
/// future vertices.
#[derive(Debug, Clone)]
pub struct VoxelClearingIndex {
    grid: VoxelGridIndex,
}

impl VoxelClearingIndex {
    /// Remove the given cells from the index.
    ///
    /// Queries in a cleared cell miss until a later insertion repopulates
    /// the cell.
    pub fn clear_cells(&mut self, cells: &[(i64, i64, i64)]) {
        for cell in cells {
            self.grid.cells.remove(cell);
        }
    }

    /// Cell resolution of the index
    pub fn resolution(&self) -> f64 {
        self.grid.resolution
    }
}

impl SpatialIndex for VoxelClearingIndex {
    fn with_resolution(resolution: f64) -> Self {
        Self {
            grid: VoxelGridIndex::with_resolution(resolution),
        }
    }

    fn reset(&mut self, points: &[Point3f]) {
        self.grid.reset(points);
    }

    fn insert(&mut self, point: &Point3f) -> Result<()> {
        self.grid.insert(point)
    }

    fn nearest_within_cell(&self, point: &Point3f) -> Option<usize> {
        self.grid.nearest_within_cell(point)
    }
}
