//! Hash-grid spatial index

use std::collections::HashMap;

use meshpress_core::{Error, Point3f, Result};

use crate::spatial::{point_is_finite, SpatialIndex};

/// Key of the resolution cell containing a point
pub fn cell_key(point: &Point3f, resolution: f64) -> (i64, i64, i64) {
    (
        (point.x as f64 / resolution).floor() as i64,
        (point.y as f64 / resolution).floor() as i64,
        (point.z as f64 / resolution).floor() as i64,
    )
}

/// Voxel-grid backend: one representative slot per occupied cell.
///
/// Later insertions into an occupied cell leave the cell's representative
/// unchanged.
#[derive(Debug, Clone)]
pub struct VoxelGridIndex {
    pub(crate) resolution: f64,
    pub(crate) cells: HashMap<(i64, i64, i64), usize>,
    pub(crate) len: usize,
}

impl SpatialIndex for VoxelGridIndex {
    fn with_resolution(resolution: f64) -> Self {
        debug_assert!(resolution.is_finite() && resolution > 0.0);
        Self {
            resolution,
            cells: HashMap::new(),
            len: 0,
        }
    }

    fn reset(&mut self, points: &[Point3f]) {
        self.cells.clear();
        self.len = 0;
        for point in points {
            if let Err(e) = self.insert(point) {
                log::error!("voxel grid reset skipped a point: {}", e);
            }
        }
    }

    fn insert(&mut self, point: &Point3f) -> Result<()> {
        if !point_is_finite(point) {
            return Err(Error::SpatialIndex(format!(
                "cannot index non-finite point {:?}",
                point
            )));
        }
        let slot = self.len;
        self.cells
            .entry(cell_key(point, self.resolution))
            .or_insert(slot);
        self.len += 1;
        Ok(())
    }

    fn nearest_within_cell(&self, point: &Point3f) -> Option<usize> {
        if !point_is_finite(point) {
            return None;
        }
        self.cells.get(&cell_key(point, self.resolution)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_cell_matches() {
        let mut grid = VoxelGridIndex::with_resolution(0.5);
        grid.insert(&Point3f::new(0.1, 0.1, 0.1)).unwrap();
        assert_eq!(grid.nearest_within_cell(&Point3f::new(0.4, 0.2, 0.3)), Some(0));
        assert_eq!(grid.nearest_within_cell(&Point3f::new(0.6, 0.2, 0.3)), None);
    }

    #[test]
    fn test_negative_coordinates_use_floor() {
        let mut grid = VoxelGridIndex::with_resolution(1.0);
        grid.insert(&Point3f::new(-0.5, -0.5, -0.5)).unwrap();
        // (-0.5, ..) and (-0.9, ..) are both in cell (-1, -1, -1)
        assert_eq!(
            grid.nearest_within_cell(&Point3f::new(-0.9, -0.1, -0.99)),
            Some(0)
        );
        assert_eq!(grid.nearest_within_cell(&Point3f::new(0.1, -0.1, -0.9)), None);
    }

    #[test]
    fn test_first_occupant_wins() {
        let mut grid = VoxelGridIndex::with_resolution(1.0);
        grid.insert(&Point3f::new(0.2, 0.2, 0.2)).unwrap();
        grid.insert(&Point3f::new(0.8, 0.8, 0.8)).unwrap();
        assert_eq!(grid.nearest_within_cell(&Point3f::new(0.5, 0.5, 0.5)), Some(0));
    }

    #[test]
    fn test_reset_renumbers_slots() {
        let mut grid = VoxelGridIndex::with_resolution(1.0);
        grid.insert(&Point3f::new(0.5, 0.5, 0.5)).unwrap();
        grid.insert(&Point3f::new(5.5, 0.5, 0.5)).unwrap();
        grid.reset(&[Point3f::new(5.5, 0.5, 0.5)]);
        assert_eq!(grid.nearest_within_cell(&Point3f::new(5.1, 0.1, 0.1)), Some(0));
        assert_eq!(grid.nearest_within_cell(&Point3f::new(0.5, 0.5, 0.5)), None);
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut grid = VoxelGridIndex::with_resolution(1.0);
        assert!(grid.insert(&Point3f::new(f32::NAN, 0.0, 0.0)).is_err());
        assert_eq!(grid.nearest_within_cell(&Point3f::new(f32::NAN, 0.0, 0.0)), None);
    }
}
