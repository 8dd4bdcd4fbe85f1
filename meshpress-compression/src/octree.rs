//! Dynamic octree spatial index

use meshpress_core::{Error, Point3d, Point3f, Result};

use crate::spatial::{point_is_finite, SpatialIndex};

/// Dynamic octree over the active vertices.
///
/// The root cube is aligned to the resolution grid and doubles toward
/// out-of-bounds insertions, so the leaves are exactly the resolution cells
/// used by the hash-grid backends. An approximate nearest query is answered
/// by an occupant of the query's leaf cell; queries outside the current
/// bounding box miss, since approximate search is undefined there.
#[derive(Debug, Clone)]
pub struct OctreeIndex {
    resolution: f64,
    root: Option<OctreeNode>,
    len: usize,
}

#[derive(Debug, Clone)]
struct OctreeNode {
    min: Point3d,
    size: f64,
    children: Option<Box<[OctreeNode; 8]>>,
    /// Occupied only at resolution-sized leaves.
    slots: Vec<usize>,
}

impl OctreeNode {
    fn new(min: Point3d, size: f64) -> Self {
        OctreeNode {
            min,
            size,
            children: None,
            slots: Vec::new(),
        }
    }

    /// Cells are half-open so neighbouring nodes stay disjoint.
    fn contains(&self, p: &Point3d) -> bool {
        p.x >= self.min.x
            && p.x < self.min.x + self.size
            && p.y >= self.min.y
            && p.y < self.min.y + self.size
            && p.z >= self.min.z
            && p.z < self.min.z + self.size
    }

    fn octant(&self, p: &Point3d) -> usize {
        let half = self.size * 0.5;
        ((p.x >= self.min.x + half) as usize)
            + (((p.y >= self.min.y + half) as usize) << 1)
            + (((p.z >= self.min.z + half) as usize) << 2)
    }

    /// Node sizes are `resolution * 2^k`, so the only size below
    /// `1.5 * resolution` is the leaf size itself.
    fn is_leaf_cell(&self, resolution: f64) -> bool {
        self.size < resolution * 1.5
    }

    fn subdivide(&mut self) {
        let half = self.size * 0.5;
        let mn = self.min;
        let children = [
            OctreeNode::new(Point3d::new(mn.x, mn.y, mn.z), half),
            OctreeNode::new(Point3d::new(mn.x + half, mn.y, mn.z), half),
            OctreeNode::new(Point3d::new(mn.x, mn.y + half, mn.z), half),
            OctreeNode::new(Point3d::new(mn.x + half, mn.y + half, mn.z), half),
            OctreeNode::new(Point3d::new(mn.x, mn.y, mn.z + half), half),
            OctreeNode::new(Point3d::new(mn.x + half, mn.y, mn.z + half), half),
            OctreeNode::new(Point3d::new(mn.x, mn.y + half, mn.z + half), half),
            OctreeNode::new(Point3d::new(mn.x + half, mn.y + half, mn.z + half), half),
        ];
        self.children = Some(Box::new(children));
    }

    fn insert(&mut self, p: &Point3d, slot: usize, resolution: f64) {
        if self.is_leaf_cell(resolution) {
            self.slots.push(slot);
            return;
        }
        if self.children.is_none() {
            self.subdivide();
        }
        let octant = self.octant(p);
        if let Some(ref mut children) = self.children {
            children[octant].insert(p, slot, resolution);
        }
    }

    fn find(&self, p: &Point3d, resolution: f64) -> Option<usize> {
        if self.is_leaf_cell(resolution) {
            return self.slots.first().copied();
        }
        let children = self.children.as_ref()?;
        children[self.octant(p)].find(p, resolution)
    }
}

/// Wrap the old root in a parent of twice the size, extended toward `p`.
fn grow_toward(root: OctreeNode, p: &Point3d) -> OctreeNode {
    let size = root.size;
    let min = Point3d::new(
        if p.x < root.min.x { root.min.x - size } else { root.min.x },
        if p.y < root.min.y { root.min.y - size } else { root.min.y },
        if p.z < root.min.z { root.min.z - size } else { root.min.z },
    );
    let mut parent = OctreeNode::new(min, size * 2.0);
    parent.subdivide();
    let center = Point3d::new(
        root.min.x + size * 0.5,
        root.min.y + size * 0.5,
        root.min.z + size * 0.5,
    );
    let octant = parent.octant(&center);
    if let Some(ref mut children) = parent.children {
        children[octant] = root;
    }
    parent
}

impl OctreeIndex {
    /// Bounding box of the current root cube, if any points are indexed.
    pub fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        self.root.as_ref().map(|root| {
            (
                Point3f::new(root.min.x as f32, root.min.y as f32, root.min.z as f32),
                Point3f::new(
                    (root.min.x + root.size) as f32,
                    (root.min.y + root.size) as f32,
                    (root.min.z + root.size) as f32,
                ),
            )
        })
    }

    /// Cell resolution of the index
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    fn to_f64(point: &Point3f) -> Point3d {
        Point3d::new(point.x as f64, point.y as f64, point.z as f64)
    }
}

impl SpatialIndex for OctreeIndex {
    fn with_resolution(resolution: f64) -> Self {
        debug_assert!(resolution.is_finite() && resolution > 0.0);
        Self {
            resolution,
            root: None,
            len: 0,
        }
    }

    fn reset(&mut self, points: &[Point3f]) {
        self.root = None;
        self.len = 0;
        for point in points {
            if let Err(e) = self.insert(point) {
                log::error!("octree reset skipped a point: {}", e);
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
        let p = Self::to_f64(point);
        let slot = self.len;
        match self.root.take() {
            None => {
                // Seed the tree with the resolution cell containing the point.
                let min = Point3d::new(
                    (p.x / self.resolution).floor() * self.resolution,
                    (p.y / self.resolution).floor() * self.resolution,
                    (p.z / self.resolution).floor() * self.resolution,
                );
                let mut root = OctreeNode::new(min, self.resolution);
                root.insert(&p, slot, self.resolution);
                self.root = Some(root);
            }
            Some(mut root) => {
                while !root.contains(&p) {
                    root = grow_toward(root, &p);
                }
                root.insert(&p, slot, self.resolution);
                self.root = Some(root);
            }
        }
        self.len += 1;
        Ok(())
    }

    fn nearest_within_cell(&self, point: &Point3f) -> Option<usize> {
        if !point_is_finite(point) {
            return None;
        }
        let p = Self::to_f64(point);
        let root = self.root.as_ref()?;
        if !root.contains(&p) {
            return None;
        }
        root.find(&p, self.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree_misses() {
        let tree = OctreeIndex::with_resolution(0.5);
        assert_eq!(tree.nearest_within_cell(&Point3f::new(0.0, 0.0, 0.0)), None);
        assert!(tree.bounding_box().is_none());
    }

    #[test]
    fn test_same_cell_matches() {
        let mut tree = OctreeIndex::with_resolution(0.5);
        tree.insert(&Point3f::new(0.1, 0.1, 0.1)).unwrap();
        assert_eq!(tree.nearest_within_cell(&Point3f::new(0.4, 0.3, 0.2)), Some(0));
    }

    #[test]
    fn test_out_of_box_query_misses() {
        let mut tree = OctreeIndex::with_resolution(0.5);
        tree.insert(&Point3f::new(0.1, 0.1, 0.1)).unwrap();
        assert_eq!(tree.nearest_within_cell(&Point3f::new(10.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_grows_toward_far_insertions() {
        let mut tree = OctreeIndex::with_resolution(0.5);
        tree.insert(&Point3f::new(0.1, 0.1, 0.1)).unwrap();
        tree.insert(&Point3f::new(7.3, -2.2, 3.9)).unwrap();
        tree.insert(&Point3f::new(-4.6, 5.0, -1.1)).unwrap();

        assert_eq!(tree.nearest_within_cell(&Point3f::new(0.2, 0.2, 0.2)), Some(0));
        assert_eq!(tree.nearest_within_cell(&Point3f::new(7.4, -2.1, 3.8)), Some(1));
        assert_eq!(tree.nearest_within_cell(&Point3f::new(-4.7, 5.2, -1.3)), Some(2));

        let (min, max) = tree.bounding_box().unwrap();
        assert!(min.x <= -4.6 && min.y <= -2.2 && min.z <= -1.1);
        assert!(max.x >= 7.3 && max.y >= 5.0 && max.z >= 3.9);
    }

    #[test]
    fn test_distinct_cells_do_not_match() {
        let mut tree = OctreeIndex::with_resolution(0.5);
        tree.insert(&Point3f::new(0.1, 0.1, 0.1)).unwrap();
        tree.insert(&Point3f::new(0.6, 0.1, 0.1)).unwrap();
        assert_eq!(tree.nearest_within_cell(&Point3f::new(0.7, 0.2, 0.2)), Some(1));
        assert_eq!(tree.nearest_within_cell(&Point3f::new(0.2, 0.2, 0.2)), Some(0));
    }

    #[test]
    fn test_reset_rebuilds_from_points() {
        let mut tree = OctreeIndex::with_resolution(0.5);
        tree.insert(&Point3f::new(0.1, 0.1, 0.1)).unwrap();
        tree.insert(&Point3f::new(2.1, 0.1, 0.1)).unwrap();

        tree.reset(&[Point3f::new(2.1, 0.1, 0.1)]);
        assert_eq!(tree.nearest_within_cell(&Point3f::new(2.2, 0.2, 0.2)), Some(0));
        assert_eq!(tree.nearest_within_cell(&Point3f::new(0.1, 0.1, 0.1)), None);

        tree.reset(&[]);
        assert!(tree.bounding_box().is_none());
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut tree = OctreeIndex::with_resolution(0.5);
        assert!(tree.insert(&Point3f::new(0.0, f32::INFINITY, 0.0)).is_err());
        assert!(tree.bounding_box().is_none());
    }
}
