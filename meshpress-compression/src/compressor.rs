//! Incremental mesh compression and integration
//!
//! A volumetric mesher re-emits overlapping partial meshes as the mapped
//! region grows. [`MeshCompressor`] ingests those fragments one call at a
//! time, snaps incoming vertices onto previously seen vertices at a fixed
//! metric resolution, and accumulates a single deduplicated global mesh.
//! Each call reports exactly which vertices and triangles it contributed,
//! plus a remapping from the caller's vertex indices to canonical ids, so a
//! deformation graph can be kept in lock-step with the mesh.

use std::collections::{HashMap, HashSet};

use meshpress_core::{
    BlockIndex, BlockedMesh, ColoredPoint3f, ColoredTriangleMesh, Error, Point3f, Result,
};

use crate::block_adapter::expand_blocked_mesh;
use crate::octree::OctreeIndex;
use crate::spatial::SpatialIndex;
use crate::voxel_clearing::VoxelClearingIndex;
use crate::voxel_grid::VoxelGridIndex;

// ============================================================
// Results
// ============================================================

/// Output of one generic integration call.
#[derive(Debug, Clone, Default)]
pub struct IntegrationResult {
    /// Vertices promoted by this call, in promotion order.
    pub new_vertices: Vec<ColoredPoint3f>,
    /// Triangles accepted by this call, as canonical-id triples.
    pub new_triangles: Vec<[usize; 3]>,
    /// Canonical ids newly assigned or re-activated by this call.
    pub new_indices: Vec<usize>,
    /// Input vertex index to canonical id.
    pub remapping: HashMap<usize, usize>,
}

/// Remapping from `(block index, within-block position)` to canonical id.
pub type BlockIndexMapping = HashMap<BlockIndex, HashMap<usize, usize>>;

/// Output of one block-indexed integration call.
#[derive(Debug, Clone, Default)]
pub struct BlockIntegrationResult {
    /// Vertices promoted by this call, in promotion order.
    pub new_vertices: Vec<ColoredPoint3f>,
    /// Triangles accepted by this call, as canonical-id triples.
    pub new_triangles: Vec<[usize; 3]>,
    /// Canonical ids newly assigned or re-activated by this call.
    pub new_indices: Vec<usize>,
    /// Per-block remapping to canonical ids. Every well-formed block of the
    /// input has an entry, possibly empty.
    pub remapping: BlockIndexMapping,
}

// ============================================================
// Per-call bookkeeping
// ============================================================

/// Where an input vertex resolved during the classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reindex {
    /// Snapped to an already-promoted vertex.
    Canonical(usize),
    /// Collapsed onto a not-yet-promoted candidate of this call.
    Tentative(usize),
}

/// A candidate new vertex awaiting face support.
#[derive(Debug)]
struct Candidate {
    /// Input index that first produced this candidate.
    input_idx: usize,
    /// Colored point of the first observation; its color wins on promotion.
    point: ColoredPoint3f,
    /// Input indices that collapsed onto this candidate later in the call.
    converged: Vec<usize>,
    /// Set once some non-degenerate remapped face references the candidate.
    face_supported: bool,
}

fn remap_face(face: &[usize; 3], temp_reindex: &[Option<Reindex>]) -> Option<[Reindex; 3]> {
    let a = temp_reindex.get(face[0]).copied().flatten()?;
    let b = temp_reindex.get(face[1]).copied().flatten()?;
    let c = temp_reindex.get(face[2]).copied().flatten()?;
    Some([a, b, c])
}

// ============================================================
// Compressor
// ============================================================

/// Streaming mesh compressor.
///
/// State grows monotonically: vertices, once promoted to a canonical id,
/// are never removed, re-indexed, or rewritten, and accepted triangles are
/// never removed or reordered. Only the *active* subset of vertices, the
/// ones still eligible to absorb future input, shrinks, through
/// [`prune_stored_mesh`](Self::prune_stored_mesh).
///
/// The spatial backend used for nearest-vertex queries is chosen at
/// construction through the type parameter; see [`OctreeCompressor`],
/// [`VoxelGridCompressor`] and [`VoxelClearingCompressor`].
///
/// A compressor is single-writer; callers ingesting from several producers
/// must serialize calls externally.
#[derive(Debug)]
pub struct MeshCompressor<I: SpatialIndex = OctreeIndex> {
    resolution: f64,
    /// Every vertex ever promoted, indexed by canonical id. Append-only.
    all_vertices: Vec<ColoredPoint3f>,
    /// Every triangle ever accepted, as canonical-id triples. Append-only.
    polygons: Vec<[usize; 3]>,
    /// Canonical id to ids of the triangles referencing it. Entries are kept
    /// for pruned vertices, whose triangles still reference them.
    adjacent_polygons: Vec<Vec<usize>>,
    /// Geometry of the active slots, parallel to `active_indices` and
    /// `timestamps`; the spatial index refers into this sequence.
    active_vertices: Vec<Point3f>,
    /// Canonical id of each active slot.
    active_indices: Vec<usize>,
    /// Last-seen time of each active slot, in seconds.
    timestamps: Vec<f64>,
    index: I,
}

/// Compressor backed by the dynamic octree.
pub type OctreeCompressor = MeshCompressor<OctreeIndex>;

/// Compressor backed by the hash-grid index.
pub type VoxelGridCompressor = MeshCompressor<VoxelGridIndex>;

/// Compressor backed by the clearable hash-grid index.
pub type VoxelClearingCompressor = MeshCompressor<VoxelClearingIndex>;

impl<I: SpatialIndex> MeshCompressor<I> {
    /// Create a compressor deduplicating at the given metric resolution.
    pub fn new(resolution: f64) -> Result<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(Error::InvalidData(format!(
                "resolution must be positive, got {}",
                resolution
            )));
        }
        Ok(Self {
            resolution,
            all_vertices: Vec::new(),
            polygons: Vec::new(),
            adjacent_polygons: Vec::new(),
            active_vertices: Vec::new(),
            active_indices: Vec::new(),
            timestamps: Vec::new(),
            index: I::with_resolution(resolution),
        })
    }

    /// Integrate a fragment given as vertex and face lists.
    ///
    /// Runs the two-pass dedup: every input vertex is first resolved against
    /// the active vertices and then against the candidates already seen in
    /// this call; a candidate is promoted to a canonical vertex only if some
    /// face that stays non-degenerate after remapping references it.
    /// Fragments with fewer than three vertices or no faces are a no-op.
    pub fn compress_and_integrate(
        &mut self,
        input_vertices: &[ColoredPoint3f],
        input_faces: &[[usize; 3]],
        stamp_in_sec: f64,
    ) -> IntegrationResult {
        self.check_bookkeeping();
        let result = self.integrate(input_vertices, input_faces, stamp_in_sec);
        self.check_bookkeeping();
        result
    }

    /// Integrate a polygon-mesh fragment.
    ///
    /// Equivalent to handing the mesh's vertex and face lists to
    /// [`compress_and_integrate`](Self::compress_and_integrate).
    pub fn compress_mesh(
        &mut self,
        mesh: &ColoredTriangleMesh,
        stamp_in_sec: f64,
    ) -> IntegrationResult {
        self.compress_and_integrate(&mesh.vertices, &mesh.faces, stamp_in_sec)
    }

    /// Integrate a block-indexed volumetric fragment.
    ///
    /// Blocks are expanded to the generic shape and run through the same
    /// algorithm; the returned remapping is keyed by block index and
    /// within-block position instead of flat input index.
    pub fn compress_and_integrate_blocks(
        &mut self,
        mesh: &BlockedMesh,
        stamp_in_sec: f64,
    ) -> BlockIntegrationResult {
        self.check_bookkeeping();
        let (vertices, faces, origins) = expand_blocked_mesh(mesh);
        let generic = self.integrate(&vertices, &faces, stamp_in_sec);

        let mut remapping: BlockIndexMapping = HashMap::new();
        for block in mesh.blocks.iter().filter(|b| b.is_well_formed()) {
            remapping.entry(block.index).or_default();
        }
        for (input_idx, id) in &generic.remapping {
            let (block_index, local_idx) = origins[*input_idx];
            remapping.entry(block_index).or_default().insert(local_idx, *id);
        }

        self.check_bookkeeping();
        BlockIntegrationResult {
            new_vertices: generic.new_vertices,
            new_triangles: generic.new_triangles,
            new_indices: generic.new_indices,
            remapping,
        }
    }

    /// Evict active slots last observed at or before `earliest_time_sec`.
    ///
    /// The canonical vertex and triangle stores are untouched; evicted
    /// vertices simply stop absorbing future input, so re-observing their
    /// region later assigns fresh canonical ids. A length mismatch among
    /// the parallel active sequences is logged and skips the prune.
    pub fn prune_stored_mesh(&mut self, earliest_time_sec: f64) {
        if self.active_vertices.is_empty() {
            return;
        }
        if self.timestamps.len() != self.active_vertices.len()
            || self.active_indices.len() != self.active_vertices.len()
        {
            log::error!(
                "active vertex bookkeeping diverged ({} points, {} indices, {} stamps), skipping prune",
                self.active_vertices.len(),
                self.active_indices.len(),
                self.timestamps.len()
            );
            return;
        }

        let mut retained_vertices = Vec::new();
        let mut retained_indices = Vec::new();
        let mut retained_stamps = Vec::new();
        for i in 0..self.timestamps.len() {
            if self.timestamps[i] > earliest_time_sec {
                retained_vertices.push(self.active_vertices[i]);
                retained_indices.push(self.active_indices[i]);
                retained_stamps.push(self.timestamps[i]);
            }
        }

        if retained_vertices.len() < self.active_vertices.len() {
            self.active_vertices = retained_vertices;
            self.active_indices = retained_indices;
            self.timestamps = retained_stamps;
            self.index.reset(&self.active_vertices);
        }
        self.check_bookkeeping();
    }

    // ---- accessors ----

    /// Every vertex ever promoted, indexed by canonical id.
    pub fn vertices(&self) -> &[ColoredPoint3f] {
        &self.all_vertices
    }

    /// Every triangle ever accepted, as canonical-id triples.
    pub fn polygons(&self) -> &[[usize; 3]] {
        &self.polygons
    }

    /// Ids of the triangles adjacent to each canonical vertex.
    pub fn adjacent_polygons(&self) -> &[Vec<usize>] {
        &self.adjacent_polygons
    }

    /// Geometry of the active slots.
    pub fn active_vertices(&self) -> &[Point3f] {
        &self.active_vertices
    }

    /// Canonical id of each active slot.
    pub fn active_indices(&self) -> &[usize] {
        &self.active_indices
    }

    /// Last-seen time of each active slot, in seconds.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Number of active slots.
    pub fn active_len(&self) -> usize {
        self.active_vertices.len()
    }

    /// Dedup resolution, in meters.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Assemble the full compressed mesh accumulated so far.
    pub fn export_mesh(&self) -> ColoredTriangleMesh {
        ColoredTriangleMesh::from_vertices_and_faces(
            self.all_vertices.clone(),
            self.polygons.clone(),
        )
    }

    // ---- integration ----

    fn integrate(
        &mut self,
        input_vertices: &[ColoredPoint3f],
        input_faces: &[[usize; 3]],
        stamp_in_sec: f64,
    ) -> IntegrationResult {
        let mut result = IntegrationResult::default();
        if input_vertices.len() < 3 || input_faces.is_empty() {
            return result;
        }

        // Pass one over the vertices: resolve each input vertex against the
        // stored mesh first, then against the candidates of this call.
        let mut temp_reindex: Vec<Option<Reindex>> = Vec::with_capacity(input_vertices.len());
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut temp_index = I::with_resolution(self.resolution);
        let mut seen_indices: HashSet<usize> = HashSet::new();

        for (i, vertex) in input_vertices.iter().enumerate() {
            let p = &vertex.position;
            if let Some(slot) = self.index.nearest_within_cell(p) {
                // Reobservation of an active vertex.
                let id = self.active_indices[slot];
                temp_reindex.push(Some(Reindex::Canonical(id)));
                result.remapping.insert(i, id);
                if seen_indices.insert(id) {
                    result.new_indices.push(id);
                }
                // Timestamps only move forward.
                if stamp_in_sec > self.timestamps[slot] {
                    self.timestamps[slot] = stamp_in_sec;
                }
            } else if let Some(slot) = temp_index.nearest_within_cell(p) {
                // Collapses onto an earlier candidate of this call.
                temp_reindex.push(Some(Reindex::Tentative(slot)));
                candidates[slot].converged.push(i);
            } else {
                match temp_index.insert(p) {
                    Ok(()) => {
                        temp_reindex.push(Some(Reindex::Tentative(candidates.len())));
                        candidates.push(Candidate {
                            input_idx: i,
                            point: *vertex,
                            converged: Vec::new(),
                            face_supported: false,
                        });
                    }
                    Err(e) => {
                        log::error!("failed to index input vertex {}: {}", i, e);
                        temp_reindex.push(None);
                    }
                }
            }
        }

        // Pass one over the faces: a candidate survives only if referenced
        // by a face that stays non-degenerate after remapping.
        for face in input_faces {
            let mapped = match remap_face(face, &temp_reindex) {
                Some(mapped) => mapped,
                None => continue,
            };
            if !mapped.iter().any(|r| matches!(r, Reindex::Tentative(_))) {
                continue;
            }
            if mapped[0] == mapped[1] || mapped[1] == mapped[2] || mapped[2] == mapped[0] {
                continue;
            }
            for reindex in &mapped {
                if let Reindex::Tentative(slot) = reindex {
                    candidates[*slot].face_supported = true;
                }
            }
        }

        // Promotion, in candidate order. Unsupported candidates are dropped
        // silently and leave no remapping entries.
        for candidate in &candidates {
            if !candidate.face_supported {
                continue;
            }
            if let Err(e) = self.index.insert(&candidate.point.position) {
                log::error!("failed to insert mesh vertex into spatial index: {}", e);
                continue;
            }
            let id = self.all_vertices.len();
            self.all_vertices.push(candidate.point);
            self.adjacent_polygons.push(Vec::new());
            self.active_vertices.push(candidate.point.position);
            self.active_indices.push(id);
            self.timestamps.push(stamp_in_sec);

            result.remapping.insert(candidate.input_idx, id);
            for &converged in &candidate.converged {
                result.remapping.insert(converged, id);
            }
            result.new_indices.push(id);
            result.new_vertices.push(candidate.point);
        }

        // Pass two over the faces: emit through the completed remapping.
        // The adjacency test sees triangles added earlier in this call, so
        // one call cannot introduce duplicates.
        for face in input_faces {
            let triangle = match (
                result.remapping.get(&face[0]),
                result.remapping.get(&face[1]),
                result.remapping.get(&face[2]),
            ) {
                (Some(&a), Some(&b), Some(&c)) if a != b && b != c && c != a => [a, b, c],
                _ => continue,
            };
            if self.surface_exists(&triangle) {
                continue;
            }
            let polygon_id = self.polygons.len();
            self.polygons.push(triangle);
            for &v in &triangle {
                self.adjacent_polygons[v].push(polygon_id);
            }
            result.new_triangles.push(triangle);
        }

        result
    }

    /// A triangle already exists iff some polygon id lies in the adjacency
    /// lists of all three of its vertices.
    fn surface_exists(&self, triangle: &[usize; 3]) -> bool {
        let [a, b, c] = *triangle;
        self.adjacent_polygons[a].iter().any(|id| {
            self.adjacent_polygons[b].contains(id) && self.adjacent_polygons[c].contains(id)
        })
    }

    fn check_bookkeeping(&self) {
        debug_assert_eq!(self.active_vertices.len(), self.active_indices.len());
        debug_assert_eq!(self.active_vertices.len(), self.timestamps.len());
        debug_assert_eq!(self.all_vertices.len(), self.adjacent_polygons.len());
        debug_assert!(self
            .active_indices
            .iter()
            .all(|&id| id < self.all_vertices.len()));
    }
}
