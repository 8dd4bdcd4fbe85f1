//! # Meshpress Compression
//!
//! Streaming compression and incremental integration of polygon-mesh
//! fragments.
//!
//! The [`MeshCompressor`] ingests overlapping mesh fragments, either as
//! generic vertex and face lists or as block-indexed volumetric meshes,
//! deduplicates their vertices at a fixed metric resolution, and grows an
//! append-only global mesh whose canonical vertex ids stay stable for the
//! lifetime of the compressor. Time-based pruning evicts stale vertices
//! from the dedup working set without touching the accumulated mesh.
//!
//! Nearest-vertex queries go through the [`SpatialIndex`] trait; the
//! available backends are a dynamic octree ([`OctreeIndex`]), a hash grid
//! ([`VoxelGridIndex`]), and a clearable hash grid ([`VoxelClearingIndex`]).

pub mod block_adapter;
pub mod compressor;
pub mod octree;
pub mod spatial;
pub mod voxel_clearing;
pub mod voxel_grid;

pub use block_adapter::*;
pub use compressor::*;
pub use octree::*;
pub use spatial::*;
pub use voxel_clearing::*;
pub use voxel_grid::*;
