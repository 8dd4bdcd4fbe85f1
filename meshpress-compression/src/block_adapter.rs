//! Expansion of block-indexed volumetric mesh fragments
//!
//! Each block carries a quantized triangle soup in which every three
//! consecutive points form one face. The adapter decodes well-formed blocks
//! into the generic `(vertices, faces)` shape the compressor consumes while
//! recording, for each expanded vertex, the block it came from and its
//! position within that block's stream.

use meshpress_core::{BlockIndex, BlockedMesh, ColoredPoint3f};

/// Decode a blocked fragment into vertices, faces, and per-vertex origins.
///
/// Malformed blocks (stream lengths disagreeing or not triangle-aligned)
/// are logged and skipped.
pub fn expand_blocked_mesh(
    mesh: &BlockedMesh,
) -> (Vec<ColoredPoint3f>, Vec<[usize; 3]>, Vec<(BlockIndex, usize)>) {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    let mut origins = Vec::new();

    for block in &mesh.blocks {
        if !block.is_well_formed() {
            log::warn!("skipping malformed mesh block at index {:?}", block.index);
            continue;
        }
        for i in 0..block.len() {
            let count = vertices.len();
            vertices.push(block.point(mesh.block_edge_length, i));
            origins.push((block.index, i));
            if i % 3 == 2 {
                faces.push([count - 2, count - 1, count]);
            }
        }
    }

    (vertices, faces, origins)
}
