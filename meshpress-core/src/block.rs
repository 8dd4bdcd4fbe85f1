//! Block-indexed volumetric mesh wire types
//!
//! Volumetric meshers emit their output per spatial block. Each block
//! carries a quantized triangle soup: three parallel `u16` coordinate
//! streams where every three consecutive points form one triangle, plus
//! optional per-vertex colors. Coordinates are offsets within the block
//! cube, scaled by `block_edge_length / 32768`.

use crate::point::{ColoredPoint3f, Point3f};
use serde::{Deserialize, Serialize};

/// Index of a block in the volumetric grid
pub type BlockIndex = [i32; 3];

/// One block of a volumetric mesh fragment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshBlock {
    pub index: BlockIndex,
    pub x: Vec<u16>,
    pub y: Vec<u16>,
    pub z: Vec<u16>,
    pub colors: Option<Vec<[u8; 3]>>,
}

impl MeshBlock {
    /// Number of points in the block's stream
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Check if the block carries no points
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The coordinate streams must agree in length, be triangle-aligned,
    /// and match any color stream.
    pub fn is_well_formed(&self) -> bool {
        self.x.len() == self.y.len()
            && self.y.len() == self.z.len()
            && self.x.len() % 3 == 0
            && self.colors.as_ref().map_or(true, |c| c.len() == self.x.len())
    }

    /// World-frame origin of the block cube
    pub fn origin(&self, block_edge_length: f32) -> Point3f {
        Point3f::new(
            self.index[0] as f32 * block_edge_length,
            self.index[1] as f32 * block_edge_length,
            self.index[2] as f32 * block_edge_length,
        )
    }

    /// Decode point `i` of the stream into the world frame.
    ///
    /// Points without a color stream decode as white.
    pub fn point(&self, block_edge_length: f32, i: usize) -> ColoredPoint3f {
        let scale = block_edge_length / 32768.0;
        let origin = self.origin(block_edge_length);
        let position = Point3f::new(
            origin.x + f32::from(self.x[i]) * scale,
            origin.y + f32::from(self.y[i]) * scale,
            origin.z + f32::from(self.z[i]) * scale,
        );
        let color = self.colors.as_ref().map_or([255, 255, 255], |c| c[i]);
        ColoredPoint3f { position, color }
    }
}

/// A volumetric mesh fragment: a set of blocks sharing one edge length
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockedMesh {
    pub block_edge_length: f32,
    pub blocks: Vec<MeshBlock>,
}

impl BlockedMesh {
    /// Create a fragment with no blocks
    pub fn new(block_edge_length: f32) -> Self {
        Self {
            block_edge_length,
            blocks: Vec::new(),
        }
    }

    /// Check if the fragment carries no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
