//! Mesh data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with colored vertices
///
/// This is both the generic fragment shape accepted by the compressor and
/// the shape of the accumulated compressed mesh handed to downstream
/// consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColoredTriangleMesh {
    pub vertices: Vec<ColoredPoint3f>,
    pub faces: Vec<[usize; 3]>,
}

impl ColoredTriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<ColoredPoint3f>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh, returning its index
    pub fn add_vertex(&mut self, vertex: ColoredPoint3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }
}
