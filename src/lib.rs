//! # Meshpress
//!
//! Incremental mesh compression for robotic mapping pipelines.
//!
//! This is the umbrella crate that provides convenient access to the
//! meshpress workspace. A reconstruction front-end repeatedly emits
//! overlapping partial meshes of a growing region; meshpress deduplicates
//! them into a single ever-growing global mesh while reporting, per update,
//! exactly which vertices and triangles were added, so consumers such as a
//! deformation graph can be updated in lock-step.
//!
//! ## Quick Start
//!
//! ```rust
//! use meshpress::prelude::*;
//!
//! let mut compressor = OctreeCompressor::new(0.5).unwrap();
//!
//! let vertices = vec![
//!     ColoredPoint3f::from_position(Point3f::new(0.0, 0.0, 0.0)),
//!     ColoredPoint3f::from_position(Point3f::new(1.0, 0.0, 0.0)),
//!     ColoredPoint3f::from_position(Point3f::new(0.0, 1.0, 0.0)),
//! ];
//! let result = compressor.compress_and_integrate(&vertices, &[[0, 1, 2]], 0.0);
//! assert_eq!(result.new_vertices.len(), 3);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: enables `compression`
//! - `compression`: the compression engine (spatial backends, block input)

// Re-export core functionality
pub use meshpress_core::*;

#[cfg(feature = "compression")]
pub use meshpress_compression as compression;

/// Convenient imports for common use cases
pub mod prelude {
    pub use meshpress_core::*;

    #[cfg(feature = "compression")]
    pub use meshpress_compression::*;
}
