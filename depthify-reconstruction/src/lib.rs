//! # Depthify Reconstruction
//!
//! Surface reconstruction from sampled depth points.
//!
//! This crate provides Delaunay triangulation with face quality filtering,
//! Laplacian smoothing, colored mesh assembly and the [`DepthPipeline`] that
//! runs every stage from a masked image to a mesh.

pub mod delaunay;
pub mod smoothing;
pub mod assembly;
pub mod pipeline;

// Re-export commonly used items
pub use delaunay::*;
pub use smoothing::*;
pub use assembly::*;
pub use pipeline::*;
