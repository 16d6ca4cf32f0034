//! Core data structures and traits for depthify
//!
//! This crate provides the data model shared by every reconstruction stage:
//! masked input images, depth fields, object profiles, sampled point clouds
//! and the final colored mesh, together with the seam traits that let the
//! pipeline swap stage implementations.

pub mod masked_image;
pub mod depth;
pub mod profile;
pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod traits;
pub mod error;

pub use masked_image::*;
pub use depth::*;
pub use profile::*;
pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// Re-export the image buffer types used at the crate boundary
pub use image::{Rgb, RgbImage, Rgba, RgbaImage};

pub type Mesh = ColoredMesh;
