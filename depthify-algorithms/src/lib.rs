//! # Depthify Algorithms
//!
//! Image-space algorithms for single-image depth reconstruction.
//!
//! This crate provides the stages that run before triangulation: colour
//! enhancement, object classification, the monocular depth cues, cue fusion,
//! point sampling and outlier rejection, together with the image processing
//! primitives they are built on.

pub mod imgproc;
pub mod stats;
pub mod contour;
pub mod enhance;
pub mod classifier;
pub mod cues;
pub mod fusion;
pub mod sampling;
pub mod filtering;
pub mod nearest_neighbor;

// Re-export commonly used items
pub use enhance::*;
pub use classifier::*;
pub use cues::*;
pub use fusion::*;
pub use sampling::*;
pub use filtering::*;
pub use nearest_neighbor::*;
