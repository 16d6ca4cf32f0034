//! Error types for depthify

use thiserror::Error;

/// Main error type for depthify operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Image error: {0}")]
    Image(String),

    /// Empty mask, zero-area contour or an all-zero fused depth map.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Every sampled point was rejected before meshing.
    #[error("Empty point cloud: {0}")]
    EmptyPointCloud(String),

    /// The triangulation produced no simplices.
    #[error("Triangulation failure: {0}")]
    TriangulationFailure(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

/// Result type alias for depthify operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}
