//! Turning a fused depth field into a point cloud

use crate::enhance::gamma_color_mapping;
use depthify_core::{DepthPointCloud, Error, FusedDepthMap, MaskedImage, PointRecord, Result};
use serde::{Deserialize, Serialize};

/// Which pixels become points and how they are coloured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Pixels at or below this depth are skipped
    pub min_depth: f32,
    /// Exponent of the point colour mapping
    pub color_gamma: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            min_depth: 0.01,
            color_gamma: 0.9,
        }
    }
}

/// Emit one point per foreground pixel whose fused depth exceeds
/// `config.min_depth`, in row-major order.
///
/// Colours come from `image` (normally the enhanced image) passed through
/// the gamma colour mapping.
pub fn sample_point_cloud(
    depth: &FusedDepthMap,
    image: &MaskedImage,
    config: &SamplingConfig,
) -> Result<DepthPointCloud> {
    if depth.width() != image.width() || depth.height() != image.height() {
        return Err(Error::InvalidData(format!(
            "depth map is {}x{} but image is {}x{}",
            depth.width(),
            depth.height(),
            image.width(),
            image.height()
        )));
    }

    let colors = gamma_color_mapping(image.rgb(), config.color_gamma);
    let mask = image.mask();

    Ok(depth
        .as_array()
        .indexed_iter()
        .filter(|&((y, x), &z)| z > config.min_depth && mask.get(x as u32, y as u32))
        .map(|((y, x), &z)| {
            let (x, y) = (x as u32, y as u32);
            PointRecord::new(x, y, z, colors.get_pixel(x, y).0)
        })
        .collect())
}
