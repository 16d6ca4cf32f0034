//! Colour enhancement applied before cue estimation, and the gamma colour
//! mapping used for point colours

use crate::imgproc::luma;
use depthify_core::{MaskedImage, Result};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Enhancement factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Blend factor away from each pixel's own gray level
    pub saturation: f32,
    /// Blend factor away from the mean gray level of the image
    pub contrast: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            saturation: 1.1,
            contrast: 1.05,
        }
    }
}

#[inline]
fn blend(center: f32, value: f32, factor: f32) -> u8 {
    (center + factor * (value - center)).round().clamp(0.0, 255.0) as u8
}

/// Boost saturation, then contrast.
///
/// The mask is carried over unchanged. An image with an empty mask is
/// returned as is.
pub fn enhance_colors(image: &MaskedImage, config: &EnhanceConfig) -> Result<MaskedImage> {
    if image.mask().is_empty() {
        return Ok(image.clone());
    }

    let mut saturated = image.rgb().clone();
    for pixel in saturated.pixels_mut() {
        let gray = luma(pixel.0);
        let [r, g, b] = pixel.0;
        *pixel = Rgb([
            blend(gray, r as f32, config.saturation),
            blend(gray, g as f32, config.saturation),
            blend(gray, b as f32, config.saturation),
        ]);
    }

    let pixel_count = (saturated.width() as f64 * saturated.height() as f64).max(1.0);
    let mean_gray = (saturated.pixels().map(|p| luma(p.0) as f64).sum::<f64>() / pixel_count).round() as f32;

    for pixel in saturated.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = blend(mean_gray, *channel as f32, config.contrast);
        }
    }

    image.with_rgb(saturated)
}

/// Map every channel through `floor(255 · (c / 255)^gamma)`
pub fn gamma_color_mapping(rgb: &RgbImage, gamma: f32) -> RgbImage {
    let table: Vec<u8> = (0..=255u32)
        .map(|c| (255.0 * (c as f32 / 255.0).powf(gamma)).floor().clamp(0.0, 255.0) as u8)
        .collect();

    let mut mapped = rgb.clone();
    for pixel in mapped.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = table[*channel as usize];
        }
    }
    mapped
}
