//! Loading segmented RGBA images
//!
//! A segmentation tool hands over a single RGBA file whose alpha channel marks
//! the object. Loading splits it into the colour buffer and a boolean mask.

use depthify_core::{MaskedImage, Result, RgbaImage, DEFAULT_ALPHA_THRESHOLD};
use std::path::Path;
use tracing::debug;

/// Read an image file and split it using `alpha_threshold`.
///
/// Images without an alpha channel are promoted to fully opaque RGBA, so
/// every pixel becomes foreground.
pub fn load_masked_image_with_threshold<P: AsRef<Path>>(path: P, alpha_threshold: u8) -> Result<MaskedImage> {
    let path = path.as_ref();
    let rgba = image::open(path)?.to_rgba8();
    let image = MaskedImage::from_rgba(&rgba, alpha_threshold);
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        foreground = image.mask().count(),
        "Loaded masked image"
    );
    Ok(image)
}

/// Read an image file with the default alpha threshold
pub fn load_masked_image<P: AsRef<Path>>(path: P) -> Result<MaskedImage> {
    load_masked_image_with_threshold(path, DEFAULT_ALPHA_THRESHOLD)
}

/// Decode an in-memory encoded image (PNG or JPEG)
pub fn decode_masked_image(bytes: &[u8], alpha_threshold: u8) -> Result<MaskedImage> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    Ok(MaskedImage::from_rgba(&rgba, alpha_threshold))
}

/// Write the masked image back out as RGBA, alpha 255 on the object and 0
/// elsewhere
pub fn save_masked_image<P: AsRef<Path>>(image: &MaskedImage, path: P) -> Result<()> {
    let rgba = RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.pixel(x, y);
        let a = if image.mask().get(x, y) { 255 } else { 0 };
        image::Rgba([r, g, b, a])
    });
    rgba.save(path)?;
    Ok(())
}
