//! Masked input images
//!
//! A [`MaskedImage`] pairs an RGB pixel grid with a same-sized boolean
//! foreground mask. It is produced once from the segmentation output and is
//! never mutated afterwards; enhancement stages build a new image instead.

use crate::error::{Error, Result};
use image::{Rgb, RgbImage, RgbaImage};
use ndarray::Array2;

/// Alpha values strictly above this mark a pixel as foreground.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 128;

/// Boolean foreground mask, indexed as `[[y, x]]`
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    data: Array2<bool>,
}

impl Mask {
    /// Create an all-background mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: Array2::from_elem((height as usize, width as usize), false),
        }
    }

    /// Create an all-foreground mask
    pub fn filled(width: u32, height: u32) -> Self {
        Self {
            data: Array2::from_elem((height as usize, width as usize), true),
        }
    }

    /// Wrap an existing `(rows, cols)` boolean array
    pub fn from_array(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        Self {
            data: Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
                f(x as u32, y as u32)
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.data.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.data.nrows() as u32
    }

    /// Whether pixel `(x, y)` is foreground; out-of-range pixels are background
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if let Some(v) = self.data.get_mut((y as usize, x as usize)) {
            *v = value;
        }
    }

    /// Number of foreground pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// True when no pixel is foreground
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Foreground pixel count divided by the image area
    pub fn area_fraction(&self) -> f32 {
        let total = self.data.len();
        if total == 0 {
            return 0.0;
        }
        self.count() as f32 / total as f32
    }

    /// Iterate over foreground pixel coordinates in row-major order
    pub fn foreground(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.data
            .indexed_iter()
            .filter(|(_, &v)| v)
            .map(|((y, x), _)| (x as u32, y as u32))
    }

    /// Underlying `(rows, cols)` array
    pub fn as_array(&self) -> &Array2<bool> {
        &self.data
    }
}

/// An RGB image restricted to a foreground mask
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedImage {
    rgb: RgbImage,
    mask: Mask,
}

impl MaskedImage {
    /// Pair an RGB image with a mask of identical dimensions
    pub fn new(rgb: RgbImage, mask: Mask) -> Result<Self> {
        if rgb.width() != mask.width() || rgb.height() != mask.height() {
            return Err(Error::InvalidData(format!(
                "mask is {}x{} but image is {}x{}",
                mask.width(),
                mask.height(),
                rgb.width(),
                rgb.height()
            )));
        }
        Ok(Self { rgb, mask })
    }

    /// Split an RGBA segmentation result into colours and a foreground mask.
    ///
    /// A pixel is foreground when its alpha is strictly greater than
    /// `alpha_threshold`.
    pub fn from_rgba(rgba: &RgbaImage, alpha_threshold: u8) -> Self {
        let (width, height) = rgba.dimensions();
        let rgb = RgbImage::from_fn(width, height, |x, y| {
            let [r, g, b, _] = rgba.get_pixel(x, y).0;
            Rgb([r, g, b])
        });
        let mask = Mask::from_fn(width, height, |x, y| {
            rgba.get_pixel(x, y).0[3] > alpha_threshold
        });
        Self { rgb, mask }
    }

    /// Same mask, different colours (e.g. after enhancement)
    pub fn with_rgb(&self, rgb: RgbImage) -> Result<Self> {
        Self::new(rgb, self.mask.clone())
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// Colour of pixel `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.rgb.get_pixel(x, y).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_from_rgba_uses_strict_alpha_threshold() {
        let mut rgba = RgbaImage::new(3, 1);
        rgba.put_pixel(0, 0, Rgba([10, 20, 30, 128]));
        rgba.put_pixel(1, 0, Rgba([40, 50, 60, 129]));
        rgba.put_pixel(2, 0, Rgba([70, 80, 90, 255]));

        let image = MaskedImage::from_rgba(&rgba, DEFAULT_ALPHA_THRESHOLD);

        assert!(!image.mask().get(0, 0));
        assert!(image.mask().get(1, 0));
        assert!(image.mask().get(2, 0));
        assert_eq!(image.pixel(1, 0), [40, 50, 60]);
        assert_eq!(image.mask().count(), 2);
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let rgb = RgbImage::new(4, 4);
        let mask = Mask::filled(4, 3);
        assert!(MaskedImage::new(rgb, mask).is_err());
    }

    #[test]
    fn test_mask_queries() {
        let mask = Mask::from_fn(4, 2, |x, _| x < 2);
        assert_eq!(mask.count(), 4);
        assert!(!mask.is_empty());
        assert_eq!(mask.area_fraction(), 0.5);
        assert!(!mask.get(10, 10));

        let coords: Vec<(u32, u32)> = mask.foreground().collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);

        assert!(Mask::new(3, 3).is_empty());
    }
}
