//! Image processing helpers
//!
//! Adapters between the `ndarray` fields used by the cue generators (indexed
//! `[[y, x]]`), boolean masks and the `imageproc` operators that do the work.

use depthify_core::Mask;
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::morphology;
use ndarray::Array2;

/// Single channel `f32` image accepted by the `imageproc` filters
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Rounded ITU-R 601 luma of an 8-bit colour
#[inline]
pub fn luma(rgb: [u8; 3]) -> f32 {
    (0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32).round()
}

/// Grayscale version of an RGB image
pub fn grayscale(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        Luma([luma(rgb.get_pixel(x, y).0) as u8])
    })
}

fn field_to_image(field: &Array2<f32>) -> FloatImage {
    let (h, w) = field.dim();
    FloatImage::from_fn(w as u32, h as u32, |x, y| Luma([field[[y as usize, x as usize]]]))
}

fn image_to_field(image: &FloatImage) -> Array2<f32> {
    let (w, h) = image.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| image.get_pixel(x as u32, y as u32)[0])
}

/// 255 on the mask, 0 elsewhere
pub fn mask_to_image(mask: &Mask) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([if mask.get(x, y) { 255 } else { 0 }])
    })
}

/// Non-zero pixels become foreground
pub fn image_to_mask(image: &GrayImage) -> Mask {
    Mask::from_fn(image.width(), image.height(), |x, y| image.get_pixel(x, y)[0] > 0)
}

/// Isotropic Gaussian blur with replicated borders.
///
/// A non-positive sigma returns the field unchanged.
pub fn gaussian_filter(field: &Array2<f32>, sigma: f32) -> Array2<f32> {
    if !(sigma > 0.0) || field.is_empty() {
        return field.clone();
    }
    let blurred = imageproc::filter::gaussian_blur_f32(&field_to_image(field), sigma);
    image_to_field(&blurred)
}

/// Mean over a `size × size` window with replicated borders, as grey levels.
///
/// Even sizes are widened to the next odd size.
pub fn box_mean(gray: &GrayImage, size: usize) -> GrayImage {
    if size <= 1 || gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    let radius = (size / 2) as u32;
    imageproc::filter::box_filter(gray, radius, radius)
}

/// Canny edge map of a grey image
pub fn canny(gray: &GrayImage, low: f32, high: f32) -> Array2<bool> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return Array2::from_elem((h as usize, w as usize), false);
    }
    let edges = imageproc::edges::canny(gray, low, high);
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| edges.get_pixel(x as u32, y as u32)[0] > 0)
}

/// Structuring elements for binary morphology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuringElement {
    /// Full `n × n` square
    Rect(usize),
    /// Digital ellipse inscribed in an `n × n` square
    Ellipse(usize),
}

impl StructuringElement {
    fn size(&self) -> usize {
        match *self {
            StructuringElement::Rect(size) | StructuringElement::Ellipse(size) => size,
        }
    }

    /// Offsets `(dx, dy)` covered by the element, relative to its centre
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        match *self {
            StructuringElement::Rect(size) => {
                let r = (size / 2) as isize;
                let start = -r;
                let end = size as isize - r;
                (start..end)
                    .flat_map(|dy| (start..end).map(move |dx| (dx, dy)))
                    .collect()
            }
            StructuringElement::Ellipse(size) => {
                let r = (size / 2) as isize;
                let mut offsets = Vec::new();
                for dy in -r..=r {
                    let half = if r == 0 {
                        0
                    } else {
                        let ratio = 1.0 - (dy * dy) as f64 / (r * r) as f64;
                        (r as f64 * ratio.max(0.0).sqrt()).round() as isize
                    };
                    for dx in -half..=half {
                        offsets.push((dx, dy));
                    }
                }
                offsets
            }
        }
    }

    /// The element as an `imageproc` mask centred on its anchor
    fn kernel(&self) -> morphology::Mask {
        let r = (self.size() / 2) as isize;
        let side = (2 * r + 1) as u32;
        let mut image = GrayImage::new(side, side);
        for (dx, dy) in self.offsets() {
            image.put_pixel((dx + r) as u32, (dy + r) as u32, Luma([255]));
        }
        morphology::Mask::from_image(&image, r as u8, r as u8)
    }
}

/// Dilation followed by erosion: fills small holes and gaps.
///
/// Pixels outside the image are ignored.
pub fn close(mask: &Mask, element: StructuringElement) -> Mask {
    if element.size() <= 1 || mask.width() == 0 || mask.height() == 0 {
        return mask.clone();
    }
    image_to_mask(&morphology::grayscale_close(&mask_to_image(mask), &element.kernel()))
}

/// Erosion followed by dilation: removes small specks
pub fn open(mask: &Mask, element: StructuringElement) -> Mask {
    if element.size() <= 1 || mask.width() == 0 || mask.height() == 0 {
        return mask.clone();
    }
    image_to_mask(&morphology::grayscale_open(&mask_to_image(mask), &element.kernel()))
}

/// Exact Euclidean distance from every foreground pixel to the nearest
/// background pixel. The area outside the image counts as background.
pub fn distance_transform(mask: &Mask) -> Array2<f32> {
    let (w, h) = (mask.width(), mask.height());
    // background, plus a one pixel frame, are the seeds of the transform
    let seeds = GrayImage::from_fn(w + 2, h + 2, |x, y| {
        let inside = x > 0 && y > 0 && x <= w && y <= h && mask.get(x - 1, y - 1);
        Luma([if inside { 0 } else { 255 }])
    });
    let squared = euclidean_squared_distance_transform(&seeds);
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        squared.get_pixel(x as u32 + 1, y as u32 + 1)[0].sqrt() as f32
    })
}
