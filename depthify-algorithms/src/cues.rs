//! Monocular depth cue generators
//!
//! Each generator implements [`DepthCue`] and maps a masked image to a
//! [`DepthCueMap`] with values in `[0, 1]` inside the mask and exactly zero
//! outside it. Generators are independent of one another and can run in
//! parallel.

use crate::imgproc::{box_mean, canny, close, distance_transform, gaussian_filter, grayscale, open, StructuringElement};
use crate::stats::percentile;
use depthify_core::{CueKind, DepthCue, DepthCueMap, DepthMap, Mask, MaskedImage};
use ndarray::{Array2, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Zero every pixel outside `mask` and clamp the rest into `[0, 1]`
fn restrict_to_mask(values: Array2<f32>, mask: &Mask) -> DepthMap {
    let mut values = values;
    Zip::from(&mut values).and(mask.as_array()).for_each(|v, &inside| {
        *v = if inside && v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    });
    DepthMap::from_array(values)
}

/// Distance to the (cleaned) mask boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeContourCue {
    /// Size of the elliptical closing element
    pub close_size: usize,
    /// Size of the square opening element
    pub open_size: usize,
    /// Exponent applied to a mask covering the whole image
    pub base_power: f32,
    /// Extra exponent added as the mask shrinks towards nothing
    pub power_range: f32,
}

impl Default for ShapeContourCue {
    fn default() -> Self {
        Self {
            close_size: 5,
            open_size: 3,
            base_power: 0.6,
            power_range: 0.3,
        }
    }
}

impl DepthCue for ShapeContourCue {
    fn kind(&self) -> CueKind {
        CueKind::ShapeContour
    }

    fn estimate(&self, image: &MaskedImage) -> DepthCueMap {
        let mask = image.mask();
        let cleaned = open(
            &close(mask, StructuringElement::Ellipse(self.close_size)),
            StructuringElement::Rect(self.open_size),
        );
        let distance = DepthMap::from_array(distance_transform(&cleaned));
        let max = distance.masked_max(mask);
        if max <= 0.0 {
            return DepthCueMap::new(self.kind(), DepthMap::zeros(image.width(), image.height()));
        }

        let power = self.base_power + self.power_range * (1.0 - mask.area_fraction());
        let values = distance.into_array().mapv(|d| (d / max).powf(power));
        DepthCueMap::new(self.kind(), restrict_to_mask(values, mask))
    }
}

/// Inverted distance from the intensity-weighted centroid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialGradientCue {
    /// Percentile of masked distances that maps to zero depth
    pub falloff_percentile: f64,
    pub exponent: f32,
}

impl Default for RadialGradientCue {
    fn default() -> Self {
        Self {
            falloff_percentile: 95.0,
            exponent: 0.8,
        }
    }
}

impl DepthCue for RadialGradientCue {
    fn kind(&self) -> CueKind {
        CueKind::RadialGradient
    }

    fn estimate(&self, image: &MaskedImage) -> DepthCueMap {
        let (w, h) = (image.width(), image.height());
        let zeros = || DepthCueMap::new(self.kind(), DepthMap::zeros(w, h));
        let mask = image.mask();
        let gray = grayscale(image.rgb());

        let (mut sum_w, mut sum_x, mut sum_y) = (0.0f64, 0.0f64, 0.0f64);
        for (x, y) in mask.foreground() {
            let weight = gray.get_pixel(x, y)[0] as f64 + 1.0;
            sum_w += weight;
            sum_x += weight * x as f64;
            sum_y += weight * y as f64;
        }
        if sum_w == 0.0 {
            return zeros();
        }
        let (cx, cy) = (sum_x / sum_w, sum_y / sum_w);

        let distances = Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
            ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt() as f32
        });
        let masked: Vec<f32> = mask
            .foreground()
            .map(|(x, y)| distances[[y as usize, x as usize]])
            .collect();

        let falloff = match percentile(&masked, self.falloff_percentile) {
            Some(p) if p > 0.0 => p,
            _ => return zeros(),
        };

        let values = distances.mapv(|d| (1.0 - d / falloff).clamp(0.0, 1.0).powf(self.exponent));
        DepthCueMap::new(self.kind(), restrict_to_mask(values, mask))
    }
}

/// Flat regions read as raised, edges as recessed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeEnhancedCue {
    /// `(low, high)` Canny threshold pairs whose edges are merged
    pub thresholds: Vec<(f32, f32)>,
    pub sigma: f32,
}

impl Default for EdgeEnhancedCue {
    fn default() -> Self {
        Self {
            thresholds: vec![(30.0, 100.0), (80.0, 200.0)],
            sigma: 1.5,
        }
    }
}

impl DepthCue for EdgeEnhancedCue {
    fn kind(&self) -> CueKind {
        CueKind::EdgeEnhanced
    }

    fn estimate(&self, image: &MaskedImage) -> DepthCueMap {
        let gray = grayscale(image.rgb());
        let mut combined = Array2::<f32>::zeros((gray.height() as usize, gray.width() as usize));
        for &(low, high) in &self.thresholds {
            let edges = canny(&gray, low, high);
            Zip::from(&mut combined).and(&edges).for_each(|c, &edge| {
                if edge {
                    *c = 255.0;
                }
            });
        }

        let smoothed = gaussian_filter(&combined, self.sigma);
        let values = smoothed.mapv(|v| 1.0 - v / 255.0);
        DepthCueMap::new(self.kind(), restrict_to_mask(values, image.mask()))
    }
}

/// Mean absolute deviation from local box means at several window sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureCue {
    pub window_sizes: Vec<usize>,
}

impl Default for TextureCue {
    fn default() -> Self {
        Self {
            window_sizes: vec![3, 7, 11],
        }
    }
}

impl DepthCue for TextureCue {
    fn kind(&self) -> CueKind {
        CueKind::TextureDepth
    }

    fn estimate(&self, image: &MaskedImage) -> DepthCueMap {
        let (w, h) = (image.width(), image.height());
        let mask = image.mask();
        let gray = grayscale(image.rgb());

        // grey levels and window means are integral, so a flat region
        // gives exactly zero deviation
        let mut combined = Array2::<f32>::zeros((h as usize, w as usize));
        for &size in &self.window_sizes {
            let mean = box_mean(&gray, size);
            for (x, y, g) in gray.enumerate_pixels() {
                let m = mean.get_pixel(x, y)[0];
                combined[[y as usize, x as usize]] += g[0].abs_diff(m) as f32;
            }
        }
        if !self.window_sizes.is_empty() {
            combined /= self.window_sizes.len() as f32;
        }

        let combined = DepthMap::from_array(combined);
        let max = combined.masked_max(mask);
        if max <= 0.0 {
            return DepthCueMap::new(self.kind(), DepthMap::zeros(w, h));
        }
        let values = combined.into_array() / max;
        DepthCueMap::new(self.kind(), restrict_to_mask(values, mask))
    }
}

/// Parameters of every registered cue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    pub shape_contour: ShapeContourCue,
    pub radial_gradient: RadialGradientCue,
    pub edge_enhanced: EdgeEnhancedCue,
    pub texture_depth: TextureCue,
}

impl CueConfig {
    /// Instantiate the cue set in fusion order
    pub fn build(&self) -> Vec<Box<dyn DepthCue>> {
        vec![
            Box::new(self.shape_contour.clone()),
            Box::new(self.radial_gradient.clone()),
            Box::new(self.edge_enhanced.clone()),
            Box::new(self.texture_depth.clone()),
        ]
    }
}

/// The four standard cues with default parameters
pub fn default_cues() -> Vec<Box<dyn DepthCue>> {
    CueConfig::default().build()
}

/// Run every cue on `image`, optionally in parallel.
///
/// The result is keyed by cue kind, so the order of `cues` does not affect
/// the outcome.
pub fn estimate_cues(
    cues: &[Box<dyn DepthCue>],
    image: &MaskedImage,
    parallel: bool,
) -> BTreeMap<CueKind, DepthCueMap> {
    let maps: Vec<DepthCueMap> = if parallel {
        cues.par_iter().map(|cue| cue.estimate(image)).collect()
    } else {
        cues.iter().map(|cue| cue.estimate(image)).collect()
    };

    maps.into_iter()
        .inspect(|map| debug!(cue = %map.kind, max = map.depth.max_value(), "Estimated depth cue"))
        .map(|map| (map.kind, map))
        .collect()
}
