//! Depth fields
//!
//! Every cue generator produces a [`DepthCueMap`]; fusion collapses them into
//! a single [`FusedDepthMap`]. Both wrap a [`DepthMap`], a dense `f32` field
//! over the image domain indexed as `[[y, x]]`.

use crate::error::{Error, Result};
use crate::masked_image::Mask;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The registered depth cue generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// Distance to the mask boundary
    ShapeContour,
    /// Inverted distance to the intensity-weighted centroid
    RadialGradient,
    /// Inverted, blurred edge response
    EdgeEnhanced,
    /// Multi-scale local deviation
    TextureDepth,
}

impl CueKind {
    /// All cues in fusion order
    pub const ALL: [CueKind; 4] = [
        CueKind::ShapeContour,
        CueKind::RadialGradient,
        CueKind::EdgeEnhanced,
        CueKind::TextureDepth,
    ];

    /// Stable name used in configuration files and logs
    pub fn name(&self) -> &'static str {
        match self {
            CueKind::ShapeContour => "shape_contour",
            CueKind::RadialGradient => "radial_gradient",
            CueKind::EdgeEnhanced => "edge_enhanced",
            CueKind::TextureDepth => "texture_depth",
        }
    }
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CueKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| Error::InvalidData(format!("unknown depth cue '{}'", s)))
    }
}

/// A dense scalar field over the image domain
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    values: Array2<f32>,
}

/// The single depth field produced by fusion
pub type FusedDepthMap = DepthMap;

impl DepthMap {
    /// Create an all-zero map
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            values: Array2::zeros((height as usize, width as usize)),
        }
    }

    /// Wrap an existing `(rows, cols)` array
    pub fn from_array(values: Array2<f32>) -> Self {
        Self { values }
    }

    pub fn width(&self) -> u32 {
        self.values.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.values.nrows() as u32
    }

    /// Value at pixel `(x, y)`
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[[y as usize, x as usize]]
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn into_array(self) -> Array2<f32> {
        self.values
    }

    /// Maximum value over foreground pixels, 0 for an empty mask
    pub fn masked_max(&self, mask: &Mask) -> f32 {
        self.values
            .indexed_iter()
            .filter(|((y, x), _)| mask.get(*x as u32, *y as u32))
            .map(|(_, &v)| v)
            .fold(0.0f32, f32::max)
    }

    /// Largest value anywhere in the map
    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(0.0f32, f32::max)
    }

    /// True if no pixel carries a positive depth
    pub fn is_all_zero(&self) -> bool {
        !self.values.iter().any(|&v| v > 0.0)
    }

    /// Whether the map covers the same pixel domain as `mask`
    pub fn matches(&self, mask: &Mask) -> bool {
        self.width() == mask.width() && self.height() == mask.height()
    }
}

/// Output of one cue generator
#[derive(Debug, Clone, PartialEq)]
pub struct DepthCueMap {
    pub kind: CueKind,
    pub depth: DepthMap,
}

impl DepthCueMap {
    pub fn new(kind: CueKind, depth: DepthMap) -> Self {
        Self { kind, depth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_names_round_trip() {
        for kind in CueKind::ALL {
            assert_eq!(kind.name().parse::<CueKind>().unwrap(), kind);
        }
        assert!("sharpness".parse::<CueKind>().is_err());
    }

    #[test]
    fn test_masked_max_ignores_background() {
        let mut values = Array2::zeros((2, 2));
        values[[0, 0]] = 0.25;
        values[[1, 1]] = 0.9;
        let map = DepthMap::from_array(values);
        let mask = Mask::from_fn(2, 2, |x, y| x == 0 && y == 0);

        assert_eq!(map.masked_max(&mask), 0.25);
        assert_eq!(map.max_value(), 0.9);
        assert!(!map.is_all_zero());
        assert!(DepthMap::zeros(3, 3).is_all_zero());
    }
}
