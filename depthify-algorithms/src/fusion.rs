//! Weighted fusion of depth cues into a single depth field

use crate::imgproc::gaussian_filter;
use depthify_core::{CueKind, DepthCueMap, Error, FusedDepthMap, Mask, ObjectProfile, Result};
use ndarray::{Array2, Zip};
use std::collections::BTreeMap;
use tracing::debug;

/// Fuse cue maps with the weights of `profile`.
///
/// The weighted sum is blurred with `profile.smooth_sigma`, raised to
/// `1 / profile.depth_boost`, clamped to `[0, 1]` and zeroed outside `mask`.
/// Cues without a weight contribute nothing; an empty cue set yields an
/// all-zero map.
///
/// # Arguments
/// * `cues` - Cue maps keyed by kind, all sized like `mask`
/// * `profile` - Fusion weights and shaping parameters
/// * `mask` - Foreground mask of the image
///
/// # Returns
/// * `Result<FusedDepthMap>` - The fused depth field
pub fn fuse_depth_cues(
    cues: &BTreeMap<CueKind, DepthCueMap>,
    profile: &ObjectProfile,
    mask: &Mask,
) -> Result<FusedDepthMap> {
    profile.validate()?;

    let shape = (mask.height() as usize, mask.width() as usize);
    let mut combined = Array2::<f32>::zeros(shape);

    for (kind, cue) in cues {
        if !cue.depth.matches(mask) {
            return Err(Error::InvalidData(format!(
                "cue {} is {}x{} but mask is {}x{}",
                kind,
                cue.depth.width(),
                cue.depth.height(),
                mask.width(),
                mask.height()
            )));
        }

        let weight = profile.weight(*kind);
        if weight == 0.0 {
            continue;
        }
        combined.scaled_add(weight, cue.depth.as_array());
    }

    let smoothed = gaussian_filter(&combined, profile.smooth_sigma);
    let exponent = 1.0 / profile.depth_boost;

    let mut fused = smoothed;
    Zip::from(&mut fused).and(mask.as_array()).for_each(|v, &inside| {
        *v = if inside {
            v.max(0.0).powf(exponent).clamp(0.0, 1.0)
        } else {
            0.0
        };
    });

    let fused = FusedDepthMap::from_array(fused);
    debug!(
        cues = cues.len(),
        sigma = profile.smooth_sigma,
        boost = profile.depth_boost,
        max = fused.max_value(),
        "Fused depth cues"
    );
    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use depthify_core::DepthMap;

    fn constant_cue(kind: CueKind, value: f32, w: u32, h: u32) -> DepthCueMap {
        DepthCueMap::new(kind, DepthMap::from_array(Array2::from_elem((h as usize, w as usize), value)))
    }

    fn two_cue_profile() -> ObjectProfile {
        ObjectProfile {
            name: "test".to_string(),
            scale_z: 1.0,
            smooth_sigma: 0.0,
            depth_boost: 2.0,
            gradient_strength: 0.5,
            cue_weights: BTreeMap::from([(CueKind::ShapeContour, 0.2), (CueKind::RadialGradient, 0.4)]),
        }
    }

    #[test]
    fn test_weighted_sum_and_boost() {
        let mask = Mask::filled(3, 3);
        let cues = BTreeMap::from([
            (CueKind::ShapeContour, constant_cue(CueKind::ShapeContour, 0.5, 3, 3)),
            (CueKind::RadialGradient, constant_cue(CueKind::RadialGradient, 1.0, 3, 3)),
        ]);

        let fused = fuse_depth_cues(&cues, &two_cue_profile(), &mask).unwrap();
        // (0.2 * 0.5 + 0.4 * 1.0)^(1 / 2)
        for &v in fused.as_array().iter() {
            assert_relative_eq!(v, 0.5f32.sqrt(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_blur_runs_before_boost() {
        let mask = Mask::filled(7, 5);
        let ramp = Array2::from_shape_fn((5, 7), |(_, x)| x as f32 / 6.0);
        let ridge = Array2::from_shape_fn((5, 7), |(y, _)| if y == 2 { 1.0 } else { 0.0 });
        let cues = BTreeMap::from([
            (CueKind::ShapeContour, DepthCueMap::new(CueKind::ShapeContour, DepthMap::from_array(ramp.clone()))),
            (CueKind::RadialGradient, DepthCueMap::new(CueKind::RadialGradient, DepthMap::from_array(ridge.clone()))),
        ]);
        let mut profile = two_cue_profile();
        profile.smooth_sigma = 1.0;

        let fused = fuse_depth_cues(&cues, &profile, &mask).unwrap();

        let combined = &ramp * 0.2 + &ridge * 0.4;
        let expected = gaussian_filter(&combined, 1.0).mapv(|v| v.max(0.0).sqrt().min(1.0));
        for (&v, &e) in fused.as_array().iter().zip(expected.iter()) {
            assert_relative_eq!(v, e, epsilon = 1e-5);
        }

        // boosting first and blurring afterwards gives a different field
        let reversed = gaussian_filter(&combined.mapv(f32::sqrt), 1.0);
        let largest_gap = fused
            .as_array()
            .iter()
            .zip(reversed.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(largest_gap > 1e-3);
    }

    #[test]
    fn test_unweighted_cue_is_ignored() {
        let mask = Mask::filled(3, 3);
        let cues = BTreeMap::from([
            (CueKind::ShapeContour, constant_cue(CueKind::ShapeContour, 0.5, 3, 3)),
            (CueKind::TextureDepth, constant_cue(CueKind::TextureDepth, 1.0, 3, 3)),
        ]);
        let fused = fuse_depth_cues(&cues, &two_cue_profile(), &mask).unwrap();
        assert_relative_eq!(fused.get(1, 1), 0.1f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_background_is_zero_and_range_is_unit() {
        let mut mask = Mask::filled(5, 5);
        mask.set(0, 0, false);
        let cues = BTreeMap::from([(CueKind::ShapeContour, constant_cue(CueKind::ShapeContour, 1.0, 5, 5))]);
        let mut profile = ObjectProfile::default();
        profile.cue_weights = BTreeMap::from([(CueKind::ShapeContour, 3.0)]);

        let fused = fuse_depth_cues(&cues, &profile, &mask).unwrap();
        assert_eq!(fused.get(0, 0), 0.0);
        assert!(fused.as_array().iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_relative_eq!(fused.get(2, 2), 1.0);
    }

    #[test]
    fn test_no_cues_gives_zero_map() {
        let mask = Mask::filled(4, 3);
        let fused = fuse_depth_cues(&BTreeMap::new(), &ObjectProfile::default(), &mask).unwrap();
        assert!(fused.is_all_zero());
        assert_eq!((fused.width(), fused.height()), (4, 3));
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mask = Mask::filled(4, 4);
        let cues = BTreeMap::from([(CueKind::ShapeContour, constant_cue(CueKind::ShapeContour, 1.0, 3, 3))]);
        let result = fuse_depth_cues(&cues, &ObjectProfile::default(), &mask);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_invalid_profile_is_rejected() {
        let mut profile = ObjectProfile::default();
        profile.depth_boost = -1.0;
        let result = fuse_depth_cues(&BTreeMap::new(), &profile, &Mask::filled(2, 2));
        assert!(result.is_err());
    }
}
