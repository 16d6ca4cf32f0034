//! Object classification from simple image statistics
//!
//! Three signals are measured over the masked region (colour variance, edge
//! density and shape complexity) and fed to an ordered rule table. The
//! first matching rule decides the class.

use crate::contour::largest_contour;
use crate::imgproc::{canny, grayscale};
use crate::stats::mean_variance;
use depthify_core::{MaskedImage, ObjectClass, ObjectProfile, ProfileSelection, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Thresholds of the rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    pub organic_min_variance: f64,
    pub organic_min_complexity: f64,
    pub geometric_min_edge_density: f64,
    pub geometric_max_complexity: f64,
    pub fruit_min_variance: f64,
    pub fruit_max_edge_density: f64,
    pub flat_max_edge_density: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            organic_min_variance: 1000.0,
            organic_min_complexity: 15.0,
            geometric_min_edge_density: 0.1,
            geometric_max_complexity: 12.0,
            fruit_min_variance: 500.0,
            fruit_max_edge_density: 0.05,
            flat_max_edge_density: 0.02,
        }
    }
}

/// Measurements the rule table is evaluated on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectSignals {
    /// Mean over R, G, B of the population variance of masked pixels
    pub color_variance: f64,
    /// Fraction of masked pixels lying on a Canny edge
    pub edge_density: f64,
    /// Perimeter over √area of the largest outer boundary
    pub shape_complexity: f64,
}

/// Measure the classification signals of `image`.
///
/// Returns `None` when the mask is empty.
pub fn measure_signals(image: &MaskedImage, config: &ClassifierConfig) -> Option<ObjectSignals> {
    let mask = image.mask();
    let foreground: Vec<[u8; 3]> = mask.foreground().map(|(x, y)| image.pixel(x, y)).collect();
    if foreground.is_empty() {
        return None;
    }

    let color_variance = (0..3)
        .filter_map(|c| mean_variance(foreground.iter().map(move |p| p[c] as f64)))
        .map(|(_, variance)| variance)
        .sum::<f64>()
        / 3.0;

    let edges = canny(&grayscale(image.rgb()), config.canny_low, config.canny_high);
    let edge_pixels = mask.foreground().filter(|&(x, y)| edges[[y as usize, x as usize]]).count();
    let edge_density = edge_pixels as f64 / foreground.len() as f64;

    let shape_complexity = largest_contour(mask).map(|c| c.complexity()).unwrap_or(0.0);

    Some(ObjectSignals {
        color_variance,
        edge_density,
        shape_complexity,
    })
}

/// Evaluate the rule table on measured signals
pub fn classify_signals(signals: &ObjectSignals, config: &ClassifierConfig) -> ObjectClass {
    let ObjectSignals {
        color_variance,
        edge_density,
        shape_complexity,
    } = *signals;

    if color_variance > config.organic_min_variance && shape_complexity > config.organic_min_complexity {
        ObjectClass::Organic
    } else if edge_density > config.geometric_min_edge_density
        && shape_complexity < config.geometric_max_complexity
    {
        ObjectClass::Geometric
    } else if color_variance > config.fruit_min_variance && edge_density < config.fruit_max_edge_density {
        ObjectClass::Fruit
    } else if edge_density < config.flat_max_edge_density {
        ObjectClass::Flat
    } else {
        ObjectClass::Default
    }
}

/// Classify the object in `image`; an empty mask yields `Default`
pub fn classify_object(image: &MaskedImage, config: &ClassifierConfig) -> ObjectClass {
    match measure_signals(image, config) {
        Some(signals) => {
            let class = classify_signals(&signals, config);
            debug!(
                color_variance = signals.color_variance,
                edge_density = signals.edge_density,
                shape_complexity = signals.shape_complexity,
                class = %class,
                "Measured object signals"
            );
            class
        }
        None => ObjectClass::Default,
    }
}

/// The profile chosen for a run and where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProfile {
    /// Preset class, `None` for a custom profile
    pub class: Option<ObjectClass>,
    /// Whether the class was detected from the image
    pub detected: bool,
    pub profile: ObjectProfile,
}

/// Turn a [`ProfileSelection`] into a validated profile.
///
/// Detection runs on the colours of `image` as given, so callers should pass
/// the raw image rather than an enhanced one.
pub fn resolve_profile(
    selection: &ProfileSelection,
    image: &MaskedImage,
    config: &ClassifierConfig,
) -> Result<ResolvedProfile> {
    let resolved = match selection {
        ProfileSelection::Preset(class) => ResolvedProfile {
            class: Some(*class),
            detected: false,
            profile: class.profile(),
        },
        ProfileSelection::Detected => {
            let class = classify_object(image, config);
            info!(class = %class, "Detected object type");
            ResolvedProfile {
                class: Some(class),
                detected: true,
                profile: class.profile(),
            }
        }
        ProfileSelection::Custom(profile) => ResolvedProfile {
            class: None,
            detected: false,
            profile: profile.clone(),
        },
    };

    resolved.profile.validate()?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthify_core::{Error, Mask};
    use image::{Rgb, RgbImage};

    fn signals(color_variance: f64, edge_density: f64, shape_complexity: f64) -> ObjectSignals {
        ObjectSignals {
            color_variance,
            edge_density,
            shape_complexity,
        }
    }

    #[test]
    fn test_rule_order() {
        let config = ClassifierConfig::default();
        assert_eq!(classify_signals(&signals(1500.0, 0.2, 20.0), &config), ObjectClass::Organic);
        assert_eq!(classify_signals(&signals(1500.0, 0.2, 10.0), &config), ObjectClass::Geometric);
        assert_eq!(classify_signals(&signals(600.0, 0.03, 13.0), &config), ObjectClass::Fruit);
        assert_eq!(classify_signals(&signals(100.0, 0.01, 13.0), &config), ObjectClass::Flat);
        assert_eq!(classify_signals(&signals(100.0, 0.05, 13.0), &config), ObjectClass::Default);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let config = ClassifierConfig::default();
        // variance exactly 1000 does not qualify as organic
        assert_eq!(classify_signals(&signals(1000.0, 0.04, 20.0), &config), ObjectClass::Fruit);
        // edge density exactly 0.05 is not fruit
        assert_eq!(classify_signals(&signals(1000.0, 0.05, 20.0), &config), ObjectClass::Default);
        // edge density exactly 0.02 is not flat
        assert_eq!(classify_signals(&signals(0.0, 0.02, 13.0), &config), ObjectClass::Default);
    }

    #[test]
    fn test_uniform_disk_is_flat() {
        let rgb = RgbImage::from_pixel(20, 20, Rgb([90, 140, 60]));
        let mask = Mask::from_fn(20, 20, |x, y| {
            let dx = x as f32 - 9.5;
            let dy = y as f32 - 9.5;
            dx * dx + dy * dy < 64.0
        });
        let image = MaskedImage::new(rgb, mask).unwrap();

        let s = measure_signals(&image, &ClassifierConfig::default()).unwrap();
        assert_eq!(s.color_variance, 0.0);
        assert_eq!(s.edge_density, 0.0);
        assert!(s.shape_complexity > 3.0 && s.shape_complexity < 5.0);
        assert_eq!(classify_object(&image, &ClassifierConfig::default()), ObjectClass::Flat);
    }

    #[test]
    fn test_empty_mask_classifies_as_default() {
        let image = MaskedImage::new(RgbImage::new(4, 4), Mask::new(4, 4)).unwrap();
        assert!(measure_signals(&image, &ClassifierConfig::default()).is_none());
        assert_eq!(classify_object(&image, &ClassifierConfig::default()), ObjectClass::Default);
    }

    #[test]
    fn test_resolve_profile_variants() {
        let image = MaskedImage::new(RgbImage::from_pixel(4, 4, Rgb([10, 10, 10])), Mask::filled(4, 4)).unwrap();
        let config = ClassifierConfig::default();

        let preset = resolve_profile(&ProfileSelection::Preset(ObjectClass::Fruit), &image, &config).unwrap();
        assert_eq!(preset.class, Some(ObjectClass::Fruit));
        assert!(!preset.detected);
        assert_eq!(preset.profile.scale_z, 80.0);

        let detected = resolve_profile(&ProfileSelection::Detected, &image, &config).unwrap();
        assert!(detected.detected);
        assert_eq!(detected.class, Some(ObjectClass::Flat));

        let mut custom = ObjectProfile::default();
        custom.depth_boost = 0.0;
        let result = resolve_profile(&ProfileSelection::Custom(custom), &image, &config);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
