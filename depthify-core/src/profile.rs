//! Object profiles
//!
//! A profile bundles the fusion weights and geometric scaling tuned for one
//! object category. Profiles come from a fixed preset table, from automatic
//! classification, or directly from the caller.

use crate::depth::CueKind;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Object categories with a preset profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Fruit,
    Geometric,
    Organic,
    Flat,
    Default,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 5] = [
        ObjectClass::Fruit,
        ObjectClass::Geometric,
        ObjectClass::Organic,
        ObjectClass::Flat,
        ObjectClass::Default,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ObjectClass::Fruit => "fruit",
            ObjectClass::Geometric => "geometric",
            ObjectClass::Organic => "organic",
            ObjectClass::Flat => "flat",
            ObjectClass::Default => "default",
        }
    }

    /// Lenient lookup: unknown labels map to [`ObjectClass::Default`]
    pub fn from_label_or_default(label: &str) -> Self {
        label.parse().unwrap_or(ObjectClass::Default)
    }

    /// The preset profile for this class
    pub fn profile(&self) -> ObjectProfile {
        let (scale_z, smooth_sigma, depth_boost, gradient_strength, weights) = match self {
            ObjectClass::Default => (60.0, 1.5, 1.3, 0.6, [0.35, 0.25, 0.25, 0.15]),
            ObjectClass::Fruit => (80.0, 2.0, 1.5, 0.7, [0.4, 0.3, 0.2, 0.1]),
            ObjectClass::Geometric => (40.0, 0.8, 1.1, 0.4, [0.5, 0.2, 0.2, 0.1]),
            ObjectClass::Organic => (70.0, 2.2, 1.4, 0.65, [0.3, 0.3, 0.25, 0.15]),
            ObjectClass::Flat => (25.0, 1.0, 1.0, 0.3, [0.6, 0.15, 0.15, 0.1]),
        };

        ObjectProfile {
            name: self.label().to_string(),
            scale_z,
            smooth_sigma,
            depth_boost,
            gradient_strength,
            cue_weights: CueKind::ALL.into_iter().zip(weights).collect(),
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ObjectClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        ObjectClass::ALL
            .iter()
            .copied()
            .find(|class| class.label() == needle)
            .ok_or_else(|| Error::InvalidData(format!("unknown object type '{}'", s)))
    }
}

/// Fusion weights and scaling parameters for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProfile {
    pub name: String,
    /// Multiplier applied to depth when building mesh vertices
    pub scale_z: f32,
    /// Gaussian sigma applied to the weighted cue sum
    pub smooth_sigma: f32,
    /// Fused depth is raised to `1 / depth_boost`
    pub depth_boost: f32,
    /// Carried for downstream consumers; the core does not read it
    pub gradient_strength: f32,
    pub cue_weights: BTreeMap<CueKind, f32>,
}

impl Default for ObjectProfile {
    fn default() -> Self {
        ObjectClass::Default.profile()
    }
}

impl ObjectProfile {
    /// Weight of `kind`, zero when the profile does not mention it
    pub fn weight(&self, kind: CueKind) -> f32 {
        self.cue_weights.get(&kind).copied().unwrap_or(0.0)
    }

    /// Sum of all cue weights
    pub fn total_weight(&self) -> f32 {
        self.cue_weights.values().sum()
    }

    /// Check the numeric invariants of the profile
    pub fn validate(&self) -> Result<()> {
        for (kind, weight) in &self.cue_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(Error::InvalidData(format!(
                    "profile '{}': weight for {} must be a non-negative number, got {}",
                    self.name, kind, weight
                )));
            }
        }

        if !self.depth_boost.is_finite() || self.depth_boost <= 0.0 {
            return Err(Error::InvalidData(format!(
                "profile '{}': depth_boost must be positive, got {}",
                self.name, self.depth_boost
            )));
        }

        if !self.smooth_sigma.is_finite() || self.smooth_sigma < 0.0 {
            return Err(Error::InvalidData(format!(
                "profile '{}': smooth_sigma must be non-negative, got {}",
                self.name, self.smooth_sigma
            )));
        }

        if !self.scale_z.is_finite() {
            return Err(Error::InvalidData(format!(
                "profile '{}': scale_z must be finite",
                self.name
            )));
        }

        Ok(())
    }
}

/// How the profile for a run is chosen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSelection {
    /// Use the preset of a known class
    Preset(ObjectClass),
    /// Classify the image and use the matching preset
    Detected,
    /// Caller-supplied profile
    Custom(ObjectProfile),
}

impl Default for ProfileSelection {
    fn default() -> Self {
        ProfileSelection::Detected
    }
}

impl ProfileSelection {
    /// Parse a command-line style label: `auto` selects detection, anything
    /// else is looked up in the preset table and falls back to `default`.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("auto") {
            ProfileSelection::Detected
        } else {
            ProfileSelection::Preset(ObjectClass::from_label_or_default(label))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_presets_are_valid_and_cover_every_cue() {
        for class in ObjectClass::ALL {
            let profile = class.profile();
            assert!(profile.validate().is_ok(), "{} preset invalid", class);
            assert_eq!(profile.cue_weights.len(), CueKind::ALL.len());
            assert_relative_eq!(profile.total_weight(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_default_preset_values() {
        let profile = ObjectProfile::default();
        assert_eq!(profile.name, "default");
        assert_eq!(profile.scale_z, 60.0);
        assert_eq!(profile.smooth_sigma, 1.5);
        assert_eq!(profile.depth_boost, 1.3);
        assert_eq!(profile.weight(CueKind::ShapeContour), 0.35);
        assert_eq!(profile.weight(CueKind::TextureDepth), 0.15);
    }

    #[test]
    fn test_missing_weight_is_zero() {
        let mut profile = ObjectClass::Flat.profile();
        profile.cue_weights.remove(&CueKind::EdgeEnhanced);
        assert_eq!(profile.weight(CueKind::EdgeEnhanced), 0.0);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_profiles() {
        let mut profile = ObjectProfile::default();
        profile.cue_weights.insert(CueKind::RadialGradient, -0.1);
        assert!(profile.validate().is_err());

        let mut profile = ObjectProfile::default();
        profile.depth_boost = 0.0;
        assert!(profile.validate().is_err());

        let mut profile = ObjectProfile::default();
        profile.smooth_sigma = f32::NAN;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!("Fruit".parse::<ObjectClass>().unwrap(), ObjectClass::Fruit);
        assert!("banana".parse::<ObjectClass>().is_err());
        assert_eq!(ObjectClass::from_label_or_default("banana"), ObjectClass::Default);

        assert_eq!(ProfileSelection::from_label("auto"), ProfileSelection::Detected);
        assert_eq!(
            ProfileSelection::from_label("organic"),
            ProfileSelection::Preset(ObjectClass::Organic)
        );
        assert_eq!(
            ProfileSelection::from_label("spaceship"),
            ProfileSelection::Preset(ObjectClass::Default)
        );
    }
}
