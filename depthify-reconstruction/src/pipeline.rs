//! End-to-end reconstruction pipeline
//!
//! [`DepthPipeline`] turns one masked image into a colored mesh:
//!
//! ```text
//! MaskedImage ─ enhance ─ cues ─ fuse ─ sample + filter ─ triangulate ─ assemble ─ ColoredMesh
//! ```
//!
//! The stage set (cue generators, outlier filters, triangulator, smoother)
//! is assembled once from a [`PipelineConfig`]. Every stage is also exposed
//! as a method so callers can stop between stages or inspect intermediate
//! results.

use crate::assembly::assemble_mesh;
use crate::delaunay::{DelaunayTriangulator, FaceFilterConfig, Triangulation};
use crate::smoothing::SmoothingConfig;
use depthify_algorithms::{
    apply_filters, enhance_colors, estimate_cues, fuse_depth_cues, resolve_profile, sample_point_cloud,
    ClassifierConfig, CueConfig, EnhanceConfig, OutlierConfig, ResolvedProfile, SamplingConfig,
};
use depthify_core::{
    ColoredMesh, CueKind, DepthCue, DepthCueMap, DepthPointCloud, Drawable, Error, FusedDepthMap, MaskedImage,
    ObjectProfile, OutlierFilter, ProfileSelection, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration of every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub enhance: EnhanceConfig,
    pub classifier: ClassifierConfig,
    pub cues: CueConfig,
    /// Run the cue generators on the rayon pool
    pub parallel_cues: bool,
    pub sampling: SamplingConfig,
    pub outliers: OutlierConfig,
    pub face_filter: FaceFilterConfig,
    pub smoothing: SmoothingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enhance: EnhanceConfig::default(),
            classifier: ClassifierConfig::default(),
            cues: CueConfig::default(),
            parallel_cues: true,
            sampling: SamplingConfig::default(),
            outliers: OutlierConfig::default(),
            face_filter: FaceFilterConfig::default(),
            smoothing: SmoothingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Standard path plus spatial outlier rejection
    pub fn high_quality() -> Self {
        Self {
            outliers: OutlierConfig::high_quality(),
            ..Self::default()
        }
    }
}

/// Everything a pipeline run produced
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub profile: ResolvedProfile,
    pub cues: BTreeMap<CueKind, DepthCueMap>,
    pub fused: FusedDepthMap,
    pub cloud: DepthPointCloud,
    pub triangulation: Triangulation,
    pub mesh: ColoredMesh,
}

/// Single-image depth reconstruction pipeline
pub struct DepthPipeline {
    config: PipelineConfig,
    cues: Vec<Box<dyn DepthCue>>,
    filters: Vec<Box<dyn OutlierFilter>>,
    triangulator: DelaunayTriangulator,
}

impl DepthPipeline {
    /// Create a pipeline with the stage set described by `config`
    pub fn new(config: PipelineConfig) -> Self {
        let cues = config.cues.build();
        let filters = config.outliers.build();
        let triangulator = DelaunayTriangulator::new(config.face_filter.clone());
        Self {
            config,
            cues,
            filters,
            triangulator,
        }
    }

    /// Replace the cue generators
    pub fn with_cues(mut self, cues: Vec<Box<dyn DepthCue>>) -> Self {
        self.cues = cues;
        self
    }

    /// Replace the outlier filter chain
    pub fn with_filters(mut self, filters: Vec<Box<dyn OutlierFilter>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Choose the profile for `image`; detection looks at the raw colours
    pub fn resolve_profile(&self, image: &MaskedImage, selection: &ProfileSelection) -> Result<ResolvedProfile> {
        resolve_profile(selection, image, &self.config.classifier)
    }

    /// Saturation and contrast boost shared by every cue
    pub fn enhance(&self, image: &MaskedImage) -> Result<MaskedImage> {
        enhance_colors(image, &self.config.enhance)
    }

    /// Run every cue generator on the enhanced image
    pub fn estimate_cues(&self, enhanced: &MaskedImage) -> BTreeMap<CueKind, DepthCueMap> {
        let start = Instant::now();
        let cues = estimate_cues(&self.cues, enhanced, self.config.parallel_cues);
        debug!(
            cues = cues.len(),
            parallel = self.config.parallel_cues,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Estimated depth cues"
        );
        cues
    }

    /// Fuse cue maps; an all-zero result is a degenerate input
    pub fn fuse(
        &self,
        cues: &BTreeMap<CueKind, DepthCueMap>,
        profile: &ObjectProfile,
        enhanced: &MaskedImage,
    ) -> Result<FusedDepthMap> {
        let fused = fuse_depth_cues(cues, profile, enhanced.mask())?;
        if fused.is_all_zero() {
            return Err(Error::DegenerateInput("fused depth map is zero everywhere".to_string()));
        }
        Ok(fused)
    }

    /// Sample the fused map and run the outlier filter chain
    pub fn build_point_cloud(&self, fused: &FusedDepthMap, enhanced: &MaskedImage) -> Result<DepthPointCloud> {
        let sampled = sample_point_cloud(fused, enhanced, &self.config.sampling)?;
        if sampled.is_empty() {
            return Err(Error::EmptyPointCloud(format!(
                "no pixel exceeds the minimum depth of {}",
                self.config.sampling.min_depth
            )));
        }

        let sampled_count = sampled.len();
        let cloud = apply_filters(&self.filters, sampled)?;
        if cloud.is_empty() {
            return Err(Error::EmptyPointCloud(format!(
                "outlier rejection removed all {} sampled points",
                sampled_count
            )));
        }

        info!(sampled = sampled_count, kept = cloud.len(), "Built point cloud");
        Ok(cloud)
    }

    /// Delaunay triangulation with quality filtering
    pub fn triangulate(&self, cloud: &DepthPointCloud) -> Result<Triangulation> {
        let triangulation = self.triangulator.triangulate(cloud)?;
        if triangulation.fallback_used {
            warn!(
                faces = triangulation.faces.len(),
                "Quality filtering bypassed, mesh uses unfiltered triangulation"
            );
        }
        info!(
            candidates = triangulation.candidate_count,
            faces = triangulation.faces.len(),
            "Triangulated point cloud"
        );
        Ok(triangulation)
    }

    /// Scale, color and smooth the final mesh
    pub fn assemble(
        &self,
        cloud: &DepthPointCloud,
        triangulation: &Triangulation,
        profile: &ObjectProfile,
    ) -> Result<ColoredMesh> {
        let mesh = assemble_mesh(cloud, triangulation, profile.scale_z, &self.config.smoothing)?;
        let (min, max) = mesh.bounding_box();
        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            watertight = mesh.is_watertight(),
            depth_range = max.z - min.z,
            "Mesh created"
        );
        Ok(mesh)
    }

    /// Run every stage on `image`
    pub fn run(&self, image: &MaskedImage, selection: &ProfileSelection) -> Result<Reconstruction> {
        if image.mask().is_empty() {
            return Err(Error::DegenerateInput("mask has no foreground pixels".to_string()));
        }

        let profile = self.resolve_profile(image, selection)?;
        info!(
            profile = %profile.profile.name,
            detected = profile.detected,
            width = image.width(),
            height = image.height(),
            foreground = image.mask().count(),
            "Starting reconstruction"
        );

        let enhanced = self.enhance(image)?;
        let cues = self.estimate_cues(&enhanced);
        let fused = self.fuse(&cues, &profile.profile, &enhanced)?;
        let cloud = self.build_point_cloud(&fused, &enhanced)?;
        let triangulation = self.triangulate(&cloud)?;
        let mesh = self.assemble(&cloud, &triangulation, &profile.profile)?;

        Ok(Reconstruction {
            profile,
            cues,
            fused,
            cloud,
            triangulation,
            mesh,
        })
    }
}

impl Default for DepthPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
