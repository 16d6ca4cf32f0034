//! Outlier rejection for sampled depth points
//!
//! Every filter keeps the surviving points in their original order. The
//! [`OutlierFilter`] implementations wrap the free functions so the pipeline
//! can chain them.

use crate::nearest_neighbor::PixelIndex;
use crate::stats::{percentile, quantile};
use depthify_core::{DepthPointCloud, Error, NearestNeighborSearch, OutlierFilter, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Depth deviation outlier removal
///
/// Keeps points whose depth lies strictly within `std_multiplier` sample
/// standard deviations of the mean depth. Clouds with fewer than two points
/// or with no depth spread are returned unchanged.
///
/// # Arguments
/// * `cloud` - Input point cloud
/// * `std_multiplier` - Width of the accepted band in standard deviations
///
/// # Returns
/// * `Result<DepthPointCloud>` - Filtered point cloud with outliers removed
///
/// # Example
/// ```rust
/// use depthify_core::{DepthPointCloud, PointRecord};
/// use depthify_algorithms::depth_outlier_removal;
///
/// fn main() -> depthify_core::Result<()> {
///     let mut cloud: DepthPointCloud = (0..20)
///         .map(|i| PointRecord::new(i, 0, 0.5, [255, 255, 255]))
///         .collect();
///     cloud.push(PointRecord::new(20, 0, 50.0, [255, 255, 255])); // outlier
///
///     let filtered = depth_outlier_removal(&cloud, 3.0)?;
///     assert_eq!(filtered.len(), 20);
///     Ok(())
/// }
/// ```
pub fn depth_outlier_removal(cloud: &DepthPointCloud, std_multiplier: f32) -> Result<DepthPointCloud> {
    if !(std_multiplier > 0.0) {
        return Err(Error::InvalidData("std_multiplier must be positive".to_string()));
    }

    let (mean, std_dev) = match cloud.depth_statistics() {
        Some(stats) if cloud.len() >= 2 => stats,
        _ => return Ok(cloud.clone()),
    };
    if !(std_dev > 0.0) {
        return Ok(cloud.clone());
    }

    let limit = std_multiplier * std_dev;
    Ok(cloud
        .iter()
        .filter(|p| (p.z - mean).abs() < limit)
        .copied()
        .collect())
}

/// Keep points whose depth lies between two quantiles of the depth
/// distribution (inclusive, linear interpolation)
pub fn depth_quantile_filter(cloud: &DepthPointCloud, lower: f64, upper: f64) -> Result<DepthPointCloud> {
    if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower > upper {
        return Err(Error::InvalidData(format!(
            "quantile bounds must satisfy 0 <= lower <= upper <= 1, got {} and {}",
            lower, upper
        )));
    }

    let depths = cloud.depths();
    let (low, high) = match (quantile(&depths, lower), quantile(&depths, upper)) {
        (Some(low), Some(high)) => (low, high),
        _ => return Ok(DepthPointCloud::new()),
    };

    Ok(cloud
        .iter()
        .filter(|p| p.z >= low && p.z <= high)
        .copied()
        .collect())
}

/// Parameters of the spatial isolation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialOutlierConfig {
    pub lower_quantile: f64,
    pub upper_quantile: f64,
    /// Density rejection only runs on clouds larger than this
    pub min_points: usize,
    /// Upper bound on the number of points indexed for neighbour queries
    pub sample_size: usize,
    pub k_neighbors: usize,
    /// Points whose mean neighbour distance exceeds this percentile are dropped
    pub distance_percentile: f64,
    pub seed: u64,
}

impl Default for SpatialOutlierConfig {
    fn default() -> Self {
        Self {
            lower_quantile: 0.01,
            upper_quantile: 0.99,
            min_points: 1000,
            sample_size: 5000,
            k_neighbors: 10,
            distance_percentile: 95.0,
            seed: 42,
        }
    }
}

/// Neighbour distance outlier removal
///
/// Indexes a seeded random sample of the cloud in the image plane, computes
/// for every point the mean distance to its nearest sampled neighbours and
/// drops points above the configured percentile of that distance. Clouds of
/// at most `min_points` points are returned unchanged.
///
/// # Arguments
/// * `cloud` - Input point cloud
/// * `config` - Sampling and threshold parameters
///
/// # Returns
/// * `Result<DepthPointCloud>` - Filtered point cloud with isolated points removed
pub fn neighbor_distance_outlier_removal(
    cloud: &DepthPointCloud,
    config: &SpatialOutlierConfig,
) -> Result<DepthPointCloud> {
    if config.k_neighbors == 0 {
        return Err(Error::InvalidData("k_neighbors must be greater than 0".to_string()));
    }
    if config.sample_size == 0 {
        return Err(Error::InvalidData("sample_size must be greater than 0".to_string()));
    }
    if cloud.len() <= config.min_points {
        return Ok(cloud.clone());
    }

    let sample_count = config.sample_size.min(cloud.len());
    let mut rng = StdRng::seed_from_u64(config.seed);
    let sampled: Vec<[f64; 2]> = rand::seq::index::sample(&mut rng, cloud.len(), sample_count)
        .into_iter()
        .map(|idx| cloud[idx].xy())
        .collect();

    let index = PixelIndex::new(&sampled);
    let k = config.k_neighbors.min(sample_count);

    // Compute mean distances for all points
    let mean_distances: Vec<f32> = cloud
        .points
        .par_iter()
        .map(|point| {
            let neighbors = index.find_k_nearest(&point.xy(), k);
            if neighbors.is_empty() {
                return 0.0;
            }
            (neighbors.iter().map(|(_, d)| d).sum::<f64>() / neighbors.len() as f64) as f32
        })
        .collect();

    let threshold = match percentile(&mean_distances, config.distance_percentile) {
        Some(threshold) => threshold,
        None => return Ok(cloud.clone()),
    };

    Ok(cloud
        .iter()
        .zip(&mean_distances)
        .filter(|(_, &mean_distance)| mean_distance <= threshold)
        .map(|(point, _)| *point)
        .collect())
}

/// Quantile trimming followed by neighbour distance rejection
pub fn spatial_outlier_removal(cloud: &DepthPointCloud, config: &SpatialOutlierConfig) -> Result<DepthPointCloud> {
    let trimmed = depth_quantile_filter(cloud, config.lower_quantile, config.upper_quantile)?;
    neighbor_distance_outlier_removal(&trimmed, config)
}

/// [`depth_outlier_removal`] as a pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub struct DepthOutlierFilter {
    pub std_multiplier: f32,
}

impl Default for DepthOutlierFilter {
    fn default() -> Self {
        Self { std_multiplier: 3.0 }
    }
}

impl OutlierFilter for DepthOutlierFilter {
    fn name(&self) -> &'static str {
        "depth_deviation"
    }

    fn filter(&self, cloud: &DepthPointCloud) -> Result<DepthPointCloud> {
        depth_outlier_removal(cloud, self.std_multiplier)
    }
}

/// [`spatial_outlier_removal`] as a pipeline stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialOutlierFilter {
    pub config: SpatialOutlierConfig,
}

impl OutlierFilter for SpatialOutlierFilter {
    fn name(&self) -> &'static str {
        "spatial"
    }

    fn filter(&self, cloud: &DepthPointCloud) -> Result<DepthPointCloud> {
        spatial_outlier_removal(cloud, &self.config)
    }
}

/// Which outlier stages run, in order: depth deviation, then spatial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Multiplier of the depth deviation stage; `None` disables it
    pub depth_std_multiplier: Option<f32>,
    /// Spatial stage parameters; `None` disables it
    pub spatial: Option<SpatialOutlierConfig>,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            depth_std_multiplier: Some(3.0),
            spatial: None,
        }
    }
}

impl OutlierConfig {
    /// Both stages enabled with default parameters
    pub fn high_quality() -> Self {
        Self {
            spatial: Some(SpatialOutlierConfig::default()),
            ..Self::default()
        }
    }

    /// Instantiate the configured filter chain
    pub fn build(&self) -> Vec<Box<dyn OutlierFilter>> {
        let mut filters: Vec<Box<dyn OutlierFilter>> = Vec::new();
        if let Some(std_multiplier) = self.depth_std_multiplier {
            filters.push(Box::new(DepthOutlierFilter { std_multiplier }));
        }
        if let Some(config) = &self.spatial {
            filters.push(Box::new(SpatialOutlierFilter { config: config.clone() }));
        }
        filters
    }
}

/// Run `filters` in order, logging how many points each stage removed
pub fn apply_filters(filters: &[Box<dyn OutlierFilter>], cloud: DepthPointCloud) -> Result<DepthPointCloud> {
    filters.iter().try_fold(cloud, |cloud, filter| {
        let filtered = filter.filter(&cloud)?;
        debug!(
            filter = filter.name(),
            before = cloud.len(),
            after = filtered.len(),
            "Applied outlier filter"
        );
        Ok(filtered)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthify_core::PointRecord;
    use rand::Rng;

    fn gaussian_samples(n: usize, seed: u64) -> Vec<f32> {
        // Box-Muller
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = rng.gen();
                ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
            })
            .collect()
    }

    fn cloud_from_depths(depths: &[f32]) -> DepthPointCloud {
        depths
            .iter()
            .enumerate()
            .map(|(i, &z)| PointRecord::new(i as u32, 0, z, [255, 255, 255]))
            .collect()
    }

    fn grid_cloud(n: u32) -> DepthPointCloud {
        (0..n * n)
            .map(|i| PointRecord::new(i % n, i / n, 0.5, [128, 128, 128]))
            .collect()
    }

    #[test]
    fn test_depth_outlier_removal_empty_cloud() {
        let cloud = DepthPointCloud::new();
        let result = depth_outlier_removal(&cloud, 3.0);
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_depth_outlier_removal_single_point() {
        let cloud = cloud_from_depths(&[0.7]);
        let filtered = depth_outlier_removal(&cloud, 3.0).unwrap();
        assert_eq!(filtered, cloud);
    }

    #[test]
    fn test_depth_outlier_removal_with_outliers() {
        let mut depths = gaussian_samples(100, 7);
        depths.extend([100.0; 5]);
        let cloud = cloud_from_depths(&depths);

        let filtered = depth_outlier_removal(&cloud, 3.0).unwrap();
        assert_eq!(filtered.len(), 100);
        assert!(filtered.iter().all(|p| p.z < 100.0));
        // survivors keep their original order
        assert!(filtered.points.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn test_depth_outlier_removal_constant_depth() {
        let cloud = cloud_from_depths(&[0.5; 10]);
        let filtered = depth_outlier_removal(&cloud, 3.0).unwrap();
        assert_eq!(filtered.len(), 10);
    }

    #[test]
    fn test_depth_outlier_removal_invalid_multiplier() {
        let cloud = cloud_from_depths(&[0.1, 0.2]);
        assert!(depth_outlier_removal(&cloud, 0.0).is_err());
        assert!(depth_outlier_removal(&cloud, f32::NAN).is_err());
    }

    #[test]
    fn test_quantile_filter_trims_extremes() {
        let depths: Vec<f32> = (0..=100).map(|i| i as f32 / 100.0).collect();
        let cloud = cloud_from_depths(&depths);
        let filtered = depth_quantile_filter(&cloud, 0.01, 0.99).unwrap();
        assert_eq!(filtered.len(), 99);
        assert!(filtered.iter().all(|p| p.z >= 0.01 && p.z <= 0.99));
    }

    #[test]
    fn test_quantile_filter_invalid_bounds() {
        let cloud = cloud_from_depths(&[0.1, 0.2]);
        assert!(depth_quantile_filter(&cloud, 0.9, 0.1).is_err());
        assert!(depth_quantile_filter(&cloud, -0.1, 0.5).is_err());
    }

    #[test]
    fn test_neighbor_distance_removal_drops_isolated_points() {
        let mut cloud = grid_cloud(40);
        let stray = [(400, 400), (520, 90), (90, 610)];
        for &(x, y) in &stray {
            cloud.push(PointRecord::new(x, y, 0.5, [0, 0, 0]));
        }

        let filtered = neighbor_distance_outlier_removal(&cloud, &SpatialOutlierConfig::default()).unwrap();
        for &(x, y) in &stray {
            assert!(!filtered.iter().any(|p| p.x == x && p.y == y));
        }
        // the threshold is a percentile, so some grid points go too
        assert!(filtered.len() >= 1500);
    }

    #[test]
    fn test_neighbor_distance_removal_is_deterministic() {
        let cloud = grid_cloud(40);
        let config = SpatialOutlierConfig {
            sample_size: 300,
            ..SpatialOutlierConfig::default()
        };
        let a = neighbor_distance_outlier_removal(&cloud, &config).unwrap();
        let b = neighbor_distance_outlier_removal(&cloud, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_clouds_skip_density_stage() {
        let cloud = grid_cloud(10);
        let filtered = neighbor_distance_outlier_removal(&cloud, &SpatialOutlierConfig::default()).unwrap();
        assert_eq!(filtered, cloud);
    }

    #[test]
    fn test_neighbor_distance_removal_invalid_parameters() {
        let cloud = grid_cloud(3);
        let config = SpatialOutlierConfig {
            k_neighbors: 0,
            ..SpatialOutlierConfig::default()
        };
        assert!(neighbor_distance_outlier_removal(&cloud, &config).is_err());
    }

    #[test]
    fn test_filter_chain_order_and_names() {
        let filters = OutlierConfig::high_quality().build();
        let names: Vec<&str> = filters.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["depth_deviation", "spatial"]);
        assert_eq!(OutlierConfig::default().build().len(), 1);

        let mut depths = vec![0.5; 50];
        depths.push(40.0);
        let filtered = apply_filters(&filters, cloud_from_depths(&depths)).unwrap();
        assert!(filtered.iter().all(|p| p.z < 1.0));
    }
}
