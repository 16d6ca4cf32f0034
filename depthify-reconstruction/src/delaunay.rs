//! Delaunay triangulation of sampled points in the image plane
//!
//! Points are triangulated on their pixel coordinates. Faces that are too
//! small, too long or too thin are discarded, unless that would leave
//! nothing, in which case the unfiltered triangulation is kept.

use depthify_core::{DepthPointCloud, Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation as _};
use tracing::{debug, warn};

/// Face quality limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceFilterConfig {
    /// Whether faces are filtered at all
    pub enabled: bool,
    /// Faces must have strictly more area than this (square pixels)
    pub min_area: f64,
    /// Every edge must be strictly shorter than this (pixels)
    pub max_edge_length: f64,
    /// Longest over shortest edge must be strictly below this
    pub max_aspect_ratio: f64,
}

impl Default for FaceFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_area: 1.0,
            max_edge_length: 50.0,
            max_aspect_ratio: 10.0,
        }
    }
}

/// Geometric measurements of one planar triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleQuality {
    pub area: f64,
    pub max_edge: f64,
    pub min_edge: f64,
    /// `max_edge / min_edge`, infinite when an edge has zero length
    pub aspect_ratio: f64,
}

impl TriangleQuality {
    pub fn measure(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Self {
        let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
        let length = |p: [f64; 2], q: [f64; 2]| ((q[0] - p[0]).powi(2) + (q[1] - p[1]).powi(2)).sqrt();
        let edges = [length(a, b), length(b, c), length(c, a)];
        let max_edge = edges.iter().copied().fold(0.0f64, f64::max);
        let min_edge = edges.iter().copied().fold(f64::INFINITY, f64::min);
        let aspect_ratio = if min_edge > 0.0 {
            max_edge / min_edge
        } else {
            f64::INFINITY
        };

        Self {
            area: cross.abs() / 2.0,
            max_edge,
            min_edge,
            aspect_ratio,
        }
    }

    /// Whether the triangle satisfies every limit of `config`
    pub fn passes(&self, config: &FaceFilterConfig) -> bool {
        self.area > config.min_area
            && self.max_edge < config.max_edge_length
            && self.aspect_ratio < config.max_aspect_ratio
    }
}

/// Faces over the point cloud plus how they were obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangulation {
    /// Vertex index triples into the triangulated cloud
    pub faces: Vec<[usize; 3]>,
    /// Number of Delaunay faces before filtering
    pub candidate_count: usize,
    /// True when filtering rejected every face and the unfiltered faces
    /// were returned instead
    pub fallback_used: bool,
}

/// A spade vertex that remembers which cloud point it came from
#[derive(Debug, Clone, Copy)]
struct IndexedVertex {
    position: Point2<f64>,
    index: usize,
}

impl HasPosition for IndexedVertex {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// 2D Delaunay triangulation of planar positions.
///
/// Returns faces as index triples into `positions`. Fails with
/// `TriangulationFailure` for fewer than three positions or when every
/// position is collinear. Coincident positions collapse onto one vertex.
pub fn delaunay_triangulation_2d(positions: &[[f64; 2]]) -> Result<Vec<[usize; 3]>> {
    if positions.len() < 3 {
        return Err(Error::TriangulationFailure(format!(
            "need at least 3 points for triangulation, got {}",
            positions.len()
        )));
    }

    let vertices: Vec<IndexedVertex> = positions
        .iter()
        .enumerate()
        .map(|(index, p)| IndexedVertex {
            position: Point2::new(p[0], p[1]),
            index,
        })
        .collect();

    let triangulation: DelaunayTriangulation<IndexedVertex> = DelaunayTriangulation::bulk_load(vertices)
        .map_err(|e| Error::TriangulationFailure(format!("failed to insert points: {:?}", e)))?;

    if triangulation.num_inner_faces() == 0 {
        return Err(Error::TriangulationFailure(
            "all points are collinear, no faces could be formed".to_string(),
        ));
    }

    Ok(triangulation
        .inner_faces()
        .map(|face| {
            let [a, b, c] = face.vertices();
            [a.data().index, b.data().index, c.data().index]
        })
        .collect())
}

/// Keep the faces that pass `config`; see [`Triangulation`] for the
/// fallback rule
pub fn filter_faces(positions: &[[f64; 2]], faces: Vec<[usize; 3]>, config: &FaceFilterConfig) -> Triangulation {
    let candidate_count = faces.len();
    if !config.enabled {
        return Triangulation {
            faces,
            candidate_count,
            fallback_used: false,
        };
    }

    let kept: Vec<[usize; 3]> = faces
        .par_iter()
        .copied()
        .filter(|&[a, b, c]| TriangleQuality::measure(positions[a], positions[b], positions[c]).passes(config))
        .collect();

    if kept.is_empty() {
        warn!(
            candidates = candidate_count,
            "Face filter rejected every triangle, keeping unfiltered faces"
        );
        return Triangulation {
            faces,
            candidate_count,
            fallback_used: true,
        };
    }

    debug!(candidates = candidate_count, kept = kept.len(), "Filtered triangles");
    Triangulation {
        faces: kept,
        candidate_count,
        fallback_used: false,
    }
}

/// Triangulates a depth point cloud on its pixel coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelaunayTriangulator {
    pub filter: FaceFilterConfig,
}

impl DelaunayTriangulator {
    pub fn new(filter: FaceFilterConfig) -> Self {
        Self { filter }
    }

    /// Triangulate `cloud` and filter the resulting faces
    pub fn triangulate(&self, cloud: &DepthPointCloud) -> Result<Triangulation> {
        let positions: Vec<[f64; 2]> = cloud.iter().map(|p| p.xy()).collect();
        let faces = delaunay_triangulation_2d(&positions)?;
        Ok(filter_faces(&positions, faces, &self.filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use depthify_core::PointRecord;
    use std::collections::HashSet;

    fn cloud_from(positions: &[(u32, u32)]) -> DepthPointCloud {
        positions
            .iter()
            .map(|&(x, y)| PointRecord::new(x, y, 0.5, [200, 100, 50]))
            .collect()
    }

    #[test]
    fn test_face_filter_config_default() {
        let config = FaceFilterConfig::default();
        assert!(config.enabled);
        assert_eq!(config.min_area, 1.0);
        assert_eq!(config.max_edge_length, 50.0);
        assert_eq!(config.max_aspect_ratio, 10.0);
    }

    #[test]
    fn test_triangle_quality_limits() {
        let config = FaceFilterConfig::default();

        // long and thin: max edge 100, aspect 100
        let sliver = TriangleQuality::measure([0.0, 0.0], [0.0, 1.0], [100.0, 0.0]);
        assert_relative_eq!(sliver.area, 50.0);
        assert!(!sliver.passes(&config));

        let h = 10.0 * 3f64.sqrt() / 2.0;
        let equilateral = TriangleQuality::measure([0.0, 0.0], [10.0, 0.0], [5.0, h]);
        assert_relative_eq!(equilateral.aspect_ratio, 1.0, epsilon = 1e-9);
        assert!(equilateral.passes(&config));

        let degenerate = TriangleQuality::measure([1.0, 1.0], [1.0, 1.0], [4.0, 5.0]);
        assert!(degenerate.aspect_ratio.is_infinite());
        assert!(!degenerate.passes(&config));
    }

    #[test]
    fn test_delaunay_triangulation_2d_simple() {
        let positions = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let faces = delaunay_triangulation_2d(&positions).unwrap();
        assert_eq!(faces.len(), 2);
        let used: HashSet<usize> = faces.iter().flatten().copied().collect();
        assert_eq!(used.len(), 4);
    }

    #[test]
    fn test_delaunay_triangulation_too_few_points() {
        let result = delaunay_triangulation_2d(&[[0.0, 0.0], [1.0, 0.0]]);
        assert!(matches!(result, Err(Error::TriangulationFailure(_))));
    }

    #[test]
    fn test_collinear_points_fail() {
        let cloud = cloud_from(&[(0, 0), (1, 0), (2, 0), (3, 0)]);
        let result = DelaunayTriangulator::default().triangulate(&cloud);
        assert!(matches!(result, Err(Error::TriangulationFailure(_))));
    }

    #[test]
    fn test_unit_grid_falls_back_to_unfiltered_faces() {
        // every face of a unit grid has area 0.5, below the minimum
        let cloud = cloud_from(&[(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        let triangulation = DelaunayTriangulator::default().triangulate(&cloud).unwrap();
        assert!(triangulation.fallback_used);
        assert_eq!(triangulation.faces.len(), triangulation.candidate_count);
        assert_eq!(triangulation.faces.len(), 4);
    }

    #[test]
    fn test_good_faces_survive_and_bad_are_dropped() {
        // a 10 px lattice plus one far point forming long edges
        let mut positions = Vec::new();
        for y in 0..4 {
            for x in 0..4 {
                positions.push((x * 10, y * 10));
            }
        }
        positions.push((200, 15));
        let cloud = cloud_from(&positions);

        let triangulation = DelaunayTriangulator::default().triangulate(&cloud).unwrap();
        assert!(!triangulation.fallback_used);
        assert!(triangulation.faces.len() < triangulation.candidate_count);
        assert!(triangulation.faces.iter().all(|face| !face.contains(&16)));
        assert_eq!(triangulation.faces.len(), 18);
    }

    #[test]
    fn test_disabled_filter_keeps_everything() {
        let cloud = cloud_from(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        let triangulator = DelaunayTriangulator::new(FaceFilterConfig {
            enabled: false,
            ..FaceFilterConfig::default()
        });
        let triangulation = triangulator.triangulate(&cloud).unwrap();
        assert!(!triangulation.fallback_used);
        assert_eq!(triangulation.faces.len(), 2);
    }
}
