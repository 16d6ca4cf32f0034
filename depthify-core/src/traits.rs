//! Core traits for depthify

use crate::{depth::*, masked_image::MaskedImage, mesh::*, point::*, point_cloud::*, Result};

/// Trait for nearest neighbor search over planar pixel positions
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point
    fn find_k_nearest(&self, query: &[f64; 2], k: usize) -> Vec<(usize, f64)>;
}

/// A depth cue generator.
///
/// Implementations are pure functions of the (already enhanced) image and
/// must return values in `[0, 1]`, with exactly zero outside the mask.
pub trait DepthCue: Send + Sync {
    /// Which registered cue this generator produces
    fn kind(&self) -> CueKind;

    /// Estimate the cue over the image domain
    fn estimate(&self, image: &MaskedImage) -> DepthCueMap;
}

/// One outlier rejection stage applied to sampled points
pub trait OutlierFilter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Return the points that survive this stage, preserving order
    fn filter(&self, cloud: &DepthPointCloud) -> Result<DepthPointCloud>;
}

/// Trait for objects with a spatial extent
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);
}

fn bounds_of<I>(mut points: I) -> (Point3f, Point3f)
where
    I: Iterator<Item = Point3f>,
{
    let first = match points.next() {
        Some(p) => p,
        None => return (Point3f::origin(), Point3f::origin()),
    };

    points.fold((first, first), |(mut min, mut max), p| {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);

        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
        (min, max)
    })
}

impl Drawable for DepthPointCloud {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(self.points.iter().map(|p| p.position(1.0)))
    }
}

impl Drawable for ColoredMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(self.vertices.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_of_empty_mesh_is_origin() {
        let (min, max) = ColoredMesh::new().bounding_box();
        assert_eq!(min, Point3f::origin());
        assert_eq!(max, Point3f::origin());
    }

    #[test]
    fn test_cloud_bounding_box() {
        let cloud = PointCloud::from_points(vec![
            PointRecord::new(0, 4, 0.2, [0, 0, 0]),
            PointRecord::new(6, 2, 0.8, [0, 0, 0]),
        ]);
        let (min, max) = cloud.bounding_box();
        assert_eq!(min, Point3f::new(0.0, 2.0, 0.2));
        assert_eq!(max, Point3f::new(6.0, 4.0, 0.8));
    }
}
