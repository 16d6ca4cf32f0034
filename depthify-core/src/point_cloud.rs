//! Point cloud data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A generic point cloud container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// The cloud of sampled depth pixels handed to triangulation
pub type DepthPointCloud = PointCloud<PointRecord>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IndexMut<usize> for PointCloud<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> Extend<T> for PointCloud<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

impl PointCloud<PointRecord> {
    /// Depth values in cloud order
    pub fn depths(&self) -> Vec<f32> {
        self.points.iter().map(|p| p.z).collect()
    }

    /// Vertex positions with depth multiplied by `scale_z`
    pub fn positions(&self, scale_z: f32) -> Vec<Point3f> {
        self.points.iter().map(|p| p.position(scale_z)).collect()
    }

    /// Per-point colours in cloud order
    pub fn colors(&self) -> Vec<[u8; 3]> {
        self.points.iter().map(|p| p.color).collect()
    }

    /// Mean and sample standard deviation of depth.
    ///
    /// Returns `None` for an empty cloud; the deviation is zero for a single
    /// point.
    pub fn depth_statistics(&self) -> Option<(f32, f32)> {
        if self.points.is_empty() {
            return None;
        }

        let n = self.points.len() as f64;
        let mean = self.points.iter().map(|p| p.z as f64).sum::<f64>() / n;
        if self.points.len() < 2 {
            return Some((mean as f32, 0.0));
        }

        let variance = self
            .points
            .iter()
            .map(|p| (p.z as f64 - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);

        Some((mean as f32, variance.sqrt() as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_depth_statistics_uses_sample_deviation() {
        let cloud: DepthPointCloud = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .enumerate()
            .map(|(i, &z)| PointRecord::new(i as u32, 0, z, [0, 0, 0]))
            .collect();

        let (mean, std) = cloud.depth_statistics().unwrap();
        assert_relative_eq!(mean, 2.5);
        assert_relative_eq!(std, (5.0f32 / 3.0).sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_depth_statistics_edge_cases() {
        assert!(DepthPointCloud::new().depth_statistics().is_none());

        let single = PointCloud::from_points(vec![PointRecord::new(0, 0, 0.4, [0, 0, 0])]);
        let (mean, std) = single.depth_statistics().unwrap();
        assert_relative_eq!(mean, 0.4);
        assert_eq!(std, 0.0);
    }

    #[test]
    fn test_positions_and_colors_follow_cloud_order() {
        let cloud = PointCloud::from_points(vec![
            PointRecord::new(1, 2, 0.5, [10, 20, 30]),
            PointRecord::new(3, 4, 1.0, [40, 50, 60]),
        ]);

        assert_eq!(
            cloud.positions(2.0),
            vec![Point3f::new(1.0, 2.0, 1.0), Point3f::new(3.0, 4.0, 2.0)]
        );
        assert_eq!(cloud.colors(), vec![[10, 20, 30], [40, 50, 60]]);
        assert_eq!(cloud.depths(), vec![0.5, 1.0]);
    }
}
