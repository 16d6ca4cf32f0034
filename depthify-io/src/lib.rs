//! I/O for depthify
//!
//! This crate owns the file formats at the edges of the pipeline: the
//! segmented RGBA image that goes in, and the point table and mesh dump that
//! come out.

pub mod image_input;
pub mod point_table;
pub mod mesh_json;

pub use image_input::*;
pub use mesh_json::*;
pub use point_table::{Column, PointTableReader, PointTableWriter};

use depthify_core::{ColoredMesh, DepthPointCloud, Error, Result};
use std::path::Path;

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(str::to_lowercase)
}

/// Auto-detect format and read a point cloud
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<DepthPointCloud> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("csv") => PointTableReader::read_file(path),
        _ => Err(Error::InvalidData(format!(
            "Unsupported point cloud format: {:?}",
            path.extension()
        ))),
    }
}

/// Auto-detect format and write a point cloud
pub fn write_point_cloud<P: AsRef<Path>>(cloud: &DepthPointCloud, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("csv") => PointTableWriter::write_file(cloud, path),
        _ => Err(Error::InvalidData(format!(
            "Unsupported point cloud format: {:?}",
            path.extension()
        ))),
    }
}

/// Auto-detect format and write a mesh
pub fn write_mesh<P: AsRef<Path>>(mesh: &ColoredMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("json") => write_mesh_json_file(mesh, path),
        _ => Err(Error::InvalidData(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthify_core::PointRecord;

    #[test]
    fn test_unsupported_extensions() {
        let cloud = DepthPointCloud::from_points(vec![PointRecord::new(0, 0, 0.5, [1, 2, 3])]);
        assert!(matches!(write_point_cloud(&cloud, "points.ply"), Err(Error::InvalidData(_))));
        assert!(matches!(read_point_cloud("points"), Err(Error::InvalidData(_))));
        assert!(matches!(write_mesh(&ColoredMesh::new(), "mesh.obj"), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_dispatch_by_extension() {
        let path = std::env::temp_dir().join("depthify_io_dispatch.CSV");
        let cloud = DepthPointCloud::from_points(vec![PointRecord::new(5, 6, 0.5, [1, 2, 3])]);
        write_point_cloud(&cloud, &path).unwrap();
        assert_eq!(read_point_cloud(&path).unwrap(), cloud);
        std::fs::remove_file(&path).unwrap();
    }
}
