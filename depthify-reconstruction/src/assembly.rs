//! Building the final colored mesh from points and faces

use crate::delaunay::Triangulation;
use crate::smoothing::{smooth_laplacian, SmoothingConfig};
use depthify_core::{ColoredMesh, DepthPointCloud, Error, Result};
use tracing::debug;

/// Combine a point cloud and its triangulation into a [`ColoredMesh`].
///
/// Vertex `i` is point `i` with its depth multiplied by `scale_z`, and keeps
/// the point's colour. The mesh is then smoothed with `smoothing`; pass
/// zero iterations to skip that step.
pub fn assemble_mesh(
    cloud: &DepthPointCloud,
    triangulation: &Triangulation,
    scale_z: f32,
    smoothing: &SmoothingConfig,
) -> Result<ColoredMesh> {
    if let Some(face) = triangulation
        .faces
        .iter()
        .find(|face| face.iter().any(|&i| i >= cloud.len()))
    {
        return Err(Error::InvalidData(format!(
            "face {:?} references a vertex outside the {} point cloud",
            face,
            cloud.len()
        )));
    }

    let mesh = ColoredMesh::from_parts(cloud.positions(scale_z), cloud.colors(), triangulation.faces.clone());
    let smoothed = smooth_laplacian(&mesh, smoothing);
    debug!(
        vertices = smoothed.mesh.vertex_count(),
        faces = smoothed.mesh.face_count(),
        max_displacement = smoothed.max_displacement,
        "Assembled mesh"
    );
    Ok(smoothed.mesh)
}
