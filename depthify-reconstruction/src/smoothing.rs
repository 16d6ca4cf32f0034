//! Laplacian mesh smoothing.
//!
//! Each vertex moves toward the centroid of its edge neighbours:
//!
//! ```text
//! v_new = v + lambda * (centroid(N(v)) - v)
//! ```
//!
//! Faces and colours are never touched.

use depthify_core::{ColoredMesh, Point3f, Vector3f};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Smoothing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub iterations: u32,
    /// Fraction of the way each vertex moves toward its neighbour centroid
    pub lambda: f32,
    /// Hold vertices on open edges in place
    pub preserve_boundaries: bool,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            lambda: 0.5,
            preserve_boundaries: true,
        }
    }
}

/// Result of smoothing a mesh
#[derive(Debug, Clone)]
pub struct SmoothingResult {
    pub mesh: ColoredMesh,
    pub iterations_performed: u32,
    /// Largest single vertex displacement across all iterations
    pub max_displacement: f32,
}

/// Sorted neighbour lists, one per vertex
fn vertex_neighbors(mesh: &ColoredMesh) -> Vec<Vec<usize>> {
    let mut neighbors = vec![BTreeSet::new(); mesh.vertex_count()];
    for face in &mesh.faces {
        for i in 0..3 {
            let v = face[i];
            neighbors[v].insert(face[(i + 1) % 3]);
            neighbors[v].insert(face[(i + 2) % 3]);
        }
    }
    neighbors.into_iter().map(|set| set.into_iter().collect()).collect()
}

/// Vertices on an edge used by exactly one face
pub fn boundary_vertices(mesh: &ColoredMesh) -> HashSet<usize> {
    mesh.edge_face_counts()
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .flat_map(|((a, b), _)| [a, b])
        .collect()
}

/// Applies one iteration of Laplacian smoothing in place and returns the
/// largest displacement
fn smooth_once(mesh: &mut ColoredMesh, neighbors: &[Vec<usize>], fixed: &HashSet<usize>, lambda: f32) -> f32 {
    let displacements: Vec<Vector3f> = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(i, vertex)| {
            if fixed.contains(&i) || neighbors[i].is_empty() {
                return Vector3f::zeros();
            }
            let sum: Vector3f = neighbors[i].iter().map(|&n| mesh.vertices[n].coords).sum();
            let centroid = sum / neighbors[i].len() as f32;
            (centroid - vertex.coords) * lambda
        })
        .collect();

    let mut max_displacement = 0.0f32;
    for (vertex, displacement) in mesh.vertices.iter_mut().zip(&displacements) {
        max_displacement = max_displacement.max(displacement.norm());
        *vertex = Point3f::from(vertex.coords + displacement);
    }
    max_displacement
}

/// Smooth `mesh` with `config`
pub fn smooth_laplacian(mesh: &ColoredMesh, config: &SmoothingConfig) -> SmoothingResult {
    let mut result = mesh.clone();
    if mesh.is_empty() || config.iterations == 0 {
        return SmoothingResult {
            mesh: result,
            iterations_performed: 0,
            max_displacement: 0.0,
        };
    }

    let neighbors = vertex_neighbors(mesh);
    let fixed = if config.preserve_boundaries {
        boundary_vertices(mesh)
    } else {
        HashSet::new()
    };

    let mut max_displacement = 0.0f32;
    for _ in 0..config.iterations {
        max_displacement = max_displacement.max(smooth_once(&mut result, &neighbors, &fixed, config.lambda));
    }

    SmoothingResult {
        mesh: result,
        iterations_performed: config.iterations,
        max_displacement,
    }
}
