//! Mesh data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A triangle mesh with one colour per vertex.
///
/// This is the terminal artifact of reconstruction: vertex positions are
/// already scaled in z, faces index into `vertices` and `colors` is
/// parallel to `vertices`. No watertightness or manifoldness is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoredMesh {
    pub vertices: Vec<Point3f>,
    pub colors: Vec<[u8; 3]>,
    pub faces: Vec<[usize; 3]>,
}

impl ColoredMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            colors: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices, colours and faces
    pub fn from_parts(vertices: Vec<Point3f>, colors: Vec<[u8; 3]>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            colors,
            faces,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Count how many faces use each undirected edge
    pub fn edge_face_counts(&self) -> HashMap<(usize, usize), usize> {
        let mut counts = HashMap::new();
        for face in &self.faces {
            for i in 0..3 {
                let a = face[i];
                let b = face[(i + 1) % 3];
                let key = if a < b { (a, b) } else { (b, a) };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Every edge borders exactly two faces
    pub fn is_watertight(&self) -> bool {
        !self.faces.is_empty() && self.edge_face_counts().values().all(|&count| count == 2)
    }

    /// Check that every face references an existing vertex and that colours
    /// line up with vertices
    pub fn is_consistent(&self) -> bool {
        self.colors.len() == self.vertices.len()
            && self
                .faces
                .iter()
                .all(|face| face.iter().all(|&i| i < self.vertices.len()))
    }
}

impl Default for ColoredMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> ColoredMesh {
        ColoredMesh::from_parts(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[255, 0, 0]; 4],
            vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
        )
    }

    #[test]
    fn test_closed_surface_is_watertight() {
        let mesh = tetrahedron();
        assert!(mesh.is_watertight());
        assert!(mesh.is_consistent());
        assert_eq!(mesh.edge_face_counts().len(), 6);
    }

    #[test]
    fn test_open_surface_is_not_watertight() {
        let mut mesh = tetrahedron();
        mesh.faces.pop();
        assert!(!mesh.is_watertight());
        assert!(!ColoredMesh::new().is_watertight());
    }
}
