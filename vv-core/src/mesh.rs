//! Mesh data structures and functionality

use crate::attributes::{PointAttribute, PointData, NORMALS};
use crate::point::*;
use crate::Result;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices, faces and named per-point attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<Face>,
    pub point_data: PointData,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<Face>) -> Self {
        Self {
            vertices,
            faces,
            point_data: PointData::new(),
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

    /// Check if the mesh has no points or no faces
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Attach a per-point attribute; arrays whose length differs from the
    /// point count are refused
    pub fn add_attribute(&mut self, attribute: PointAttribute) -> Result<()> {
        let count = self.vertices.len();
        self.point_data.insert(attribute, count)
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&PointAttribute> {
        self.point_data.get(name)
    }

    /// Vertex normals, if a three-component `Normals` attribute is present
    pub fn normals(&self) -> Option<Vec<Vector3f>> {
        self.attribute(NORMALS).and_then(|a| a.as_vectors())
    }

    /// Whether every face references an existing point
    pub fn has_valid_faces(&self) -> bool {
        let n = self.vertices.len();
        self.faces.iter().all(|f| f.iter().all(|&i| i < n))
    }

    /// Drop faces referencing points outside `[0, vertex_count)`.
    /// Returns the number of faces removed.
    pub fn retain_valid_faces(&mut self) -> usize {
        let n = self.vertices.len();
        let before = self.faces.len();
        self.faces.retain(|f| f.iter().all(|&i| i < n));
        before - self.faces.len()
    }

    /// Area-weighted vertex normals accumulated from the faces.
    ///
    /// Faces must be valid (see [`retain_valid_faces`](Self::retain_valid_faces)).
    pub fn compute_vertex_normals(&self) -> Vec<Vector3f> {
        let mut normals = vec![Vector3f::zeros(); self.vertices.len()];
        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];
            let weighted = (v1 - v0).cross(&(v2 - v0));
            for &i in face {
                normals[i] += weighted;
            }
        }
        normals
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(|| Vector3f::new(0.0, 0.0, 1.0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_retain_valid_faces() {
        let mut mesh = quad();
        mesh.faces.push([0, 3, 4]);
        assert!(!mesh.has_valid_faces());
        assert_eq!(mesh.retain_valid_faces(), 1);
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.has_valid_faces());
    }

    #[test]
    fn test_attribute_length_mismatch_is_dropped() {
        let mut mesh = quad();
        assert!(mesh.add_attribute(PointAttribute::scalars("t", vec![1.0; 3])).is_err());
        assert!(mesh.attribute("t").is_none());
        mesh.add_attribute(PointAttribute::scalars("t", vec![1.0; 4])).unwrap();
        assert_eq!(mesh.attribute("t").unwrap().tuple_count(), 4);
    }

    #[test]
    fn test_normals_roundtrip_through_attribute() {
        let mut mesh = quad();
        let up = vec![Vector3f::new(0.0, 0.0, 1.0); 4];
        mesh.add_attribute(PointAttribute::vectors(NORMALS, &up)).unwrap();
        assert_eq!(mesh.normals().unwrap(), up);
        assert!(mesh.add_attribute(PointAttribute::vectors(NORMALS, &up[..2])).is_err());
    }

    #[test]
    fn test_vertex_normals_of_planar_quad() {
        let mesh = quad();
        for n in mesh.compute_vertex_normals() {
            assert_relative_eq!(n, Vector3f::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = TriangleMesh::new();
        assert!(mesh.is_empty());
        assert!(mesh.has_valid_faces());
        assert!(mesh.compute_vertex_normals().is_empty());
    }
}
