//! Plain mesh data holder.

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};

/// Vertex positions, optional triangle faces and an optional per-vertex
/// normal attribute.
///
/// This is deliberately not a topological mesh: faces are stored exactly as
/// given and no adjacency is built. Loaders fill `positions` and `faces`;
/// transforms such as [`GenerateMeshNormals`](crate::transform::GenerateMeshNormals)
/// attach `normals`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions. The index of a position is its vertex identity.
    pub positions: Vec<Point3<f64>>,
    faces: Option<Vec<[usize; 3]>>,
    normals: Option<Vec<Vector3<f64>>>,
}

impl MeshData {
    /// Create mesh data from positions and triangle faces.
    ///
    /// Face indices are not checked here; the estimator validates them.
    pub fn new(positions: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            positions,
            faces: Some(faces),
            normals: None,
        }
    }

    /// Create mesh data with positions only (a point cloud).
    pub fn from_positions(positions: Vec<Point3<f64>>) -> Self {
        Self {
            positions,
            faces: None,
            normals: None,
        }
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of faces, or 0 if there is no face data.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.as_ref().map_or(0, Vec::len)
    }

    /// Returns the faces, if any.
    #[inline]
    pub fn faces(&self) -> Option<&[[usize; 3]]> {
        self.faces.as_deref()
    }

    /// Replace the face data.
    pub fn set_faces(&mut self, faces: Option<Vec<[usize; 3]>>) {
        self.faces = faces;
    }

    /// Returns the per-vertex normals, if computed or loaded.
    #[inline]
    pub fn normals(&self) -> Option<&[Vector3<f64>]> {
        self.normals.as_deref()
    }

    /// Attach per-vertex normals.
    ///
    /// Fails with [`MeshError::LengthMismatch`] unless there is exactly one
    /// normal per vertex.
    pub fn set_normals(&mut self, normals: Vec<Vector3<f64>>) -> Result<()> {
        if normals.len() != self.positions.len() {
            return Err(MeshError::LengthMismatch {
                expected: self.positions.len(),
                actual: normals.len(),
            });
        }
        self.normals = Some(normals);
        Ok(())
    }

    /// Drop the normal attribute.
    pub fn clear_normals(&mut self) {
        self.normals = None;
    }
}
