//! Error types for meshnorm.
//!
//! Every fallible operation in the crate returns [`Result`]. Degenerate
//! geometry is never an error; see [`crate::algo::normals`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while estimating normals or moving mesh data around.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A face references a vertex index outside the position list.
    #[error("face {face} references vertex {vertex}, but the mesh has {num_vertices} vertices")]
    IndexOutOfRange {
        /// The face index.
        face: usize,
        /// The offending vertex index.
        vertex: usize,
        /// Number of vertex positions.
        num_vertices: usize,
    },

    /// The operation needs face data but the mesh has none.
    #[error("mesh has no face data")]
    MissingFaces,

    /// A per-vertex attribute does not have one entry per vertex.
    #[error("attribute length {actual} does not match vertex count {expected}")]
    LengthMismatch {
        /// The vertex count.
        expected: usize,
        /// The attribute length supplied.
        actual: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// No transform is registered under the requested name.
    #[error("unknown transform: {name}")]
    UnknownTransform {
        /// The requested functional name.
        name: String,
    },
}

impl MeshError {
    /// Create a load error for `path`.
    pub(crate) fn load<P: Into<PathBuf>, M: ToString>(path: P, message: M) -> Self {
        MeshError::LoadError {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a save error for `path`.
    pub(crate) fn save<P: Into<PathBuf>, M: ToString>(path: P, message: M) -> Self {
        MeshError::SaveError {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
