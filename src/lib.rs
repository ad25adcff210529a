//! # meshnorm
//!
//! Per-vertex normal estimation for triangle meshes.
//!
//! Given vertex positions and triangular faces, meshnorm computes one unit
//! normal per vertex by summing the unit normals of the faces around it.
//! Degenerate faces and isolated vertices produce zero vectors instead of
//! NaN, and invalid face indices are reported before any work is done.
//!
//! ## Features
//!
//! - **Generic indices**: faces may use `u16`, `u32`, `u64` or `usize` indices
//! - **Parallel**: face and vertex passes run on rayon, switchable per call
//! - **Transforms**: attach normals to [`MeshData`](mesh::MeshData) through the
//!   [`Transform`](transform::Transform) interface
//! - **File formats**: PLY and STL
//!
//! ## Quick Start
//!
//! ```
//! use meshnorm::prelude::*;
//! use nalgebra::{Point3, Vector3};
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! // Counter-clockwise seen from +z
//! let faces = vec![[0usize, 1, 2], [0, 2, 3]];
//!
//! let normals = estimate_normals(&positions, &faces).unwrap();
//! assert!(normals.iter().all(|n| *n == Vector3::z()));
//! ```
//!
//! ## Working with Files
//!
//! ```no_run
//! use meshnorm::prelude::*;
//!
//! let mut data = meshnorm::io::load("model.stl").unwrap();
//! GenerateMeshNormals::default().apply(&mut data).unwrap();
//! meshnorm::io::save(&data, "model.ply").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod transform;

/// Prelude module for convenient imports.
///
/// ```
/// use meshnorm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::normals::{
        estimate_normals, estimate_normals_with_options, NormalOptions,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{MeshData, MeshIndex};
    pub use crate::transform::{GenerateMeshNormals, Transform};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
