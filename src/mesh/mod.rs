//! Mesh data passed into and out of the estimator.
//!
//! # Overview
//!
//! [`MeshData`] is a plain holder for vertex positions, triangle faces and an
//! optional per-vertex normal attribute. It performs no topology validation
//! and builds no adjacency.
//!
//! Face indices may be any [`MeshIndex`] type when calling the estimator
//! directly, so `u32` index buffers can be used as-is:
//!
//! ```
//! use meshnorm::algo::normals::estimate_normals;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces: Vec<[u32; 3]> = vec![[0, 1, 2]];
//!
//! let normals = estimate_normals(&positions, &faces).unwrap();
//! assert_eq!(normals.len(), 3);
//! ```

mod data;
mod index;

pub use data::MeshData;
pub use index::{face_to_usize, MeshIndex};
