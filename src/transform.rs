//! Transforms that operate on [`MeshData`].
//!
//! A [`Transform`] reads attributes from a mesh and writes new ones. Each
//! transform has a functional name, which [`lookup`] maps back to a default
//! instance so pipelines can be assembled from configuration strings.
//!
//! # Example
//!
//! ```
//! use meshnorm::mesh::MeshData;
//! use meshnorm::transform::{GenerateMeshNormals, Pipeline};
//! use nalgebra::Point3;
//!
//! let mut data = MeshData::new(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! );
//!
//! let pipeline = Pipeline::new().with(GenerateMeshNormals::default());
//! pipeline.apply(&mut data).unwrap();
//! assert_eq!(data.normals().unwrap().len(), 3);
//! ```

use crate::algo::normals::{estimate_normals_with_progress, NormalOptions};
use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::MeshData;

/// An operation on mesh data.
///
/// Implementations must leave `data` unchanged when they return an error.
pub trait Transform: Send + Sync {
    /// The functional name this transform is registered under.
    fn name(&self) -> &'static str;

    /// Apply the transform in place.
    fn apply(&self, data: &mut MeshData) -> Result<()>;
}

/// Attach per-vertex normals computed from the mesh faces.
///
/// Functional name: `generate_mesh_normals`. Requires face data; fails with
/// [`MeshError::MissingFaces`] on a bare point cloud.
#[derive(Debug, Default)]
pub struct GenerateMeshNormals {
    /// Options passed to the estimator.
    pub options: NormalOptions,
    progress: Option<Progress>,
}

impl GenerateMeshNormals {
    /// Functional name of this transform.
    pub const NAME: &'static str = "generate_mesh_normals";

    /// Create the transform with the given estimator options.
    pub fn with_options(options: NormalOptions) -> Self {
        Self {
            options,
            progress: None,
        }
    }

    /// Report estimator progress to `progress`.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl Transform for GenerateMeshNormals {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, data: &mut MeshData) -> Result<()> {
        let faces = data.faces().ok_or(MeshError::MissingFaces)?;
        let silent = Progress::none();
        let progress = self.progress.as_ref().unwrap_or(&silent);
        let normals = estimate_normals_with_progress(&data.positions, faces, &self.options, progress)?;
        data.set_normals(normals)
    }
}

/// Construct the registered transform with the given functional name.
///
/// # Errors
///
/// Returns [`MeshError::UnknownTransform`] if no transform has that name.
pub fn lookup(name: &str) -> Result<Box<dyn Transform>> {
    match name {
        GenerateMeshNormals::NAME => Ok(Box::new(GenerateMeshNormals::default())),
        _ => Err(MeshError::UnknownTransform {
            name: name.to_string(),
        }),
    }
}

/// An ordered sequence of transforms.
#[derive(Default)]
pub struct Pipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from functional names, in order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let transforms = names
            .iter()
            .map(|name| lookup(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { transforms })
    }

    /// Append a transform.
    pub fn with<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.push(transform);
        self
    }

    /// Append a transform.
    pub fn push<T: Transform + 'static>(&mut self, transform: T) {
        self.transforms.push(Box::new(transform));
    }

    /// Number of transforms in the pipeline.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the pipeline has no transforms.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Functional names of the transforms, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Apply every transform in order, stopping at the first error.
    pub fn apply(&self, data: &mut MeshData) -> Result<()> {
        for transform in &self.transforms {
            log::debug!("applying transform {}", transform.name());
            transform.apply(data)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("transforms", &self.names())
            .finish()
    }
}
