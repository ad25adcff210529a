//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Normals |
//! |--------|-----------|------|------|---------|
//! | PLY | `.ply` | ✓ | ✓ | per vertex (`nx ny nz`) |
//! | STL | `.stl` | ✓ | ✓ | per facet only |
//!
//! # Usage
//!
//! ```no_run
//! use meshnorm::io::{load, save};
//! use meshnorm::transform::{GenerateMeshNormals, Transform};
//!
//! let mut data = load("model.stl").unwrap();
//! GenerateMeshNormals::default().apply(&mut data).unwrap();
//! save(&data, "model_with_normals.ply").unwrap();
//! ```

pub mod ply;
pub mod stl;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::MeshData;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PLY (Stanford polygon) format.
    Ply,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "ply" => Some(Format::Ply),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load mesh data from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<MeshData> {
    let path = path.as_ref();
    let data = match detect(path)? {
        Format::Ply => ply::load(path)?,
        Format::Stl => stl::load(path)?,
    };
    log::info!(
        "loaded {}: {} vertices, {} faces",
        path.display(),
        data.num_vertices(),
        data.num_faces()
    );
    Ok(data)
}

/// Save mesh data to a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn save<P: AsRef<Path>>(data: &MeshData, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Ply => ply::save(data, path),
        Format::Stl => stl::save(data, path),
    }
}
