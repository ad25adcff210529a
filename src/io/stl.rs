//! STL (stereolithography) format support.
//!
//! STL stores independent triangles. On load, corners with identical
//! coordinates are welded into shared vertices so the estimator sees a
//! connected mesh. STL has no per-vertex normals; saving writes facet
//! normals only.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::algo::normals::{face_normal, validate_faces};
use crate::error::{MeshError, Result};
use crate::mesh::MeshData;

/// Load mesh data from an STL file.
///
/// Automatically detects binary vs ASCII format. Degenerate facets are kept;
/// they contribute nothing to vertex normals.
///
/// # Example
///
/// ```no_run
/// use meshnorm::io::stl;
///
/// let data = stl::load("model.stl").unwrap();
/// println!("{} faces", data.num_faces());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<MeshData> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    // read_stl welds identical corners into an indexed mesh
    let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::load(path, e))?;

    let positions: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let faces: Vec<[usize; 3]> = stl.faces.iter().map(|tri| tri.vertices).collect();

    Ok(MeshData::new(positions, faces))
}

/// Save mesh data to a binary STL file.
///
/// Facet normals are recomputed from the geometry; degenerate facets get a
/// zero normal.
///
/// # Errors
///
/// Returns [`MeshError::MissingFaces`] for a point cloud and
/// [`MeshError::IndexOutOfRange`] for a face with an invalid index.
///
/// # Example
///
/// ```no_run
/// use meshnorm::io::stl;
/// use meshnorm::mesh::MeshData;
/// use nalgebra::Point3;
///
/// let data = MeshData::new(
///     vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
///     vec![[0, 1, 2]],
/// );
/// stl::save(&data, "output.stl").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(data: &MeshData, path: P) -> Result<()> {
    let path = path.as_ref();
    let faces = data.faces().ok_or(MeshError::MissingFaces)?;
    validate_faces(data.num_vertices(), faces)?;

    let positions = &data.positions;
    let triangles: Vec<stl_io::Triangle> = faces
        .iter()
        .map(|f| {
            let p0 = &positions[f[0]];
            let p1 = &positions[f[1]];
            let p2 = &positions[f[2]];
            let n = face_normal(p0, p1, p2);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                    stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                    stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
                ],
            }
        })
        .collect();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::save(path, e))?;
    writer.flush()?;

    Ok(())
}
