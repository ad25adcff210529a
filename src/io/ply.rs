//! PLY (Stanford polygon) format support.
//!
//! Vertices are read from the `x`, `y`, `z` properties and, when present,
//! per-vertex normals from `nx`, `ny`, `nz`. A file without a `face` element
//! loads as a point cloud (no face data).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::MeshData;

/// Load mesh data from a PLY file.
///
/// Polygons with more than three vertices are fan-triangulated.
///
/// # Example
///
/// ```no_run
/// use meshnorm::io::ply;
///
/// let data = ply::load("model.ply").unwrap();
/// println!("{} vertices", data.num_vertices());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<MeshData> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| MeshError::load(path, e))?;

    // Extract vertices
    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| MeshError::load(path, "PLY file has no vertex element"))?;

    let mut positions: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let [x, y, z] = get_vec3(vertex, ["x", "y", "z"])
            .ok_or_else(|| MeshError::load(path, "vertex missing x, y or z coordinate"))?;
        positions.push(Point3::new(x, y, z));
    }

    let has_normals = vertex_element
        .first()
        .map_or(false, |v| v.contains_key("nx"));
    let normals = if has_normals {
        let mut normals: Vec<Vector3<f64>> = Vec::with_capacity(vertex_element.len());
        for vertex in vertex_element {
            let [x, y, z] = get_vec3(vertex, ["nx", "ny", "nz"])
                .ok_or_else(|| MeshError::load(path, "vertex missing nx, ny or nz component"))?;
            normals.push(Vector3::new(x, y, z));
        }
        Some(normals)
    } else {
        None
    };

    // Extract faces
    let faces = match ply.payload.get("face") {
        Some(face_element) => {
            let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
            let mut skipped = 0;
            for face in face_element {
                let indices = get_list_property(face, "vertex_indices")
                    .or_else(|| get_list_property(face, "vertex_index"))
                    .ok_or_else(|| MeshError::load(path, "face missing vertex_indices property"))?;

                if indices.len() < 3 {
                    skipped += 1;
                    continue;
                }
                // Triangulate polygon by fan triangulation
                for i in 1..indices.len() - 1 {
                    faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
            if skipped > 0 {
                log::warn!("{}: skipped {} faces with fewer than 3 vertices", path.display(), skipped);
            }
            Some(faces)
        }
        None => None,
    };

    let mut data = MeshData::from_positions(positions);
    data.set_faces(faces);
    if let Some(normals) = normals {
        data.set_normals(normals)?;
    }
    Ok(data)
}

fn get_vec3(element: &DefaultElement, names: [&str; 3]) -> Option<[f64; 3]> {
    Some([
        get_float_property(element, names[0])?,
        get_float_property(element, names[1])?,
        get_float_property(element, names[2])?,
    ])
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save mesh data to a PLY file (ASCII format).
///
/// Coordinates are written as `double`. Normals are written when present;
/// the face element is omitted for point clouds.
///
/// # Errors
///
/// Returns [`MeshError::LengthMismatch`] if the normals no longer have one
/// entry per vertex, for example after positions were appended.
///
/// # Example
///
/// ```no_run
/// use meshnorm::io::ply;
/// use meshnorm::mesh::MeshData;
///
/// let data = MeshData::default();
/// ply::save(&data, "output.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(data: &MeshData, path: P) -> Result<()> {
    let path = path.as_ref();

    // stale if positions changed after set_normals
    let normals = data.normals();
    if let Some(normals) = normals {
        if normals.len() != data.num_vertices() {
            return Err(MeshError::LengthMismatch {
                expected: data.num_vertices(),
                actual: normals.len(),
            });
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    // Write header
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by meshnorm")?;
    writeln!(writer, "element vertex {}", data.num_vertices())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    if normals.is_some() {
        writeln!(writer, "property double nx")?;
        writeln!(writer, "property double ny")?;
        writeln!(writer, "property double nz")?;
    }
    if let Some(faces) = data.faces() {
        writeln!(writer, "element face {}", faces.len())?;
        writeln!(writer, "property list uchar int vertex_indices")?;
    }
    writeln!(writer, "end_header")?;

    // Write vertices
    for (i, p) in data.positions.iter().enumerate() {
        match normals {
            Some(normals) => {
                let n = &normals[i];
                writeln!(writer, "{} {} {} {} {} {}", p.x, p.y, p.z, n.x, n.y, n.z)?;
            }
            None => writeln!(writer, "{} {} {}", p.x, p.y, p.z)?,
        }
    }

    // Write faces
    for f in data.faces().unwrap_or_default() {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writer.flush()?;
    Ok(())
}
