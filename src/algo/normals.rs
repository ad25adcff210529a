//! Per-vertex normal estimation.
//!
//! Vertex normals are derived from the normals of the faces touching each
//! vertex:
//!
//! 1. Every face `(a, b, c)` gets the unit normal of `(p_b - p_a) × (p_c - p_a)`.
//! 2. Each face normal is added, unweighted, to the accumulators of its three
//!    vertices.
//! 3. Each accumulator is normalized.
//!
//! # Sign Convention
//!
//! Normals follow the right-hand rule over the face winding. A face listed
//! counter-clockwise when viewed from outside gets an outward normal. Meshes
//! with inconsistent winding produce inward normals for the flipped faces;
//! no winding correction is attempted.
//!
//! # Degenerate Input
//!
//! Normalizing a vector whose length is at most [`NORM_EPSILON`] yields the
//! zero vector. Collinear or repeated-index faces therefore contribute
//! nothing, and vertices with no faces (or with exactly cancelling face
//! normals) get `(0, 0, 0)`. The output never contains NaN.
//!
//! # Example
//!
//! ```
//! use meshnorm::algo::normals::estimate_normals;
//! use nalgebra::{Point3, Vector3};
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0usize, 1, 2]];
//!
//! let normals = estimate_normals(&positions, &faces).unwrap();
//! for n in &normals {
//!     assert!((n - Vector3::z()).norm() < 1e-12);
//! }
//! ```

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::{MeshError, Result};
use crate::mesh::{face_to_usize, MeshIndex};

use super::Progress;

/// Vectors at or below this length normalize to the zero vector.
pub const NORM_EPSILON: f64 = 1e-12;

// Smallest partition handed to one rayon job during accumulation. Smaller
// meshes accumulate sequentially.
const MIN_FACES_PER_JOB: usize = 4096;

/// Options for normal estimation.
#[derive(Debug, Clone)]
pub struct NormalOptions {
    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for NormalOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl NormalOptions {
    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Normalize `v`, or return the zero vector if it has no usable direction.
///
/// The zero vector is returned when the length is at most [`NORM_EPSILON`]
/// or a component is not finite. The length is taken after scaling by the
/// largest component, so vectors near `f64::MAX` still normalize.
///
/// # Example
///
/// ```
/// use meshnorm::algo::normals::normalize_or_zero;
/// use nalgebra::Vector3;
///
/// assert_eq!(normalize_or_zero(&Vector3::new(0.0, 3.0, 4.0)), Vector3::new(0.0, 0.6, 0.8));
/// assert_eq!(normalize_or_zero(&Vector3::zeros()), Vector3::zeros());
/// ```
#[inline]
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    if v.iter().any(|c| !c.is_finite()) {
        return Vector3::zeros();
    }
    let scale = v.amax();
    if scale == 0.0 {
        return Vector3::zeros();
    }
    let scaled = v / scale;
    let len = scaled.norm();
    if len * scale > NORM_EPSILON {
        scaled / len
    } else {
        Vector3::zeros()
    }
}

/// Compute the unit normal of the triangle `(p0, p1, p2)`.
///
/// Returns the zero vector for degenerate (zero-area) triangles. Edges are
/// scaled to a largest component of 1 before the cross product, so the
/// degeneracy test is relative to the triangle's size and very large
/// triangles do not overflow.
#[inline]
pub fn face_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    let e1 = p1 - p0;
    let e2 = p2 - p0;
    let scale = e1.amax().max(e2.amax());
    if !scale.is_finite() || scale == 0.0 {
        return Vector3::zeros();
    }
    normalize_or_zero(&(e1 / scale).cross(&(e2 / scale)))
}

/// Check that every face index refers to an existing vertex.
///
/// Faces are scanned in order, so the error always names the first bad
/// index.
pub fn validate_faces<I: MeshIndex>(num_vertices: usize, faces: &[[I; 3]]) -> Result<()> {
    for (fi, face) in faces.iter().enumerate() {
        for vi in face_to_usize(face) {
            if vi >= num_vertices {
                return Err(MeshError::IndexOutOfRange {
                    face: fi,
                    vertex: vi,
                    num_vertices,
                });
            }
        }
    }
    Ok(())
}

/// Compute the unit normal of every face.
///
/// Degenerate faces get the zero vector.
///
/// # Errors
///
/// Returns [`MeshError::IndexOutOfRange`] if a face references a vertex that
/// does not exist.
pub fn compute_face_normals<I: MeshIndex>(
    positions: &[Point3<f64>],
    faces: &[[I; 3]],
    options: &NormalOptions,
) -> Result<Vec<Vector3<f64>>> {
    validate_faces(positions.len(), faces)?;
    Ok(face_normals_unchecked(positions, faces, options.parallel))
}

/// Estimate one unit normal per vertex using default options.
///
/// See [`estimate_normals_with_options`].
pub fn estimate_normals<I: MeshIndex>(
    positions: &[Point3<f64>],
    faces: &[[I; 3]],
) -> Result<Vec<Vector3<f64>>> {
    estimate_normals_with_options(positions, faces, &NormalOptions::default())
}

/// Estimate one unit normal per vertex.
///
/// The output has the same length and order as `positions`. Every entry is
/// either unit length or exactly zero.
///
/// # Errors
///
/// Returns [`MeshError::IndexOutOfRange`] before doing any work if a face
/// references a vertex that does not exist.
///
/// # Example
///
/// ```
/// use meshnorm::algo::normals::{estimate_normals_with_options, NormalOptions};
/// use nalgebra::Point3;
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(5.0, 5.0, 5.0), // not used by any face
/// ];
/// let faces = vec![[0usize, 1, 2], [0, 2, 3]];
///
/// let options = NormalOptions::default().sequential();
/// let normals = estimate_normals_with_options(&positions, &faces, &options).unwrap();
/// assert_eq!(normals[4].norm(), 0.0);
/// ```
pub fn estimate_normals_with_options<I: MeshIndex>(
    positions: &[Point3<f64>],
    faces: &[[I; 3]],
    options: &NormalOptions,
) -> Result<Vec<Vector3<f64>>> {
    estimate_normals_with_progress(positions, faces, options, &Progress::none())
}

/// Normal estimation with progress reporting.
///
/// Reports once per phase: face normals, accumulation, normalization.
pub fn estimate_normals_with_progress<I: MeshIndex>(
    positions: &[Point3<f64>],
    faces: &[[I; 3]],
    options: &NormalOptions,
    progress: &Progress,
) -> Result<Vec<Vector3<f64>>> {
    const STEPS: usize = 3;

    validate_faces(positions.len(), faces)?;

    log::debug!(
        "estimating normals: {} vertices, {} faces ({})",
        positions.len(),
        faces.len(),
        if options.parallel { "parallel" } else { "sequential" }
    );

    progress.report(0, STEPS, "Computing face normals");
    let face_normals = face_normals_unchecked(positions, faces, options.parallel);
    if log::log_enabled!(log::Level::Debug) {
        let degenerate = face_normals.iter().filter(|n| is_zero(n)).count();
        log::debug!("{} degenerate faces", degenerate);
    }

    progress.report(1, STEPS, "Accumulating vertex normals");
    let accumulated =
        accumulate_vertex_normals(positions.len(), faces, &face_normals, options.parallel);

    progress.report(2, STEPS, "Normalizing vertex normals");
    let normals = normalize_vertex_normals(accumulated, options.parallel);
    if log::log_enabled!(log::Level::Debug) {
        let zero = normals.iter().filter(|n| is_zero(n)).count();
        log::debug!("{} vertices without a normal direction", zero);
    }

    progress.report(STEPS, STEPS, "Normal estimation");
    Ok(normals)
}

// ============================================================================
// Phases
// ============================================================================

/// Face normals without index validation. Callers must validate first.
fn face_normals_unchecked<I: MeshIndex>(
    positions: &[Point3<f64>],
    faces: &[[I; 3]],
    parallel: bool,
) -> Vec<Vector3<f64>> {
    let normal_of = |face: &[I; 3]| {
        let [a, b, c] = face_to_usize(face);
        face_normal(&positions[a], &positions[b], &positions[c])
    };

    if parallel {
        faces.par_iter().map(normal_of).collect()
    } else {
        faces.iter().map(normal_of).collect()
    }
}

/// Add `normal` to the accumulator of each vertex of `face`.
#[inline]
fn scatter<I: MeshIndex>(acc: &mut [Vector3<f64>], face: &[I; 3], normal: &Vector3<f64>) {
    for vi in face_to_usize(face) {
        acc[vi] += normal;
    }
}

/// Sum face normals into per-vertex accumulators.
///
/// The parallel path splits the faces into at most one partition per rayon
/// thread. Each partition fills its own accumulator array; the arrays are
/// then summed slot by slot, so no slot is written concurrently.
fn accumulate_vertex_normals<I: MeshIndex>(
    num_vertices: usize,
    faces: &[[I; 3]],
    face_normals: &[Vector3<f64>],
    parallel: bool,
) -> Vec<Vector3<f64>> {
    debug_assert_eq!(faces.len(), face_normals.len());

    if !parallel || faces.len() <= MIN_FACES_PER_JOB {
        let mut acc = vec![Vector3::zeros(); num_vertices];
        for (face, normal) in faces.iter().zip(face_normals) {
            scatter(&mut acc, face, normal);
        }
        return acc;
    }

    let chunk = partition_len(faces.len(), rayon::current_num_threads());
    let mut partials: Vec<Vec<Vector3<f64>>> = faces
        .par_chunks(chunk)
        .zip(face_normals.par_chunks(chunk))
        .map(|(face_chunk, normal_chunk)| {
            let mut acc = vec![Vector3::zeros(); num_vertices];
            for (face, normal) in face_chunk.iter().zip(normal_chunk) {
                scatter(&mut acc, face, normal);
            }
            acc
        })
        .collect();
    log::trace!("accumulated {} partitions of {} faces", partials.len(), chunk);

    let Some(mut acc) = partials.pop() else {
        return vec![Vector3::zeros(); num_vertices];
    };
    acc.par_iter_mut().enumerate().for_each(|(vi, slot)| {
        for partial in &partials {
            *slot += partial[vi];
        }
    });
    acc
}

/// Faces per accumulation partition: `jobs` partitions at most, none smaller
/// than [`MIN_FACES_PER_JOB`].
fn partition_len(num_faces: usize, jobs: usize) -> usize {
    num_faces.div_ceil(jobs.max(1)).max(MIN_FACES_PER_JOB)
}

/// Normalize every accumulator in place.
fn normalize_vertex_normals(mut normals: Vec<Vector3<f64>>, parallel: bool) -> Vec<Vector3<f64>> {
    if parallel {
        normals
            .par_iter_mut()
            .for_each(|n| *n = normalize_or_zero(n));
    } else {
        for n in &mut normals {
            *n = normalize_or_zero(n);
        }
    }
    normals
}

#[inline]
fn is_zero(v: &Vector3<f64>) -> bool {
    v.x == 0.0 && v.y == 0.0 && v.z == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const TOL: f64 = 1e-10;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        (positions, vec![[0, 1, 2]])
    }

    fn create_tetrahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        (positions, faces)
    }

    /// A bumpy height field with `(n + 1)^2` vertices and `2 n^2` faces.
    fn create_height_field(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let mut positions = Vec::with_capacity((n + 1) * (n + 1));
        let mut faces = Vec::with_capacity(n * n * 2);

        for j in 0..=n {
            for i in 0..=n {
                let x = i as f64 / n as f64;
                let y = j as f64 / n as f64;
                let z = 0.2 * (6.0 * x).sin() * (4.0 * y).cos();
                positions.push(Point3::new(x, y, z));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        (positions, faces)
    }

    fn assert_unit_or_zero(normals: &[Vector3<f64>]) {
        for (i, n) in normals.iter().enumerate() {
            assert!(n.iter().all(|c| c.is_finite()), "normal {} not finite: {:?}", i, n);
            let len = n.norm();
            assert!(
                (len - 1.0).abs() < 1e-5 || *n == Vector3::zeros(),
                "normal {} has length {}",
                i,
                len
            );
        }
    }

    fn assert_close(a: &[Vector3<f64>], b: &[Vector3<f64>], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).norm() < tol, "normal {} differs: {:?} vs {:?}", i, x, y);
        }
    }

    #[test]
    fn test_single_triangle_counter_clockwise() {
        let (positions, faces) = single_triangle();
        let normals = estimate_normals(&positions, &faces).unwrap();

        assert_eq!(normals.len(), 3);
        for n in &normals {
            assert!((n - Vector3::z()).norm() < TOL, "expected +z, got {:?}", n);
        }
    }

    #[test]
    fn test_single_triangle_clockwise_flips_sign() {
        let (positions, _) = single_triangle();
        let normals = estimate_normals(&positions, &[[0usize, 2, 1]]).unwrap();

        for n in &normals {
            assert!((n + Vector3::z()).norm() < TOL, "expected -z, got {:?}", n);
        }
    }

    #[test]
    fn test_planar_quad_shares_face_normal() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0usize, 1, 2], [0, 2, 3]];

        let normals = estimate_normals(&positions, &faces).unwrap();
        for n in &normals {
            assert_eq!(*n, Vector3::z());
        }
    }

    #[test]
    fn test_tilted_plane() {
        // Plane x + y + z = 1, wound so the normal points away from the origin.
        let positions = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let normals = estimate_normals(&positions, &[[0u32, 1, 2]]).unwrap();
        let expected = Vector3::new(1.0, 1.0, 1.0).normalize();
        for n in &normals {
            assert!((n - expected).norm() < TOL);
        }
    }

    #[test]
    fn test_unweighted_accumulation() {
        // A large and a tiny triangle meet at vertex 0. Without area
        // weighting both count equally, so vertex 0 sits halfway between.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(100.0, 0.0, 0.0),
            Point3::new(0.0, 100.0, 0.0),
            Point3::new(0.0, 0.0, 0.01),
        ];
        // Face 0 lies in z = 0 (normal +z); face 1 lies in y = 0 (normal -y).
        let faces = vec![[0usize, 1, 2], [0, 1, 3]];

        let face_normals =
            compute_face_normals(&positions, &faces, &NormalOptions::default()).unwrap();
        assert!((face_normals[0] - Vector3::z()).norm() < TOL);
        assert!((face_normals[1] + Vector3::y()).norm() < TOL);

        let normals = estimate_normals(&positions, &faces).unwrap();
        let expected = Vector3::new(0.0, -1.0, 1.0).normalize();
        assert!((normals[0] - expected).norm() < TOL);
        assert!((normals[1] - expected).norm() < TOL);
        assert!((normals[2] - Vector3::z()).norm() < TOL);
        assert!((normals[3] + Vector3::y()).norm() < TOL);
    }

    #[test]
    fn test_tetrahedron_normals_point_outward() {
        let (positions, faces) = create_tetrahedron();
        let normals = estimate_normals(&positions, &faces).unwrap();

        let centroid = positions.iter().map(|p| p.coords).sum::<Vector3<f64>>() / 4.0;
        for (p, n) in positions.iter().zip(&normals) {
            assert!((n.norm() - 1.0).abs() < TOL);
            assert!(
                n.dot(&(p.coords - centroid)) > 0.0,
                "normal {:?} at {:?} points inward",
                n,
                p
            );
        }
    }

    #[test]
    fn test_degenerate_face_contributes_zero() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0), // collinear with 0 and 1
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0usize, 1, 2], [0, 1, 3]];

        let face_normals =
            compute_face_normals(&positions, &faces, &NormalOptions::default()).unwrap();
        assert_eq!(face_normals[0], Vector3::zeros());

        let normals = estimate_normals(&positions, &faces).unwrap();
        // Vertex 2 is only touched by the collinear face.
        assert_eq!(normals[2], Vector3::zeros());
        for i in [0, 1, 3] {
            assert!((normals[i] - Vector3::z()).norm() < TOL);
        }
    }

    #[test]
    fn test_repeated_index_face_is_zero() {
        let (positions, _) = single_triangle();
        let normals = estimate_normals(&positions, &[[0usize, 0, 1], [1, 1, 1]]).unwrap();

        for n in &normals {
            assert_eq!(*n, Vector3::zeros());
            assert!(!n.x.is_nan());
        }
    }

    #[test]
    fn test_cancelling_normals_yield_zero() {
        let (positions, _) = single_triangle();
        // Same triangle, both windings.
        let normals = estimate_normals(&positions, &[[0usize, 1, 2], [0, 2, 1]]).unwrap();

        for n in &normals {
            assert_eq!(*n, Vector3::zeros());
        }
    }

    #[test]
    fn test_isolated_vertex_is_zero() {
        let (mut positions, faces) = single_triangle();
        positions.push(Point3::new(3.0, 3.0, 3.0));

        let normals = estimate_normals(&positions, &faces).unwrap();
        assert_eq!(normals.len(), 4);
        assert_eq!(normals[3], Vector3::zeros());
    }

    #[test]
    fn test_empty_inputs() {
        let normals = estimate_normals::<usize>(&[], &[]).unwrap();
        assert!(normals.is_empty());

        let (positions, _) = single_triangle();
        let normals = estimate_normals::<u32>(&positions, &[]).unwrap();
        assert_eq!(normals, vec![Vector3::zeros(); 3]);
    }

    #[test]
    fn test_out_of_range_index() {
        let (positions, _) = single_triangle();
        let faces = vec![[0usize, 1, 2], [1, 2, 3], [0, 9, 1]];

        let err = estimate_normals(&positions, &faces).unwrap_err();
        match err {
            MeshError::IndexOutOfRange {
                face,
                vertex,
                num_vertices,
            } => {
                assert_eq!(face, 1);
                assert_eq!(vertex, 3);
                assert_eq!(num_vertices, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_on_empty_positions() {
        let err = estimate_normals::<u16>(&[], &[[0, 0, 0]]).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { face: 0, vertex: 0, .. }));
    }

    #[test]
    fn test_wide_index_out_of_range() {
        let (positions, _) = single_triangle();
        let faces: Vec<[u64; 3]> = vec![[0, 1, 2], [0, 1, u64::MAX], [0, 1, 1 << 32]];

        let err = estimate_normals(&positions, &faces).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { face: 1, num_vertices: 3, .. }));

        let err = estimate_normals(&positions, &faces[2..]).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { face: 0, .. }));
    }

    #[test]
    fn test_out_of_range_reports_no_progress() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let progress = Progress::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let (positions, _) = single_triangle();
        let result = estimate_normals_with_progress(
            &positions,
            &[[0usize, 1, 5]],
            &NormalOptions::default(),
            &progress,
        );
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_face_order_invariance() {
        let (positions, faces) = create_height_field(12);
        let expected = estimate_normals(&positions, &faces).unwrap();

        let mut reversed = faces.clone();
        reversed.reverse();
        let actual = estimate_normals(&positions, &reversed).unwrap();
        assert_close(&expected, &actual, 1e-12);

        // Interleave odd and even faces.
        let shuffled: Vec<[usize; 3]> = faces
            .iter()
            .step_by(2)
            .chain(faces.iter().skip(1).step_by(2))
            .copied()
            .collect();
        let actual = estimate_normals(&positions, &shuffled).unwrap();
        assert_close(&expected, &actual, 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        // Large enough to take the parallel accumulation path.
        let (positions, faces) = create_height_field(80);
        assert!(faces.len() > MIN_FACES_PER_JOB);

        let par = estimate_normals_with_options(&positions, &faces, &NormalOptions::default())
            .unwrap();
        let seq = estimate_normals_with_options(
            &positions,
            &faces,
            &NormalOptions::default().sequential(),
        )
        .unwrap();

        assert_close(&par, &seq, 1e-12);
        assert_unit_or_zero(&par);
    }

    #[test]
    fn test_partitions_bounded_by_jobs() {
        for num_faces in [1, 4095, 4096, 4097, 320_000, 1_000_003] {
            for jobs in [0, 1, 3, 16, 64] {
                let len = partition_len(num_faces, jobs);
                let partitions = num_faces.div_ceil(len);
                assert!(len >= MIN_FACES_PER_JOB);
                assert!(
                    partitions <= jobs.max(1),
                    "{} faces over {} jobs gave {} partitions",
                    num_faces,
                    jobs,
                    partitions
                );
            }
        }
    }

    #[test]
    fn test_parallel_on_many_threads_matches_sequential() {
        let (positions, faces) = create_height_field(120);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(16).build().unwrap();

        let par = pool.install(|| {
            estimate_normals_with_options(&positions, &faces, &NormalOptions::default())
        })
        .unwrap();
        let seq = estimate_normals_with_options(
            &positions,
            &faces,
            &NormalOptions::default().sequential(),
        )
        .unwrap();

        assert_close(&par, &seq, 1e-12);
    }

    #[test]
    fn test_height_field_unit_or_zero() {
        let (positions, faces) = create_height_field(16);
        let normals = estimate_normals(&positions, &faces).unwrap();

        assert_eq!(normals.len(), positions.len());
        assert_unit_or_zero(&normals);
        // Every vertex of the grid is used, and the surface faces up.
        for n in &normals {
            assert!(n.z > 0.0);
        }
    }

    #[test]
    fn test_index_types_agree() {
        let (positions, faces) = create_tetrahedron();
        let faces_u16: Vec<[u16; 3]> = faces
            .iter()
            .map(|f| [f[0] as u16, f[1] as u16, f[2] as u16])
            .collect();

        let a = estimate_normals(&positions, &faces).unwrap();
        let b = estimate_normals(&positions, &faces_u16).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_progress_reaches_total() {
        let last = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&last);
        let progress = Progress::new(move |current, total, _| {
            assert!(current <= total);
            seen.store(current * 100 / total, Ordering::Relaxed);
        });

        let (positions, faces) = create_tetrahedron();
        estimate_normals_with_progress(&positions, &faces, &NormalOptions::default(), &progress)
            .unwrap();
        assert_eq!(last.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn test_accumulate_and_normalize_phases() {
        let faces = vec![[0usize, 1, 2], [1, 2, 3]];
        let face_normals = vec![Vector3::new(0.0, 0.0, 2.0), Vector3::new(0.0, 3.0, 0.0)];

        let acc = accumulate_vertex_normals(5, &faces, &face_normals, false);
        assert_eq!(acc[0], Vector3::new(0.0, 0.0, 2.0));
        assert_eq!(acc[1], Vector3::new(0.0, 3.0, 2.0));
        assert_eq!(acc[3], Vector3::new(0.0, 3.0, 0.0));
        assert_eq!(acc[4], Vector3::zeros());

        let normals = normalize_vertex_normals(acc, false);
        assert_eq!(normals[0], Vector3::z());
        assert_eq!(normals[3], Vector3::y());
        assert_eq!(normals[4], Vector3::zeros());
        let expected = Vector3::new(0.0, 3.0, 2.0) / 13f64.sqrt();
        assert!((normals[1] - expected).norm() < TOL);
    }

    #[test]
    fn test_normalize_or_zero_edge_cases() {
        assert_eq!(normalize_or_zero(&Vector3::new(1e-13, 0.0, 0.0)), Vector3::zeros());
        assert_eq!(
            normalize_or_zero(&Vector3::new(f64::INFINITY, 0.0, 0.0)),
            Vector3::zeros()
        );
        assert_eq!(normalize_or_zero(&Vector3::new(f64::NAN, 1.0, 0.0)), Vector3::zeros());
        assert_eq!(normalize_or_zero(&Vector3::new(0.0, -2.0, 0.0)), -Vector3::y());

        // The plain norm of this vector overflows to infinity.
        let n = normalize_or_zero(&Vector3::new(1e308, 1e308, 0.0));
        assert!((n - Vector3::new(1.0, 1.0, 0.0).normalize()).norm() < TOL);

        // Tiny but well-formed triangles still get a direction.
        let n = face_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1e-5, 0.0, 0.0),
            &Point3::new(0.0, 1e-5, 0.0),
        );
        assert!((n - Vector3::z()).norm() < TOL);
    }

    #[test]
    fn test_huge_triangle_keeps_direction() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1e155, 0.0, 0.0),
            Point3::new(0.0, 1e155, 0.0),
        ];
        let normals = estimate_normals(&positions, &[[0usize, 1, 2]]).unwrap();
        for n in &normals {
            assert!((n - Vector3::z()).norm() < TOL, "expected +z, got {:?}", n);
        }

        // Collinear stays degenerate at any scale.
        let collinear = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1e200, 0.0, 0.0),
            Point3::new(3e200, 0.0, 0.0),
        ];
        let normals = estimate_normals(&collinear, &[[0usize, 1, 2]]).unwrap();
        assert!(normals.iter().all(|n| *n == Vector3::zeros()));
    }

    #[test]
    fn test_inputs_unchanged() {
        let (positions, faces) = create_tetrahedron();
        let positions_before = positions.clone();
        let faces_before = faces.clone();

        estimate_normals(&positions, &faces).unwrap();
        assert_eq!(positions, positions_before);
        assert_eq!(faces, faces_before);
    }
}
