//! Integer types usable as face vertex indices.
//!
//! Face lists come from many places: file loaders produce `usize`, GPU index
//! buffers are usually `u32` or `u16`. The estimator is generic over
//! [`MeshIndex`] so any of them can be passed in without conversion.

use std::fmt::Debug;

/// Trait for types that can be used as face vertex indices.
///
/// Implemented for `u16`, `u32`, `u64` and `usize`.
pub trait MeshIndex: Copy + Debug + Send + Sync + 'static {
    /// Convert to usize.
    ///
    /// Values that do not fit in `usize` saturate to `usize::MAX`, which is
    /// never a valid vertex index, so validation rejects them.
    fn to_usize(self) -> usize;
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {
        $(
            impl MeshIndex for $ty {
                #[inline]
                fn to_usize(self) -> usize {
                    usize::try_from(self).unwrap_or(usize::MAX)
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64, usize);

/// Convert a face to `usize` indices.
#[inline]
pub fn face_to_usize<I: MeshIndex>(face: &[I; 3]) -> [usize; 3] {
    [face[0].to_usize(), face[1].to_usize(), face[2].to_usize()]
}
