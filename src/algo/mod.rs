//! Mesh processing algorithms.
//!
//! - **Normals**: per-vertex normal estimation from face normals
//!   ([`normals`])
//!
//! Long-running entry points have a `_with_progress` variant that takes a
//! [`Progress`] callback.

pub mod normals;
mod progress;

pub use progress::Progress;
