//! Math utilities module
//!
//! Re-exports the glam types used across the crate plus the transform helpers.

mod transform;

pub use transform::{align_to_normal, Transform};

// Re-export commonly used glam types
pub use glam::{Quat, Vec3};
