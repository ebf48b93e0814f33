//! Core data structures for the vv mesh viewer
//!
//! This crate provides the in-memory polygonal mesh every parser produces:
//! points, triangular faces and named per-point attribute arrays.

pub mod point;
pub mod attributes;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use attributes::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// Common result type for vv operations
pub type Result<T> = std::result::Result<T, Error>;
