//! The `flowline` crate provides tools for tracing streamlines
//! through vector fields defined on spatial meshes.
pub mod field;
pub mod geometry;
pub mod mesh;
pub mod num;
pub mod source;
pub mod tracing;
