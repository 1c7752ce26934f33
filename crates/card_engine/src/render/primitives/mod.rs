//! Core primitive types for geometry
//!
//! This module contains the fundamental data structures used throughout
//! the composer: vertices, indexed triangle meshes and their generators.

pub mod mesh;

// Re-export commonly used types
pub use mesh::{Mesh, Vertex};
