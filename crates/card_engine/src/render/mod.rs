//! Geometry and surface description of card fragments
//!
//! Nothing in here draws pixels; display is left to the caller. The module
//! provides the mesh primitives, the shared material library and the text
//! label pipeline.

pub mod primitives;
pub mod material;
pub mod text;

pub use primitives::{Mesh, Vertex};
pub use material::{Material, MaterialId, MaterialLibrary};
