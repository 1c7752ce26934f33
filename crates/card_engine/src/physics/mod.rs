//! Geometric queries used for pointer picking

pub mod collision;

pub use collision::{Ray, Plane, AABB};
