//! Collision primitives: rays, planes and axis-aligned boxes

pub mod primitives;

pub use primitives::{Ray, Plane, AABB, screen_to_ndc};
