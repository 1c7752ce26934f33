//! Card scene management
//!
//! Owns every fragment of the card and mediates parameter updates.
//!
//! ## Architecture
//!
//! ```text
//! CardParameters / LabelSpec (inputs)
//!      ↓
//! SolidBuilder / LabelBuilder (fragment drafts)
//!      ↓
//! CardAssembly (replace + dispose)
//!      ↓
//! SceneGraph (arena of fragments, geometry and materials)
//! ```
//!
//! Fragments live in an arena indexed by [`FragmentId`] with explicit
//! parent/child references. Disposing a fragment releases its subtree,
//! its geometry buffer and one reference on its material.

mod fragment;
mod scene_graph;
mod solid_builder;
mod assembly;

pub use fragment::{Fragment, FragmentKind, FrameSide, BASE_NAME, LABEL_NAME_PREFIX};
pub use scene_graph::{FragmentId, GeometryId, ResourceCounts, SceneGraph, SceneNode};
pub use solid_builder::{CardParameters, SolidBuilder, SolidParts};
pub use assembly::CardAssembly;

use thiserror::Error;

use crate::render::text::FontError;

/// Errors raised while building or mutating the card scene
#[derive(Error, Debug)]
pub enum SceneError {
    /// A card or label dimension was rejected; the previous state is kept
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f32,
    },

    /// A fragment or one of its materials was released twice
    #[error("Fragment {0:?} was already disposed")]
    DoubleDispose(FragmentId),

    /// The fragment id does not name a live fragment
    #[error("Unknown fragment {0:?}")]
    UnknownFragment(FragmentId),

    /// Label outline could not be produced
    #[error("Label build failed: {0}")]
    Font(#[from] FontError),
}
