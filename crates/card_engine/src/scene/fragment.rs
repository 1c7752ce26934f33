//! Fragment drafts
//!
//! A [`Fragment`] is the builder-side description of one disposable unit of
//! geometry: a mesh, a shared material and a local transform, plus child
//! drafts. The scene graph takes ownership when the draft is inserted.

use std::rc::Rc;

use crate::foundation::math::{Transform, Vec3};
use crate::render::material::Material;
use crate::render::primitives::Mesh;

/// Name of the base fragment
pub const BASE_NAME: &str = "cardBase";

/// Prefix of label fragment names; the label id follows it
pub const LABEL_NAME_PREFIX: &str = "text_";

/// One of the four frame segments around the base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSide {
    /// Above the base, spanning the full outer width
    Top,
    /// Below the base, spanning the full outer width
    Bottom,
    /// Left of the base, spanning the base height
    Left,
    /// Right of the base, spanning the base height
    Right,
}

impl FrameSide {
    /// All sides in build order
    pub const ALL: [FrameSide; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    /// Fragment name of the segment
    pub fn name(self) -> &'static str {
        match self {
            Self::Top => "frameTop",
            Self::Bottom => "frameBottom",
            Self::Left => "frameLeft",
            Self::Right => "frameRight",
        }
    }
}

/// What role a fragment plays in the card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// Transform-only group node every other fragment hangs from
    Root,
    /// The rectangular card body
    Base,
    /// A border segment
    Frame(FrameSide),
    /// Extruded text for a label id
    Label {
        /// Owning label id
        label_id: String,
    },
    /// Invisible hit volume attached to a label
    PickingProxy {
        /// Label id of the parent label
        label_id: String,
    },
}

impl FragmentKind {
    /// Label id carried by label and proxy fragments
    pub fn label_id(&self) -> Option<&str> {
        match self {
            Self::Label { label_id } | Self::PickingProxy { label_id } => Some(label_id),
            _ => None,
        }
    }

    /// True for picking proxies
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::PickingProxy { .. })
    }
}

/// Fragment draft produced by the builders
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Identification name (`cardBase`, `frameTop`, `text_<id>`, ...)
    pub name: String,
    /// Role in the card
    pub kind: FragmentKind,
    /// Local geometry
    pub mesh: Mesh,
    /// Surface; several fragments may share one
    pub material: Rc<Material>,
    /// Placement relative to the parent
    pub transform: Transform,
    /// Child drafts, inserted beneath this fragment
    pub children: Vec<Fragment>,
}

impl Fragment {
    /// Create a fragment at the parent's origin
    pub fn new(name: impl Into<String>, kind: FragmentKind, mesh: Mesh, material: Rc<Material>) -> Self {
        Self {
            name: name.into(),
            kind,
            mesh,
            material,
            transform: Transform::identity(),
            children: Vec::new(),
        }
    }

    /// Set the local position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Attach a child draft
    pub fn with_child(mut self, child: Fragment) -> Self {
        self.children.push(child);
        self
    }

    /// Whether the fragment is drawn and exported
    pub fn is_visible(&self) -> bool {
        self.material.visible
    }
}
