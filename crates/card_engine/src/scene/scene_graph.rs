//! Fragment arena
//!
//! Nodes, geometry buffers and materials are stored in slot maps and refer
//! to each other by id. A node's parent and children are explicit ids, so
//! disposal walks the tree without any embedded pointers.

use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::render::material::{Material, MaterialId, MaterialLibrary};
use crate::render::primitives::Mesh;

use super::{Fragment, FragmentKind, SceneError};

new_key_type! {
    /// Handle to a live fragment
    pub struct FragmentId;

    /// Handle to a geometry buffer owned by exactly one fragment
    pub struct GeometryId;
}

/// A fragment after insertion into the arena
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Identification name
    pub name: String,
    /// Role in the card
    pub kind: FragmentKind,
    /// Placement relative to the parent
    pub transform: Transform,
    /// Geometry buffer, absent for the root group
    pub geometry: Option<GeometryId>,
    /// Material entry, absent for the root group
    pub material: Option<MaterialId>,
    /// Parent fragment, `None` only for the root
    pub parent: Option<FragmentId>,
    /// Children in insertion order
    pub children: Vec<FragmentId>,
}

/// Live resource totals, used for leak checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCounts {
    /// Fragments excluding the root
    pub fragments: usize,
    /// Geometry buffers
    pub geometries: usize,
    /// Distinct materials
    pub materials: usize,
}

/// Arena of card fragments under a single root group
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<FragmentId, SceneNode>,
    geometries: SlotMap<GeometryId, Mesh>,
    materials: MaterialLibrary,
    root: FragmentId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph holding only the root group
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode {
            name: "card".to_string(),
            kind: FragmentKind::Root,
            transform: Transform::identity(),
            geometry: None,
            material: None,
            parent: None,
            children: Vec::new(),
        });

        Self {
            nodes,
            geometries: SlotMap::with_key(),
            materials: MaterialLibrary::new(),
            root,
        }
    }

    /// The root group
    pub fn root(&self) -> FragmentId {
        self.root
    }

    /// Insert a fragment draft and its children beneath `parent`
    pub fn insert(&mut self, parent: FragmentId, fragment: Fragment) -> Result<FragmentId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownFragment(parent));
        }

        let Fragment { name, kind, mesh, material, transform, children } = fragment;
        let geometry = self.geometries.insert(mesh);
        let material = self.materials.acquire(&material);

        let id = self.nodes.insert(SceneNode {
            name,
            kind,
            transform,
            geometry: Some(geometry),
            material: Some(material),
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }

        for child in children {
            self.insert(id, child)?;
        }
        Ok(id)
    }

    /// Dispose a fragment and its whole subtree
    ///
    /// Releases each geometry buffer and one material reference per node,
    /// children before parents. Disposing the root clears every fragment but
    /// keeps the root itself. Returns the number of fragments removed.
    pub fn dispose(&mut self, id: FragmentId) -> Result<usize, SceneError> {
        if !self.nodes.contains_key(id) {
            return Err(SceneError::DoubleDispose(id));
        }

        if id == self.root {
            let children = self
                .nodes
                .get_mut(id)
                .map(|root| std::mem::take(&mut root.children))
                .unwrap_or_default();
            let mut removed = 0;
            for child in children {
                removed += self.release_subtree(child)?;
            }
            return Ok(removed);
        }

        if let Some(parent) = self.nodes.get(id).and_then(|node| node.parent) {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&child| child != id);
            }
        }
        self.release_subtree(id)
    }

    fn release_subtree(&mut self, id: FragmentId) -> Result<usize, SceneError> {
        let node = self.nodes.remove(id).ok_or(SceneError::DoubleDispose(id))?;

        let mut removed = 1;
        for child in node.children {
            removed += self.release_subtree(child)?;
        }

        if let Some(geometry) = node.geometry {
            self.geometries.remove(geometry).ok_or(SceneError::DoubleDispose(id))?;
        }
        if let Some(material) = node.material {
            self.materials.release(material).ok_or(SceneError::DoubleDispose(id))?;
        }
        log::trace!("Disposed fragment '{}'", node.name);
        Ok(removed)
    }

    /// Whether `id` names a live fragment
    pub fn contains(&self, id: FragmentId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node
    pub fn node(&self, id: FragmentId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Geometry of a fragment
    pub fn mesh(&self, id: FragmentId) -> Option<&Mesh> {
        let geometry = self.nodes.get(id)?.geometry?;
        self.geometries.get(geometry)
    }

    /// Material of a fragment
    pub fn material(&self, id: FragmentId) -> Option<&Rc<Material>> {
        let material = self.nodes.get(id)?.material?;
        self.materials.get(material)
    }

    /// Children of a fragment in insertion order
    pub fn children(&self, id: FragmentId) -> &[FragmentId] {
        self.nodes.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Parent of a fragment
    pub fn parent(&self, id: FragmentId) -> Option<FragmentId> {
        self.nodes.get(id)?.parent
    }

    /// Local transform of a fragment
    pub fn transform(&self, id: FragmentId) -> Option<&Transform> {
        self.nodes.get(id).map(|node| &node.transform)
    }

    /// Replace the local transform of a fragment
    pub fn set_transform(&mut self, id: FragmentId, transform: Transform) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::UnknownFragment(id))?;
        node.transform = transform;
        Ok(())
    }

    /// Move a fragment within its parent
    pub fn set_position(&mut self, id: FragmentId, position: Vec3) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::UnknownFragment(id))?;
        node.transform.position = position;
        Ok(())
    }

    /// Compose local transforms from the root down to `id`
    pub fn world_matrix(&self, id: FragmentId) -> Option<Mat4> {
        let node = self.nodes.get(id)?;
        let local = node.transform.to_matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// Every fragment below the root, parents before children
    pub fn traverse(&self) -> Vec<FragmentId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<FragmentId> = self.children(self.root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Live resource totals
    pub fn resource_counts(&self) -> ResourceCounts {
        ResourceCounts {
            fragments: self.nodes.len() - 1,
            geometries: self.geometries.len(),
            materials: self.materials.len(),
        }
    }
}
