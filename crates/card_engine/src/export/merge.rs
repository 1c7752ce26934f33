//! World-space geometry merge
//!
//! Bakes each visible fragment's world transform into a copy of its
//! geometry. Picking proxies carry invisible materials and are skipped.

use crate::render::primitives::Mesh;
use crate::scene::{CardAssembly, FragmentId};

/// One fragment's slice of a [`CombinedMesh`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshGroup {
    /// Fragment name
    pub name: String,
    /// First triangle of the group in the merged index buffer
    pub first_triangle: usize,
    /// Number of triangles in the group
    pub triangle_count: usize,
}

/// All exportable fragments merged into one world-space mesh
#[derive(Debug, Clone, Default)]
pub struct CombinedMesh {
    /// Merged geometry
    pub mesh: Mesh,
    /// Per-fragment ranges, in merge order
    pub groups: Vec<MeshGroup>,
}

impl CombinedMesh {
    /// Total triangle count
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }
}

/// Visible fragments with geometry: base, frame, labels, each followed by
/// its visible descendants
pub fn exportable_fragments(assembly: &CardAssembly) -> Vec<FragmentId> {
    let graph = assembly.graph();
    let mut order = Vec::new();
    let mut stack: Vec<FragmentId> = assembly.fragments().into_iter().rev().collect();

    while let Some(id) = stack.pop() {
        stack.extend(graph.children(id).iter().rev().copied());

        let visible = graph.material(id).is_some_and(|material| material.visible);
        let has_geometry = graph.mesh(id).is_some_and(|mesh| !mesh.is_empty());
        if visible && has_geometry {
            order.push(id);
        }
    }
    order
}

/// World-space copy of one fragment's geometry
pub fn world_mesh(assembly: &CardAssembly, id: FragmentId) -> Option<Mesh> {
    let graph = assembly.graph();
    let world = graph.world_matrix(id)?;
    Some(graph.mesh(id)?.transformed(&world))
}

/// Merge every exportable fragment, `None` when there is nothing to merge
pub fn merge_world_geometry(assembly: &CardAssembly) -> Option<CombinedMesh> {
    let graph = assembly.graph();
    let mut combined = CombinedMesh::default();

    for id in exportable_fragments(assembly) {
        let (Some(mesh), Some(node)) = (world_mesh(assembly, id), graph.node(id)) else {
            continue;
        };
        combined.groups.push(MeshGroup {
            name: node.name.clone(),
            first_triangle: combined.mesh.triangle_count(),
            triangle_count: mesh.triangle_count(),
        });
        combined.mesh.append(&mesh);
    }

    if combined.mesh.is_empty() {
        None
    } else {
        Some(combined)
    }
}
