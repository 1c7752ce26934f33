//! Mesh representation for card geometry
//!
//! Indexed triangle meshes in fragment-local space. Every fragment of a
//! card (base, frame segments, label outlines and picking proxies) owns
//! one of these, and the exporter bakes them into world space.

use crate::foundation::math::{normal_matrix, Mat4, Point3, Vec3};
use crate::physics::collision::AABB;

/// Vertex with position and normal
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],
    
    /// Normal vector
    pub normal: [f32; 3],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Normal as a vector
    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }
}

/// Indexed triangle mesh
///
/// Indices are consumed three at a time; each triple is one triangle with
/// counter-clockwise winding when seen from outside the solid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    
    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned box centered at the origin
    ///
    /// Each face has its own four vertices so normals stay flat:
    /// 24 vertices, 36 indices. Face order is +X, -X, +Y, -Y, +Z, -Z.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;

        // (normal, u, v) with u x v == normal so quads wind outward
        let faces = [
            (Vec3::x(), -Vec3::z(), Vec3::y()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::x(), -Vec3::z()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), -Vec3::x(), Vec3::y()),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = (normal + u * su + v * sv).component_mul(&half);
                vertices.push(Vertex::new(corner.into(), normal.into()));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(vertices, indices)
    }

    /// Number of triangles described by the index buffer
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    /// Iterate triangles as vertex position triples
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.vertices[tri[0] as usize].position(),
                self.vertices[tri[1] as usize].position(),
                self.vertices[tri[2] as usize].position(),
            ]
        })
    }

    /// Bounding box of all vertices, `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<AABB> {
        let points: Vec<Vec3> = self.vertices.iter().map(Vertex::position).collect();
        AABB::from_points(points.iter())
    }

    /// Shift every vertex by `offset`
    pub fn translate(&mut self, offset: Vec3) {
        for vertex in &mut self.vertices {
            vertex.position = (vertex.position() + offset).into();
        }
    }

    /// Copy of the mesh with `matrix` baked into positions and normals
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let normals = normal_matrix(matrix);
        let vertices = self
            .vertices
            .iter()
            .map(|vertex| {
                let position = matrix.transform_point(&Point3::from(vertex.position()));
                let normal = (normals * vertex.normal())
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vec3::zeros);
                Vertex::new(position.coords.into(), normal.into())
            })
            .collect();

        Self::new(vertices, self.indices.clone())
    }

    /// Append another mesh, offsetting its indices
    pub fn append(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|index| index + offset));
    }
}
