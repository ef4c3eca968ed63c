//! CPU-side mesh representation produced by the geometry builders.

use glam::{Mat4, Vec3};

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Contiguous index range drawn with one material slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshGroup {
    pub start: u32,
    pub count: u32,
    pub material: u32,
}

/// Indexed triangle mesh with tightly-packed vertices and material groups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub groups: Vec<MeshGroup>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            groups: Vec::new(),
        }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Apply an affine transform to positions and normals in place.
    pub fn transform(&mut self, m: Mat4) {
        let normal_m = m.inverse().transpose();
        for v in &mut self.vertices {
            v.position = m.transform_point3(Vec3::from(v.position)).to_array();
            v.normal = normal_m
                .transform_vector3(Vec3::from(v.normal))
                .normalize_or_zero()
                .to_array();
        }
    }

    /// Merge `other` into `self`, rebasing its indices and groups.
    pub fn append(&mut self, other: &MeshData) {
        let base_vertex = self.vertices.len() as u32;
        let base_index = self.indices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|i| i + base_vertex));
        self.groups.extend(other.groups.iter().map(|g| MeshGroup {
            start: g.start + base_index,
            ..*g
        }));
    }
}
