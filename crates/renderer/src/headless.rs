//! Backend without a GPU: keeps built meshes in memory and records the scene.
//! Used by the demo binary and by tests to observe attach/detach traffic.

use std::collections::HashMap;

use asset::MeshData;
use glam::Vec3;

use crate::deck_mesh::build_deck_mesh;
use crate::{GeometryHandle, GeometryRequest, MaterialSet, RenderBackend, SceneGraph};

/// Scene node for an attached primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub position: Vec3,
    /// Handle ids of the bound materials, slot order edge/face/back.
    pub material_ids: [u64; 3],
}

/// Counters for geometry and scene traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub built: u64,
    pub released: u64,
    pub attached: u64,
    pub detached: u64,
}

#[derive(Default)]
pub struct HeadlessRenderer {
    meshes: HashMap<GeometryHandle, MeshData>,
    nodes: HashMap<GeometryHandle, SceneNode>,
    next_id: u64,
    stats: RenderStats,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self, handle: GeometryHandle) -> Option<&MeshData> {
        self.meshes.get(&handle)
    }

    pub fn node(&self, handle: GeometryHandle) -> Option<&SceneNode> {
        self.nodes.get(&handle)
    }

    pub fn is_attached(&self, handle: GeometryHandle) -> bool {
        self.nodes.contains_key(&handle)
    }

    /// Geometry built and not yet released.
    pub fn live_geometry(&self) -> usize {
        self.meshes.len()
    }

    pub fn attached_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes
            .keys()
            .filter_map(|h| self.meshes.get(h))
            .map(MeshData::triangle_count)
            .sum()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl RenderBackend for HeadlessRenderer {
    fn build_geometry(&mut self, request: &GeometryRequest) -> GeometryHandle {
        self.next_id += 1;
        let handle = GeometryHandle(self.next_id);
        let mesh = build_deck_mesh(request);
        log::debug!(
            "headless: built {:?} ({} cards, {} triangles)",
            handle,
            request.card_count,
            mesh.triangle_count()
        );
        self.meshes.insert(handle, mesh);
        self.stats.built += 1;
        handle
    }

    fn release_geometry(&mut self, handle: GeometryHandle) {
        if self.meshes.remove(&handle).is_some() {
            self.stats.released += 1;
        } else {
            log::warn!("headless: release of unknown geometry {:?}", handle);
        }
    }
}

impl SceneGraph for HeadlessRenderer {
    fn attach(&mut self, geometry: GeometryHandle, materials: &MaterialSet) {
        let [edge, face, back] = materials.slots();
        self.nodes.insert(
            geometry,
            SceneNode {
                position: Vec3::ZERO,
                material_ids: [edge.id(), face.id(), back.id()],
            },
        );
        self.stats.attached += 1;
    }

    fn detach(&mut self, geometry: GeometryHandle) {
        if self.nodes.remove(&geometry).is_some() {
            self.stats.detached += 1;
        }
    }

    fn set_transform(&mut self, geometry: GeometryHandle, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(&geometry) {
            node.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CardDimensions, Orientation};

    #[test]
    fn build_and_release_balance() {
        let mut renderer = HeadlessRenderer::new();
        let dims = CardDimensions::default();
        let request = GeometryRequest {
            card_count: 3,
            orientation: Orientation::FaceDown,
            jitter_seed: 1,
            layer_step: dims.thickness,
            dims,
        };
        let a = renderer.build_geometry(&request);
        let b = renderer.build_geometry(&request);
        assert_ne!(a, b);
        assert_eq!(renderer.live_geometry(), 2);

        renderer.release_geometry(a);
        renderer.release_geometry(a);
        assert_eq!(renderer.live_geometry(), 1);
        assert_eq!(renderer.stats().released, 1);
        assert_eq!(renderer.mesh(b).map(MeshData::triangle_count), Some(36));
    }
}
