//! Renderer seam: the narrow interfaces table entities drive, plus a headless
//! backend that builds CPU meshes and tracks what is attached to the scene.

use cache::ResourceHandle;
use glam::Vec3;

pub mod deck_mesh;
pub mod headless;

pub use headless::HeadlessRenderer;

/// Opaque id of built geometry; doubles as the scene primitive id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(pub u64);

/// Which side of the top card faces the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    FaceUp,
    #[default]
    FaceDown,
}

impl Orientation {
    pub fn from_face_down(face_down: bool) -> Self {
        if face_down {
            Self::FaceDown
        } else {
            Self::FaceUp
        }
    }

    pub fn is_face_down(self) -> bool {
        matches!(self, Self::FaceDown)
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::FaceUp => Self::FaceDown,
            Self::FaceDown => Self::FaceUp,
        }
    }
}

/// Physical card measurements plus the jitter applied when stacking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardDimensions {
    pub width: f32,
    pub height: f32,
    pub thickness: f32,
    /// Horizontal UV extent of the face/back artwork.
    pub uv_split: f32,
    /// Max random yaw per card, degrees.
    pub max_yaw_deg: f32,
    /// Max random horizontal offset per card.
    pub max_offset: f32,
}

impl Default for CardDimensions {
    fn default() -> Self {
        Self {
            width: 0.5,
            height: 0.5 / 0.627_155_2,
            thickness: 0.01,
            uv_split: 0.629,
            max_yaw_deg: 2.0,
            max_offset: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryRequest {
    pub card_count: usize,
    pub orientation: Orientation,
    /// Same seed, same jitter.
    pub jitter_seed: u64,
    /// Vertical distance between stacked cards.
    pub layer_step: f32,
    pub dims: CardDimensions,
}

/// Materials bound to a card-stack primitive, in slot order edge/face/back.
/// A stack whose faces are never shown has no face material and reuses the
/// back in the face slot.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSet {
    pub edge: ResourceHandle,
    pub face: Option<ResourceHandle>,
    pub back: ResourceHandle,
    pub normal: ResourceHandle,
}

impl MaterialSet {
    /// Slot 0 = edge, 1 = face, 2 = back.
    pub fn slots(&self) -> [&ResourceHandle; 3] {
        [
            &self.edge,
            self.face.as_ref().unwrap_or(&self.back),
            &self.back,
        ]
    }
}

/// Geometry construction and disposal.
pub trait RenderBackend {
    fn build_geometry(&mut self, request: &GeometryRequest) -> GeometryHandle;
    fn release_geometry(&mut self, handle: GeometryHandle);
}

/// Attach/detach primitives in the rendered scene.
pub trait SceneGraph {
    fn attach(&mut self, geometry: GeometryHandle, materials: &MaterialSet);
    fn detach(&mut self, geometry: GeometryHandle);
    fn set_transform(&mut self, geometry: GeometryHandle, position: Vec3);
}
