//! Core types: math re-exports, camera, bounding volumes for picking.

pub use glam::{Mat4, Vec2, Vec3, vec3};

pub mod camera;
pub mod spatial;
