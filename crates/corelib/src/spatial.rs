//! Axis-aligned bounding volumes and ray tests used for pointer picking.

use crate::Vec3;

/// Half-line with a normalized direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// `direction` does not need to be normalized; a zero direction yields a
    /// ray that only hits volumes containing `origin`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Slab test. Returns the entry distance along the ray, `0.0` when the
    /// origin is inside the box.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            let lo = aabb.min[axis];
            let hi = aabb.max[axis];

            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }

    #[inline]
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        self.intersect_aabb(aabb).is_some()
    }
}

/// Axis-aligned box, `min <= max` on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Corners may be given in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box spanning `[-half.x, half.x] x [0, height] x [-half.z, half.z]`,
    /// i.e. resting on the table plane.
    pub fn resting(half_width: f32, height: f32, half_depth: f32) -> Self {
        Self::new(
            Vec3::new(-half_width, 0.0, -half_depth),
            Vec3::new(half_width, height, half_depth),
        )
    }

    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Which part of an interactive entity a volume covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    /// The card stack itself.
    Body,
    /// Selection halo drawn around the stack footprint.
    Halo,
}

/// Bounding volumes of one interactive entity, kept in local space and
/// mirrored into world space whenever the entity moves or is rebuilt.
#[derive(Clone, Debug, Default)]
pub struct BoundingSet {
    local: Vec<(VolumeKind, Aabb)>,
    world: Vec<Aabb>,
    position: Vec3,
}

impl BoundingSet {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Insert or replace the volume of the given kind.
    pub fn set_volume(&mut self, kind: VolumeKind, local: Aabb) {
        match self.local.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) => slot.1 = local,
            None => self.local.push((kind, local)),
        }
        self.recompute();
    }

    pub fn remove_volume(&mut self, kind: VolumeKind) {
        self.local.retain(|(k, _)| *k != kind);
        self.recompute();
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recompute();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn world_volumes(&self) -> &[Aabb] {
        &self.world
    }

    pub fn volume(&self, kind: VolumeKind) -> Option<Aabb> {
        self.local
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, aabb)| aabb.translated(self.position))
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }

    /// `true` iff the ray hits any volume. No nearest-hit ordering.
    pub fn hit_test(&self, ray: &Ray) -> bool {
        self.world.iter().any(|aabb| ray.intersects(aabb))
    }

    fn recompute(&mut self) {
        self.world.clear();
        self.world
            .extend(self.local.iter().map(|(_, aabb)| aabb.translated(self.position)));
    }
}
