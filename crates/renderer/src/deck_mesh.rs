//! Card-stack geometry: one box per card, merged into a single mesh with
//! three material groups per card (edges, face, back).

use asset::{MeshData, MeshGroup, MeshVertex};
use glam::{Mat4, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{CardDimensions, GeometryRequest, Orientation};

/// Material slot of the four thin sides.
pub const EDGE_SLOT: u32 = 0;
/// Material slot of the card front.
pub const FACE_SLOT: u32 = 1;
/// Material slot of the card back.
pub const BACK_SLOT: u32 = 2;

/// Indices per card box: 6 faces x 2 triangles x 3.
pub const INDICES_PER_CARD: usize = 36;

/// Single card standing in the XY plane, front facing +Z.
pub fn card_box(dims: &CardDimensions) -> MeshData {
    let hw = dims.width / 2.0;
    let hh = dims.height / 2.0;
    let ht = dims.thickness / 2.0;

    let mut mesh = MeshData::default();
    // Sides first so they form one contiguous edge group.
    push_face(&mut mesh, Vec3::X * hw, -Vec3::Z * ht, Vec3::Y * hh, 1.0);
    push_face(&mut mesh, -Vec3::X * hw, Vec3::Z * ht, Vec3::Y * hh, 1.0);
    push_face(&mut mesh, Vec3::Y * hh, Vec3::X * hw, -Vec3::Z * ht, 1.0);
    push_face(&mut mesh, -Vec3::Y * hh, Vec3::X * hw, Vec3::Z * ht, 1.0);
    push_face(&mut mesh, Vec3::Z * ht, Vec3::X * hw, Vec3::Y * hh, dims.uv_split);
    push_face(&mut mesh, -Vec3::Z * ht, -Vec3::X * hw, Vec3::Y * hh, dims.uv_split);

    mesh.groups = vec![
        MeshGroup {
            start: 0,
            count: 24,
            material: EDGE_SLOT,
        },
        MeshGroup {
            start: 24,
            count: 6,
            material: FACE_SLOT,
        },
        MeshGroup {
            start: 30,
            count: 6,
            material: BACK_SLOT,
        },
    ];
    mesh
}

/// Quad centred at `center` spanning `±u` and `±v`; `u × v` is the outward
/// normal so triangles wind counter-clockwise seen from outside.
fn push_face(mesh: &mut MeshData, center: Vec3, u: Vec3, v: Vec3, u_max: f32) {
    let normal = u.cross(v).normalize().to_array();
    let base = mesh.vertices.len() as u32;
    let corners = [
        (center - u - v, [0.0, 0.0]),
        (center + u - v, [u_max, 0.0]),
        (center + u + v, [u_max, 1.0]),
        (center - u + v, [0.0, 1.0]),
    ];
    for (pos, uv) in corners {
        mesh.vertices.push(MeshVertex::new(pos.to_array(), normal, uv));
    }
    mesh.indices
        .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Uniform in `[-max, max]`; zero when `max` is not a positive finite number.
fn jitter(rng: &mut ChaCha8Rng, max: f32) -> f32 {
    if max.is_finite() && max > 0.0 {
        rng.gen_range(-max..=max)
    } else {
        0.0
    }
}

/// Stack `request.card_count` cards on the table plane (y = 0 upwards),
/// each laid flat, jittered in yaw and position.
pub fn build_deck_mesh(request: &GeometryRequest) -> MeshData {
    let dims = &request.dims;
    let template = card_box(dims);
    let mut rng = ChaCha8Rng::seed_from_u64(request.jitter_seed);

    let lay_flat = match request.orientation {
        Orientation::FaceUp => Mat4::from_rotation_x(-90f32.to_radians()),
        Orientation::FaceDown => Mat4::from_rotation_x(90f32.to_radians()),
    };

    let mut deck = MeshData::default();
    for i in 0..request.card_count {
        let yaw = jitter(&mut rng, dims.max_yaw_deg).to_radians();
        let dx = jitter(&mut rng, dims.max_offset);
        let dz = jitter(&mut rng, dims.max_offset);
        let y = request.layer_step * i as f32 + dims.thickness / 2.0;

        let m = Mat4::from_translation(Vec3::new(dx, y, dz)) * Mat4::from_rotation_y(yaw) * lay_flat;
        let mut card = template.clone();
        card.transform(m);
        deck.append(&card);
    }
    deck
}
