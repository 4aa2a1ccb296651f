//! Door geometry.
//!
//! A door half is a thin panel two sixteenths deep standing against one of
//! the four vertical faces of its block. The transform channel picks which
//! face the panel closes against and whether its texture is mirrored;
//! opening the door swings the panel to the adjacent face around the hinge.

use super::cube::{cuboid_faces, emit_faces, CuboidFaces, FaceInput, FaceUvs, P};
use crate::engine_state::rendering::vertex::Vertex;
use crate::engine_state::voxels::block::shape::{
    Shape, DOOR_X, DOOR_X_FLIP, DOOR_X_PLUS, DOOR_X_PLUS_FLIP, DOOR_Z, DOOR_Z_FLIP, DOOR_Z_PLUS,
    DOOR_Z_PLUS_FLIP,
};
use crate::engine_state::voxels::block::{door_tiles, is_open};

/// Panel positions against the +X, -Z, +Z and -X faces.
const MODELS: [CuboidFaces; 4] = [
    cuboid_faces([P[14], P[0], P[0]], [P[16], P[16], P[16]]),
    cuboid_faces([P[0], P[0], P[0]], [P[16], P[16], P[2]]),
    cuboid_faces([P[0], P[0], P[14]], [P[16], P[16], P[16]]),
    cuboid_faces([P[0], P[0], P[0]], [P[2], P[16], P[16]]),
];

/// Start of the panel edge strip within the tile.
const EDGE: f32 = 0.875;

/// Texture layouts, one per panel orientation and mirroring.
const UVS: [FaceUvs; 4] = [
    [
        [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
        [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
        [[EDGE, 1.0], [EDGE, 0.0], [1.0, 1.0], [1.0, 0.0]],
        [[EDGE, 0.0], [EDGE, 1.0], [1.0, 0.0], [1.0, 1.0]],
        [[EDGE, 0.0], [EDGE, 1.0], [1.0, 0.0], [1.0, 1.0]],
        [[1.0, 0.0], [1.0, 1.0], [EDGE, 0.0], [EDGE, 1.0]],
    ],
    [
        [[EDGE, 0.0], [1.0, 0.0], [EDGE, 1.0], [1.0, 1.0]],
        [[1.0, 0.0], [EDGE, 0.0], [1.0, 1.0], [EDGE, 1.0]],
        [[0.0, 1.0], [0.0, EDGE], [1.0, 1.0], [1.0, EDGE]],
        [[0.0, EDGE], [0.0, 1.0], [1.0, EDGE], [1.0, 1.0]],
        [[1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [0.0, 1.0]],
        [[1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [0.0, 1.0]],
    ],
    [
        [[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        [[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        [[EDGE, 1.0], [EDGE, 0.0], [1.0, 1.0], [1.0, 0.0]],
        [[EDGE, 0.0], [EDGE, 1.0], [1.0, 0.0], [1.0, 1.0]],
        [[EDGE, 0.0], [EDGE, 1.0], [1.0, 0.0], [1.0, 1.0]],
        [[1.0, 0.0], [1.0, 1.0], [EDGE, 0.0], [EDGE, 1.0]],
    ],
    [
        [[EDGE, 0.0], [1.0, 0.0], [EDGE, 1.0], [1.0, 1.0]],
        [[1.0, 0.0], [EDGE, 0.0], [1.0, 1.0], [EDGE, 1.0]],
        [[0.0, 1.0], [0.0, EDGE], [1.0, 1.0], [1.0, EDGE]],
        [[0.0, EDGE], [0.0, 1.0], [1.0, EDGE], [1.0, 1.0]],
        [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
        [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
    ],
];

/// Transforms mapped to each panel model while closed.
const MODEL_CLOSED: [[i32; 2]; 4] = [
    [DOOR_X_PLUS, DOOR_X_PLUS_FLIP],
    [DOOR_Z, DOOR_Z_FLIP],
    [DOOR_Z_PLUS, DOOR_Z_PLUS_FLIP],
    [DOOR_X, DOOR_X_FLIP],
];

/// Transforms mapped to each panel model while open.
const MODEL_OPEN: [[i32; 2]; 4] = [
    [DOOR_Z, DOOR_Z_PLUS_FLIP],
    [DOOR_X, DOOR_X_PLUS_FLIP],
    [DOOR_X_PLUS, DOOR_X_FLIP],
    [DOOR_Z_PLUS, DOOR_Z_FLIP],
];

/// Transforms mapped to each texture layout while closed.
const UVS_CLOSED: [[i32; 2]; 4] = [
    [DOOR_X_PLUS, DOOR_X_FLIP],
    [DOOR_Z_PLUS, DOOR_Z_FLIP],
    [DOOR_X, DOOR_X_PLUS_FLIP],
    [DOOR_Z, DOOR_Z_PLUS_FLIP],
];

/// Transforms mapped to each texture layout while open.
const UVS_OPEN: [[i32; 2]; 4] = [
    [DOOR_Z_PLUS, DOOR_Z_PLUS_FLIP],
    [DOOR_X, DOOR_X_FLIP],
    [DOOR_Z, DOOR_Z_FLIP],
    [DOOR_X_PLUS, DOOR_X_PLUS_FLIP],
];

/// First row of `table` containing `transform`, `0` when none does.
fn lookup(table: &[[i32; 2]; 4], transform: i32) -> usize {
    table
        .iter()
        .position(|row| row.contains(&transform))
        .unwrap_or(0)
}

/// Appends the visible faces of one door half.
///
/// # Arguments
/// * `w` - Door material
/// * `shape` - Which half; selects the lower or upper door tile
/// * `extra` - Extra bits, read for the open state
/// * `transform` - One of the `DOOR_*` transforms
pub(crate) fn make_door(
    out: &mut Vec<Vertex>,
    input: &FaceInput<'_>,
    w: i32,
    shape: Shape,
    extra: i32,
    transform: i32,
) {
    let (lower, upper) = door_tiles(w);
    let tile = if shape == Shape::LowerDoor { lower } else { upper };
    let (models, uvs) = if is_open(extra) {
        (&MODEL_OPEN, &UVS_OPEN)
    } else {
        (&MODEL_CLOSED, &UVS_CLOSED)
    };
    emit_faces(
        out,
        input,
        &[tile; 6],
        &MODELS[lookup(models, transform)],
        &UVS[lookup(uvs, transform)],
    );
}
