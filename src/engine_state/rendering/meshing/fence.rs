//! Fence and gate geometry.
//!
//! Fences are assembled from a central post plus thin slats, all given in
//! sixteenths of a block. Each fence shape has a small set of rotations; a
//! gate has a closed and an open layout for each of its two orientations.
//! Every cuboid emits all six faces, since slats never align with the
//! neighbor grid the culling pass works on.

use super::cube::{cuboid_faces, emit_faces, CuboidFaces, FaceInput, FaceUvs, P};
use crate::engine_state::rendering::vertex::Vertex;
use crate::engine_state::voxels::block::shape::Shape;
use crate::engine_state::voxels::block::{block_tiles, is_open};

/// A cuboid from sixteenth coordinates.
const fn part(min: [usize; 3], max: [usize; 3]) -> CuboidFaces {
    cuboid_faces(
        [P[min[0]], P[min[1]], P[min[2]]],
        [P[max[0]], P[max[1]], P[max[2]]],
    )
}

const POST: CuboidFaces = part([6, 0, 6], [10, 16, 10]);

const SLAT1: CuboidFaces = part([7, 4, 10], [9, 6, 16]);
const SLAT2: CuboidFaces = part([7, 8, 10], [9, 10, 16]);
const SLAT3: CuboidFaces = part([7, 12, 10], [9, 14, 16]);
const SLAT4: CuboidFaces = part([7, 4, 0], [9, 6, 6]);
const SLAT5: CuboidFaces = part([7, 8, 0], [9, 10, 6]);
const SLAT6: CuboidFaces = part([7, 12, 0], [9, 14, 6]);

const SLATX1: CuboidFaces = part([0, 4, 7], [7, 6, 9]);
const SLATX2: CuboidFaces = part([0, 8, 7], [7, 10, 9]);
const SLATX3: CuboidFaces = part([0, 12, 7], [7, 14, 9]);
const SLATX4: CuboidFaces = part([10, 4, 7], [16, 6, 9]);
const SLATX5: CuboidFaces = part([10, 8, 7], [16, 10, 9]);
const SLATX6: CuboidFaces = part([10, 12, 7], [16, 14, 9]);

const GATEPOST1: CuboidFaces = part([7, 0, 0], [9, 16, 2]);
const GATEPOST2: CuboidFaces = part([7, 0, 14], [9, 16, 16]);
const GATESLAT1: CuboidFaces = part([7, 4, 10], [9, 6, 14]);
const GATESLAT2: CuboidFaces = part([7, 8, 10], [9, 10, 14]);
const GATESLAT3: CuboidFaces = part([7, 12, 10], [9, 14, 14]);
const GATESLAT4: CuboidFaces = part([7, 4, 2], [9, 6, 6]);
const GATESLAT5: CuboidFaces = part([7, 8, 2], [9, 10, 6]);
const GATESLAT6: CuboidFaces = part([7, 12, 2], [9, 14, 6]);
const GATEMID1: CuboidFaces = part([7, 5, 9], [9, 13, 10]);
const GATEMID2: CuboidFaces = part([7, 5, 6], [9, 13, 7]);

const GATEPOSTX1: CuboidFaces = part([2, 0, 9], [0, 16, 7]);
const GATEPOSTX2: CuboidFaces = part([14, 0, 7], [16, 16, 9]);
const GATESLATX1: CuboidFaces = part([2, 4, 7], [7, 6, 9]);
const GATESLATX2: CuboidFaces = part([2, 8, 7], [7, 10, 9]);
const GATESLATX3: CuboidFaces = part([2, 12, 7], [7, 14, 9]);
const GATESLATX4: CuboidFaces = part([10, 4, 7], [14, 6, 9]);
const GATESLATX5: CuboidFaces = part([10, 8, 7], [14, 10, 9]);
const GATESLATX6: CuboidFaces = part([10, 12, 7], [14, 14, 9]);
const GATEMIDX1: CuboidFaces = part([9, 5, 7], [10, 13, 9]);
const GATEMIDX2: CuboidFaces = part([7, 5, 7], [8, 13, 9]);

const GATESLAT1_OPEN: CuboidFaces = part([2, 4, 0], [7, 6, 2]);
const GATESLAT2_OPEN: CuboidFaces = part([2, 8, 0], [7, 10, 2]);
const GATESLAT3_OPEN: CuboidFaces = part([2, 12, 0], [7, 14, 2]);
const GATESLAT4_OPEN: CuboidFaces = part([2, 4, 14], [7, 6, 16]);
const GATESLAT5_OPEN: CuboidFaces = part([2, 8, 14], [7, 10, 16]);
const GATESLAT6_OPEN: CuboidFaces = part([2, 12, 14], [7, 14, 16]);
const GATEMID1_OPEN: CuboidFaces = part([1, 5, 0], [2, 13, 2]);
const GATEMID2_OPEN: CuboidFaces = part([1, 5, 14], [2, 13, 16]);

const GATESLATX1_OPEN: CuboidFaces = part([0, 4, 2], [2, 6, 7]);
const GATESLATX2_OPEN: CuboidFaces = part([0, 8, 2], [2, 10, 7]);
const GATESLATX3_OPEN: CuboidFaces = part([0, 12, 2], [2, 14, 7]);
const GATESLATX4_OPEN: CuboidFaces = part([14, 4, 2], [16, 6, 7]);
const GATESLATX5_OPEN: CuboidFaces = part([14, 8, 2], [16, 10, 7]);
const GATESLATX6_OPEN: CuboidFaces = part([14, 12, 2], [16, 14, 7]);
const GATEMIDX1_OPEN: CuboidFaces = part([0, 5, 1], [2, 13, 2]);
const GATEMIDX2_OPEN: CuboidFaces = part([14, 5, 1], [16, 13, 2]);

const FENCE_POST: [&[CuboidFaces]; 1] = [&[POST]];

const FENCE_HALF: [&[CuboidFaces]; 4] = [
    &[POST, SLAT1, SLAT2, SLAT3],
    &[POST, SLAT4, SLAT5, SLAT6],
    &[POST, SLATX1, SLATX2, SLATX3],
    &[POST, SLATX4, SLATX5, SLATX6],
];

const FENCE: [&[CuboidFaces]; 2] = [
    &[POST, SLAT1, SLAT2, SLAT3, SLAT4, SLAT5, SLAT6],
    &[POST, SLATX1, SLATX2, SLATX3, SLATX4, SLATX5, SLATX6],
];

const FENCE_L: [&[CuboidFaces]; 4] = [
    &[POST, SLAT1, SLAT2, SLAT3, SLATX1, SLATX2, SLATX3],
    &[POST, SLATX1, SLATX2, SLATX3, SLAT4, SLAT5, SLAT6],
    &[POST, SLAT1, SLAT2, SLAT3, SLATX4, SLATX5, SLATX6],
    &[POST, SLAT4, SLAT5, SLAT6, SLATX4, SLATX5, SLATX6],
];

const FENCE_T: [&[CuboidFaces]; 4] = [
    &[
        POST, SLAT1, SLAT2, SLAT3, SLATX1, SLATX2, SLATX3, SLAT4, SLAT5, SLAT6,
    ],
    &[
        POST, SLATX1, SLATX2, SLATX3, SLAT1, SLAT2, SLAT3, SLATX4, SLATX5, SLATX6,
    ],
    &[
        POST, SLAT1, SLAT2, SLAT3, SLAT4, SLAT5, SLAT6, SLATX4, SLATX5, SLATX6,
    ],
    &[
        POST, SLAT4, SLAT5, SLAT6, SLATX4, SLATX5, SLATX6, SLATX1, SLATX2, SLATX3,
    ],
];

const FENCE_X: [&[CuboidFaces]; 1] = [&[
    POST, SLAT1, SLAT2, SLAT3, SLAT4, SLAT5, SLAT6, SLATX1, SLATX2, SLATX3, SLATX4, SLATX5,
    SLATX6,
]];

/// Closed Z, closed X, then open Z and open X layouts.
const GATE: [&[CuboidFaces]; 4] = [
    &[
        GATEPOST1, GATEPOST2, GATESLAT1, GATESLAT2, GATESLAT3, GATESLAT4, GATESLAT5, GATESLAT6,
        GATEMID1, GATEMID2,
    ],
    &[
        GATEPOSTX1, GATEPOSTX2, GATESLATX1, GATESLATX2, GATESLATX3, GATESLATX4, GATESLATX5,
        GATESLATX6, GATEMIDX1, GATEMIDX2,
    ],
    &[
        GATEPOST1,
        GATEPOST2,
        GATESLAT1_OPEN,
        GATESLAT2_OPEN,
        GATESLAT3_OPEN,
        GATESLAT4_OPEN,
        GATESLAT5_OPEN,
        GATESLAT6_OPEN,
        GATEMID1_OPEN,
        GATEMID2_OPEN,
    ],
    &[
        GATEPOSTX1,
        GATEPOSTX2,
        GATESLATX1_OPEN,
        GATESLATX2_OPEN,
        GATESLATX3_OPEN,
        GATESLATX4_OPEN,
        GATESLATX5_OPEN,
        GATESLATX6_OPEN,
        GATEMIDX1_OPEN,
        GATEMIDX2_OPEN,
    ],
];

/// Number of closed gate orientations.
const GATE_ROTATIONS: usize = 2;

/// Side faces sample half the tile height.
const FENCE_UVS: FaceUvs = [
    [[0.0, 0.0], [1.0, 0.0], [0.0, 0.5], [1.0, 0.5]],
    [[1.0, 0.0], [0.0, 0.0], [1.0, 0.5], [0.0, 0.5]],
    [[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]],
    [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
    [[0.0, 0.0], [0.0, 0.5], [1.0, 0.0], [1.0, 0.5]],
    [[1.0, 0.0], [1.0, 0.5], [0.0, 0.0], [0.0, 0.5]],
];

fn layouts(shape: Shape) -> &'static [&'static [CuboidFaces]] {
    match shape {
        Shape::FencePost => &FENCE_POST,
        Shape::FenceHalf => &FENCE_HALF,
        Shape::Fence => &FENCE,
        Shape::FenceL => &FENCE_L,
        Shape::FenceT => &FENCE_T,
        Shape::FenceX => &FENCE_X,
        Shape::Gate => &GATE,
        _ => &[],
    }
}

/// Faces a fence shape emits, independent of rotation.
pub(crate) fn fence_face_count(shape: Shape) -> usize {
    layouts(shape).first().map_or(0, |parts| parts.len() * 6)
}

/// Picks the layout for a rotation, clamped to what the shape offers.
fn layout(shape: Shape, extra: i32, rotate: i32) -> Option<&'static [CuboidFaces]> {
    let layouts = layouts(shape);
    if layouts.is_empty() {
        return None;
    }
    let rotate = rotate.max(0) as usize;
    let index = if shape == Shape::Gate {
        let base = rotate.min(GATE_ROTATIONS - 1);
        if is_open(extra) {
            base + GATE_ROTATIONS
        } else {
            base
        }
    } else {
        rotate.min(layouts.len() - 1)
    };
    layouts.get(index).copied()
}

/// Appends every face of a fence or gate of block `w`.
///
/// Face visibility in `input` is ignored; all faces are emitted.
///
/// # Arguments
/// * `shape` - One of the fence shapes
/// * `extra` - Extra bits, read for a gate's open state
/// * `rotate` - Rotation from the transform channel
pub(crate) fn make_fence(
    out: &mut Vec<Vertex>,
    input: &FaceInput<'_>,
    w: i32,
    shape: Shape,
    extra: i32,
    rotate: i32,
) {
    let Some(parts) = layout(shape, extra, rotate) else {
        return;
    };
    let faces = [true; 6];
    let input = FaceInput {
        faces: &faces,
        ..*input
    };
    let tiles = block_tiles(w);
    for positions in parts {
        emit_faces(out, &input, &tiles, positions, &FENCE_UVS);
    }
}
