//! Face emission shared by every block shape, plus cube, slab and plant
//! geometry.
//!
//! Geometry is described as axis-aligned cuboids in block-local space
//! (`-1..=1` on each axis, scaled by half a block). A cuboid expands to six
//! faces of four corners each, always in the same corner order, so one set
//! of triangulation tables and one per-corner occlusion layout serve cubes,
//! slabs, doors and fence parts alike.
//!
//! Texture coordinates are given as fractions of a tile and mapped into the
//! 16x16 tile atlas with a half-texel inset on every edge.

use cgmath::{Deg, Matrix3, Vector3};

use crate::engine_state::rendering::vertex::Vertex;
use crate::engine_state::voxels::block::block_side::{BlockSide, FaceVisibility};
use crate::engine_state::voxels::block::{block_tiles, plant_tile};
use crate::engine_state::voxels::door_index::CornerValues;

/// Four corners of one face.
pub(crate) type FaceCorners = [[f32; 3]; 4];

/// Six faces of one cuboid, in `BlockSide` order.
pub(crate) type CuboidFaces = [FaceCorners; 6];

/// Tile-fraction texture coordinates for every corner of every face.
pub(crate) type FaceUvs = [[[f32; 2]; 4]; 6];

/// Width of one atlas tile.
const TILE: f32 = 0.0625;

/// Inset from the tile edge, half an atlas texel.
const INSET: f32 = 1.0 / 2048.0;

/// Corner order of the two triangles of each face.
const INDICES: [[usize; 6]; 6] = [
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
];

/// Triangulation along the other diagonal, used when it hides an
/// occlusion gradient better.
const FLIPPED: [[usize; 6]; 6] = [
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
];

/// Texture orientation of a full cube.
const CUBE_UVS: FaceUvs = [
    [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
    [[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
    [[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]],
    [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
    [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
    [[1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [0.0, 1.0]],
];

/// Block-local coordinate of each sixteenth along an axis, `P[k] = -1 + k/8`.
pub(crate) const P: [f32; 17] = [
    -1.0, -0.875, -0.75, -0.625, -0.5, -0.375, -0.25, -0.125, 0.0, 0.125, 0.25, 0.375, 0.5,
    0.625, 0.75, 0.875, 1.0,
];

/// Expands two opposite corners into six faces.
///
/// The minimum corner need not be smaller on every axis; faces are taken
/// from `min` for the negative sides and `max` for the positive ones.
pub(crate) const fn cuboid_faces(min: [f32; 3], max: [f32; 3]) -> CuboidFaces {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    [
        [[x0, y0, z0], [x0, y0, z1], [x0, y1, z0], [x0, y1, z1]],
        [[x1, y0, z0], [x1, y0, z1], [x1, y1, z0], [x1, y1, z1]],
        [[x0, y1, z0], [x0, y1, z1], [x1, y1, z0], [x1, y1, z1]],
        [[x0, y0, z0], [x0, y0, z1], [x1, y0, z0], [x1, y0, z1]],
        [[x0, y0, z0], [x0, y1, z0], [x1, y0, z0], [x1, y1, z0]],
        [[x0, y0, z1], [x0, y1, z1], [x1, y0, z1], [x1, y1, z1]],
    ]
}

/// Maps a tile fraction into the inset range of a tile.
pub(crate) fn tile_fraction(f: f32) -> f32 {
    INSET + f * (TILE - 2.0 * INSET)
}

/// Atlas origin of a tile.
fn tile_origin(tile: i32) -> (f32, f32) {
    let tile = tile.max(0);
    ((tile % 16) as f32 * TILE, (tile / 16) as f32 * TILE)
}

/// Per-voxel inputs every shape generator consumes.
#[derive(Copy, Clone, Debug)]
pub(crate) struct FaceInput<'a> {
    pub ao: &'a CornerValues,
    pub light: &'a CornerValues,
    pub faces: &'a FaceVisibility,
    /// World position of the voxel center.
    pub center: [f32; 3],
    /// Half the block size.
    pub n: f32,
}

/// Appends the visible faces of one cuboid.
pub(crate) fn emit_faces(
    out: &mut Vec<Vertex>,
    input: &FaceInput<'_>,
    tiles: &[i32; 6],
    positions: &CuboidFaces,
    uvs: &FaceUvs,
) {
    for side in BlockSide::all() {
        let i = side as usize;
        if !input.faces[i] {
            continue;
        }
        let (du, dv) = tile_origin(tiles[i]);
        let ao = input.ao[i];
        let light = input.light[i];
        let flip = ao[0] + ao[3] > ao[1] + ao[2];
        let order = if flip { &FLIPPED[i] } else { &INDICES[i] };
        for &j in order {
            let [px, py, pz] = positions[i][j];
            out.push(Vertex::new(
                [
                    input.center[0] + input.n * px,
                    input.center[1] + input.n * py,
                    input.center[2] + input.n * pz,
                ],
                side.normal(),
                [du + tile_fraction(uvs[i][j][0]), dv + tile_fraction(uvs[i][j][1])],
                ao[j],
                light[j],
            ));
        }
    }
}

/// Appends the visible faces of a full cube of block `w`.
pub(crate) fn make_cube(out: &mut Vec<Vertex>, input: &FaceInput<'_>, w: i32) {
    const POSITIONS: CuboidFaces = cuboid_faces([-1.0; 3], [1.0; 3]);
    emit_faces(out, input, &block_tiles(w), &POSITIONS, &CUBE_UVS);
}

/// Appends the visible faces of a slab `height` sixteenths tall.
///
/// Side faces show the lower part of the tile so the texture is cropped
/// rather than squashed.
pub(crate) fn make_slab(out: &mut Vec<Vertex>, input: &FaceInput<'_>, w: i32, height: u8) {
    let h = f32::from(height) / 16.0;
    let positions = cuboid_faces([-1.0; 3], [1.0, 2.0 * h - 1.0, 1.0]);
    let mut uvs = CUBE_UVS;
    for side in [BlockSide::LEFT, BlockSide::RIGHT, BlockSide::FRONT, BlockSide::BACK] {
        for corner in uvs[side as usize].iter_mut() {
            corner[1] *= h;
        }
    }
    emit_faces(out, input, &block_tiles(w), &positions, &uvs);
}

/// Appends the four crossed quads of plant `w`, rotated `rotation` degrees
/// around the vertical axis.
pub(crate) fn make_plant(
    out: &mut Vec<Vertex>,
    center: [f32; 3],
    n: f32,
    w: i32,
    ao: f32,
    light: f32,
    rotation: f32,
) {
    const POSITIONS: [FaceCorners; 4] = [
        [[0.0, -1.0, -1.0], [0.0, -1.0, 1.0], [0.0, 1.0, -1.0], [0.0, 1.0, 1.0]],
        [[0.0, -1.0, -1.0], [0.0, -1.0, 1.0], [0.0, 1.0, -1.0], [0.0, 1.0, 1.0]],
        [[-1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]],
        [[-1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]],
    ];
    const SIDES: [BlockSide; 4] = [
        BlockSide::LEFT,
        BlockSide::RIGHT,
        BlockSide::FRONT,
        BlockSide::BACK,
    ];
    const UVS: [[[f32; 2]; 4]; 4] = [
        [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
        [[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
        [[1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [0.0, 1.0]],
    ];

    let rotate = Matrix3::from_angle_y(Deg(rotation));
    let center = Vector3::from(center);
    let (du, dv) = tile_origin(plant_tile(w));
    for (i, side) in SIDES.into_iter().enumerate() {
        let normal = rotate * Vector3::from(side.normal());
        for &j in &INDICES[i] {
            let position = center + rotate * (Vector3::from(POSITIONS[i][j]) * n);
            out.push(Vertex::new(
                position.into(),
                normal.into(),
                [du + tile_fraction(UVS[i][j][0]), dv + tile_fraction(UVS[i][j][1])],
                ao,
                light,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NO_AO: CornerValues = [[0.0; 4]; 6];

    fn input<'a>(faces: &'a FaceVisibility) -> FaceInput<'a> {
        FaceInput {
            ao: &NO_AO,
            light: &NO_AO,
            faces,
            center: [3.0, 5.0, 7.0],
            n: 0.5,
        }
    }

    #[test]
    fn cube_emits_six_vertices_per_visible_face() {
        let faces = [true, false, true, false, false, true];
        let mut out = Vec::new();
        make_cube(&mut out, &input(&faces), 3);
        assert_eq!(out.len(), 18);
        for vertex in &out[6..12] {
            assert_relative_eq!(vertex.position[1], 5.5);
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn slab_top_sits_at_its_height() {
        let faces = [false, false, true, false, false, false];
        let mut out = Vec::new();
        make_slab(&mut out, &input(&faces), 3, 8);
        assert_eq!(out.len(), 6);
        for vertex in &out {
            assert_relative_eq!(vertex.position[1], 5.0);
        }
    }

    #[test]
    fn uvs_stay_inside_the_tile() {
        let faces = [true; 6];
        let mut out = Vec::new();
        make_cube(&mut out, &input(&faces), 1);
        for vertex in &out {
            let u = vertex.uv[0] % TILE;
            let v = vertex.uv[1] % TILE;
            assert!(u > 0.0 && u < TILE);
            assert!(v > 0.0 && v < TILE);
        }
    }

    #[test]
    fn occluded_diagonal_flips_triangulation() {
        let mut ao = NO_AO;
        ao[0] = [1.0, 0.0, 0.0, 1.0];
        let faces = [true, false, false, false, false, false];
        let input = FaceInput {
            ao: &ao,
            ..input(&faces)
        };
        let mut out = Vec::new();
        make_cube(&mut out, &input, 3);
        let corner_ao: Vec<f32> = out.iter().map(|v| v.ao).collect();
        assert_eq!(corner_ao, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn plant_quads_are_rotated_around_the_center() {
        let mut out = Vec::new();
        make_plant(&mut out, [0.0, 0.0, 0.0], 0.5, 17, 0.25, 0.5, 90.0);
        assert_eq!(out.len(), 24);
        // the first quad lies in the x = 0 plane before rotation
        for vertex in &out[..6] {
            assert_relative_eq!(vertex.position[2], 0.0, epsilon = 1e-6);
            assert_relative_eq!(vertex.ao, 0.25);
        }
    }

    #[test]
    fn cuboid_faces_follow_corner_order() {
        let faces = cuboid_faces([P[14], -1.0, -1.0], [1.0, 1.0, 1.0]);
        assert_eq!(faces[0][0], [0.75, -1.0, -1.0]);
        assert_eq!(faces[0][3], [0.75, 1.0, 1.0]);
        assert_eq!(faces[4][1], [0.75, 1.0, -1.0]);
    }
}
