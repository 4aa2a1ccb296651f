//! Per-corner ambient occlusion and light.
//!
//! Every face corner looks at three cells of its voxel's 3x3x3 neighborhood
//! (the diagonal corner cell and the two edge cells touching it) to pick one
//! of four occlusion levels, then adds the average shade of the four cells
//! around the corner. Light is the average of the same four cells, except
//! that a voxel sitting on a full-intensity source is always fully lit.

use super::grid::Neighborhood;
use crate::engine_state::voxels::door_index::CornerValues;

/// Corner, first edge and second edge cell of each face corner.
const LOOKUP3: [[[usize; 3]; 4]; 6] = [
    [[0, 1, 3], [2, 1, 5], [6, 3, 7], [8, 5, 7]],
    [[18, 19, 21], [20, 19, 23], [24, 21, 25], [26, 23, 25]],
    [[6, 7, 15], [8, 7, 17], [24, 15, 25], [26, 17, 25]],
    [[0, 1, 9], [2, 1, 11], [18, 9, 19], [20, 11, 19]],
    [[0, 3, 9], [6, 3, 15], [18, 9, 21], [24, 15, 21]],
    [[2, 5, 11], [8, 5, 17], [20, 11, 23], [26, 17, 23]],
];

/// The four cells sharing each face corner.
const LOOKUP4: [[[usize; 4]; 4]; 6] = [
    [[0, 1, 3, 4], [1, 2, 4, 5], [3, 4, 6, 7], [4, 5, 7, 8]],
    [[18, 19, 21, 22], [19, 20, 22, 23], [21, 22, 24, 25], [22, 23, 25, 26]],
    [[6, 7, 15, 16], [7, 8, 16, 17], [15, 16, 24, 25], [16, 17, 25, 26]],
    [[0, 1, 9, 10], [1, 2, 10, 11], [9, 10, 18, 19], [10, 11, 19, 20]],
    [[0, 3, 9, 12], [3, 6, 12, 15], [9, 12, 18, 21], [12, 15, 21, 24]],
    [[2, 5, 11, 14], [5, 8, 14, 17], [11, 14, 20, 23], [14, 17, 23, 26]],
];

const CURVE: [f32; 4] = [0.0, 0.25, 0.5, 0.75];

/// Index of the voxel itself within a `Neighborhood`.
const CENTER: usize = 13;

/// Light level of a full-intensity source.
const FULL_LIGHT: u8 = 15;

/// Computes occlusion and light for all 24 face corners of a voxel.
///
/// # Returns
/// `(ao, light)`, both indexed `[face][corner]` in `BlockSide` order.
pub(crate) fn occlusion(samples: &Neighborhood) -> (CornerValues, CornerValues) {
    let mut ao = [[0.0; 4]; 6];
    let mut light = [[0.0; 4]; 6];
    let is_light = samples.lights[CENTER] == FULL_LIGHT;
    for face in 0..6 {
        for corner in 0..4 {
            let [c, s1, s2] = LOOKUP3[face][corner];
            let corner_cell = samples.opaque[c] as usize;
            let side1 = samples.opaque[s1];
            let side2 = samples.opaque[s2];
            let value = if side1 && side2 {
                3
            } else {
                corner_cell + side1 as usize + side2 as usize
            };

            let cells = LOOKUP4[face][corner];
            let shade_sum: f32 = cells.iter().map(|&i| samples.shades[i]).sum();
            let mut light_sum: f32 = cells.iter().map(|&i| f32::from(samples.lights[i])).sum();
            if is_light {
                light_sum = 15.0 * 4.0 * 10.0;
            }

            ao[face][corner] = (CURVE[value] + shade_sum / 4.0).min(1.0);
            light[face][corner] = light_sum / 15.0 / 4.0;
        }
    }
    (ao, light)
}
