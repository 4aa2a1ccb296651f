//! Dense padded grid the mesh builder rasterizes a neighborhood into.
//!
//! The grid spans three chunks plus a one-voxel border on each horizontal
//! side and the full world height plus one layer above and below, so every
//! axis neighbor of a center-chunk voxel has a cell.

use bitvec::prelude::BitVec;
use cgmath::Point3;

use crate::engine_state::voxels::chunk::{CHUNK_SIZE, WORLD_HEIGHT};

/// Width and depth of the grid.
pub(crate) const XZ_SIZE: i32 = CHUNK_SIZE * 3 + 2;

/// Lowest horizontal cell light may still reach the center chunk from.
pub(crate) const XZ_LO: i32 = CHUNK_SIZE;

/// Highest horizontal cell light may still reach the center chunk from.
pub(crate) const XZ_HI: i32 = CHUNK_SIZE * 2 + 1;

/// Height of the grid.
pub(crate) const Y_SIZE: i32 = WORLD_HEIGHT + 2;

/// Opacity, light and shade samples around one voxel, indexed
/// `(dx + 1) * 9 + (dy + 1) * 3 + (dz + 1)`.
#[derive(Clone, Debug)]
pub(crate) struct Neighborhood {
    pub opaque: [bool; 27],
    pub lights: [u8; 27],
    pub shades: [f32; 27],
}

pub(crate) struct Grid {
    origin: Point3<i32>,
    opaque: BitVec,
    light: Vec<u8>,
    highest: Vec<i32>,
}

impl Grid {
    /// Creates an empty grid centered on chunk `(p, q)`.
    pub fn new(p: i32, q: i32) -> Self {
        let cells = (XZ_SIZE * XZ_SIZE * Y_SIZE) as usize;
        Grid {
            origin: Point3::new(
                p * CHUNK_SIZE - CHUNK_SIZE - 1,
                -1,
                q * CHUNK_SIZE - CHUNK_SIZE - 1,
            ),
            opaque: BitVec::repeat(false, cells),
            light: vec![0; cells],
            highest: vec![0; (XZ_SIZE * XZ_SIZE) as usize],
        }
    }

    /// Converts a world position to grid cells.
    ///
    /// # Returns
    /// `None` when the position falls outside the grid.
    pub fn local(&self, x: i32, y: i32, z: i32) -> Option<Point3<i32>> {
        let cell = Point3::new(x - self.origin.x, y - self.origin.y, z - self.origin.z);
        in_bounds(cell.x, cell.y, cell.z).then_some(cell)
    }

    pub fn is_opaque(&self, x: i32, y: i32, z: i32) -> bool {
        in_bounds(x, y, z) && self.opaque[xyz(x, y, z)]
    }

    pub fn set_opaque(&mut self, x: i32, y: i32, z: i32, opaque: bool) {
        if !in_bounds(x, y, z) {
            return;
        }
        self.opaque.set(xyz(x, y, z), opaque);
        if opaque {
            let column = &mut self.highest[xz(x, z)];
            *column = (*column).max(y);
        }
    }

    pub fn light(&self, x: i32, y: i32, z: i32) -> u8 {
        if in_bounds(x, y, z) {
            self.light[xyz(x, y, z)]
        } else {
            0
        }
    }

    pub fn set_light(&mut self, x: i32, y: i32, z: i32, w: u8) {
        if in_bounds(x, y, z) {
            self.light[xyz(x, y, z)] = w;
        }
    }

    /// Highest opaque cell of a column, `0` when the column is empty.
    pub fn highest(&self, x: i32, z: i32) -> i32 {
        if (0..XZ_SIZE).contains(&x) && (0..XZ_SIZE).contains(&z) {
            self.highest[xz(x, z)]
        } else {
            0
        }
    }

    /// Samples the 3x3x3 cells around grid cell `(x, y, z)`.
    ///
    /// A cell at or below its column's highest opaque cell is shaded by the
    /// nearest opaque cell above it, `1.0` when the cell itself is opaque
    /// and `0.125` less per layer of separation, up to seven layers.
    pub fn neighborhood(&self, x: i32, y: i32, z: i32) -> Neighborhood {
        let mut samples = Neighborhood {
            opaque: [false; 27],
            lights: [0; 27],
            shades: [0.0; 27],
        };
        let mut index = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                    samples.opaque[index] = self.is_opaque(nx, ny, nz);
                    samples.lights[index] = self.light(nx, ny, nz);
                    if ny <= self.highest(nx, nz) {
                        if let Some(oy) = (0..8).find(|&oy| self.is_opaque(nx, ny + oy, nz)) {
                            samples.shades[index] = 1.0 - oy as f32 * 0.125;
                        }
                    }
                    index += 1;
                }
            }
        }
        samples
    }
}

fn in_bounds(x: i32, y: i32, z: i32) -> bool {
    (0..XZ_SIZE).contains(&x) && (0..Y_SIZE).contains(&y) && (0..XZ_SIZE).contains(&z)
}

fn xyz(x: i32, y: i32, z: i32) -> usize {
    (y * XZ_SIZE * XZ_SIZE + x * XZ_SIZE + z) as usize
}

fn xz(x: i32, z: i32) -> usize {
    (x * XZ_SIZE + z) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn local_cells_are_offset_by_one_chunk_and_border() {
        let grid = Grid::new(2, -1);
        assert_eq!(grid.local(32, 0, -16), Some(Point3::new(17, 1, 17)));
        assert_eq!(grid.local(15, -1, -33), Some(Point3::new(0, 0, 0)));
        assert_eq!(grid.local(14, 0, 0), None);
        assert_eq!(grid.local(32, 257, 0), None);
    }

    #[test]
    fn opacity_tracks_column_height() {
        let mut grid = Grid::new(0, 0);
        grid.set_opaque(20, 10, 20, true);
        grid.set_opaque(20, 4, 20, true);
        assert_eq!(grid.highest(20, 20), 10);
        assert!(grid.is_opaque(20, 4, 20));
        assert!(!grid.is_opaque(-1, 4, 20));
    }

    #[test]
    fn shade_fades_with_distance_to_cover() {
        let mut grid = Grid::new(0, 0);
        grid.set_opaque(20, 12, 20, true);
        let samples = grid.neighborhood(20, 9, 20);
        // (0, -1, 0) is 4 below the cover, (0, 1, 0) is 2 below
        assert_relative_eq!(samples.shades[10], 0.5);
        assert_relative_eq!(samples.shades[16], 0.75);
        assert_relative_eq!(samples.shades[0], 0.0);
    }
}
