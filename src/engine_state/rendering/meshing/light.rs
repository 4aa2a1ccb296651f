//! Light propagation through the padded grid.
//!
//! Each light source floods outward through non-opaque cells, losing one
//! level per step along the six axis directions. A cell already holding an
//! equal or brighter level stops the flood, so every cell ends at the
//! brightest level any source can reach it with. The fill uses an explicit
//! worklist and never recurses.

use super::grid::{Grid, XZ_HI, XZ_LO, Y_SIZE};

const STEPS: [(i32, i32, i32); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// Floods light of level `w` from grid cell `(x, y, z)`.
///
/// The source cell itself is lit even when opaque. Spread is pruned where
/// the remaining level can no longer reach the center chunk.
pub(crate) fn light_fill(grid: &mut Grid, x: i32, y: i32, z: i32, w: i32) {
    let mut pending = vec![(x, y, z, w, true)];
    while let Some((x, y, z, w, force)) = pending.pop() {
        if x + w < XZ_LO || z + w < XZ_LO {
            continue;
        }
        if x - w > XZ_HI || z - w > XZ_HI {
            continue;
        }
        if y < 0 || y >= Y_SIZE {
            continue;
        }
        if i32::from(grid.light(x, y, z)) >= w {
            continue;
        }
        if !force && grid.is_opaque(x, y, z) {
            continue;
        }
        grid.set_light(x, y, z, w as u8);
        for (dx, dy, dz) in STEPS {
            pending.push((x + dx, y + dy, z + dz, w - 1, false));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_decays_one_level_per_step() {
        let mut grid = Grid::new(0, 0);
        light_fill(&mut grid, 24, 10, 24, 15);
        assert_eq!(grid.light(24, 10, 24), 15);
        assert_eq!(grid.light(25, 10, 24), 14);
        assert_eq!(grid.light(24, 13, 22), 10);
        assert_eq!(grid.light(24, 10 + 14, 24), 1);
        assert_eq!(grid.light(24, 10 + 15, 24), 0);
    }

    #[test]
    fn opaque_cells_block_light() {
        let mut grid = Grid::new(0, 0);
        for y in 0..Y_SIZE {
            for z in 0..50 {
                grid.set_opaque(25, y, z, true);
            }
        }
        grid.set_opaque(24, 10, 24, true);
        light_fill(&mut grid, 24, 10, 24, 10);
        assert_eq!(grid.light(24, 10, 24), 10);
        assert_eq!(grid.light(23, 10, 24), 9);
        assert_eq!(grid.light(25, 10, 24), 0);
        assert_eq!(grid.light(26, 10, 24), 0);
    }

    #[test]
    fn brighter_sources_win() {
        let mut grid = Grid::new(0, 0);
        light_fill(&mut grid, 20, 5, 20, 5);
        light_fill(&mut grid, 22, 5, 20, 15);
        assert_eq!(grid.light(20, 5, 20), 13);
        light_fill(&mut grid, 20, 5, 20, 5);
        assert_eq!(grid.light(20, 5, 20), 13);
    }
}
