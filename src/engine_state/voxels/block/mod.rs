//! # Block Module
//!
//! This module provides the block catalogue shared by chunk storage and the
//! mesh generators: named block ids, face order, shapes, the per-face texture
//! tile table and the transparency/obstacle predicates.
//!
//! Block maps store raw signed ids. A positive id is a block owned by the
//! chunk; a negative id is the halo copy of a neighbor chunk's block. Every
//! predicate here accepts either sign.

use block_type::{BlockType, COLOR_00, COLOR_15, COLOR_31};
use shape::Shape;

pub mod block_side;
pub mod block_type;
pub mod shape;

/// Extra-channel bit set while a door or gate is open.
pub const EXTRA_BIT_OPEN: i32 = 1;
/// Extra-channel bit marking a block as a control block.
pub const EXTRA_BIT_CONTROL: i32 = 2;

/// Number of entries in the tile table. Ids beyond it have no textures.
pub const BLOCK_TILE_COUNT: usize = 64;

/// Maps each block id to its texture tile for each face.
///
/// The inner array order is [Left, Right, Top, Bottom, Front, Back], matching
/// `BlockSide`. Tiles index a 16x16 atlas.
pub static BLOCK_TILES: [[i32; 6]; BLOCK_TILE_COUNT] = build_block_tiles();

const fn build_block_tiles() -> [[i32; 6]; BLOCK_TILE_COUNT] {
    let mut tiles = [[0; 6]; BLOCK_TILE_COUNT];
    tiles[1] = [16, 16, 32, 0, 16, 16]; // grass
    tiles[2] = [1; 6];
    tiles[3] = [2; 6];
    tiles[4] = [3; 6];
    tiles[5] = [20, 20, 36, 4, 20, 20]; // wood
    tiles[6] = [5; 6];
    tiles[7] = [6; 6];
    tiles[8] = [7; 6];
    tiles[9] = [24, 24, 40, 8, 24, 24]; // snow
    let mut id = 10;
    while id <= 16 {
        tiles[id] = [id as i32 - 1; 6];
        id += 1;
    }
    // palette colors occupy atlas rows 11 and 12
    let mut id = COLOR_00 as usize;
    while id <= COLOR_31 as usize {
        tiles[id] = [144 + id as i32; 6];
        id += 1;
    }
    tiles
}

/// Returns the six face tiles for a block id (sign ignored).
pub fn block_tiles(w: i32) -> [i32; 6] {
    BLOCK_TILES
        .get(w.unsigned_abs() as usize)
        .copied()
        .unwrap_or([0; 6])
}

/// Returns the single tile used by both quads of a plant.
pub fn plant_tile(w: i32) -> i32 {
    if is_plant(w) {
        w.abs() + 31
    } else {
        0
    }
}

/// Returns `true` for the cross-shaped plant blocks.
pub fn is_plant(w: i32) -> bool {
    BlockType::from_id(w).is_some_and(BlockType::is_plant)
}

/// Returns `true` for blocks light and visibility pass through.
pub fn is_transparent(w: i32) -> bool {
    if w == 0 {
        return true;
    }
    matches!(
        BlockType::from_id(w),
        Some(BlockType::GLASS | BlockType::LEAVES)
    ) || is_plant(w)
}

/// Returns `true` for blocks a player collides with.
///
/// Plants, clouds and open doors/gates are passable.
pub fn is_obstacle(w: i32, shape: i32, extra: i32) -> bool {
    if is_plant(w) {
        return false;
    }
    if Shape::from_id(shape).is_some_and(Shape::is_openable) && is_open(extra) {
        return false;
    }
    !matches!(
        BlockType::from_id(w),
        Some(BlockType::EMPTY | BlockType::CLOUD)
    )
}

/// Returns `true` when the open bit is set in an extra value.
pub fn is_open(extra: i32) -> bool {
    extra.abs() & EXTRA_BIT_OPEN != 0
}

/// Returns `true` when the control bit is set in an extra value.
pub fn is_control(extra: i32) -> bool {
    extra.abs() & EXTRA_BIT_CONTROL != 0
}

/// Returns `true` for blocks a door can be made of.
pub fn is_door_material(w: i32) -> bool {
    let w = w.abs();
    (COLOR_00..=COLOR_31).contains(&w)
        || w == BlockType::PLANK.id()
        || w == BlockType::GLASS.id()
}

/// Returns the `(lower, upper)` door tiles for a block id.
pub fn door_tiles(w: i32) -> (i32, i32) {
    let w = w.abs();
    let side = block_tiles(w)[1];
    if w == BlockType::PLANK.id() {
        (57, 73)
    } else if w == BlockType::GLASS.id() {
        (58, 74)
    } else if (COLOR_00..=COLOR_15).contains(&w) {
        (side - 16 * 5, side - 16 * 4)
    } else {
        (side - 16 * 3, side - 16 * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparency_follows_the_catalogue() {
        assert!(is_transparent(0));
        assert!(is_transparent(BlockType::GLASS.id()));
        assert!(is_transparent(-BlockType::LEAVES.id()));
        assert!(is_transparent(BlockType::RED_FLOWER.id()));
        assert!(!is_transparent(BlockType::STONE.id()));
        assert!(!is_transparent(-BlockType::GRASS.id()));
        assert!(!is_transparent(COLOR_00 + 3));
    }

    #[test]
    fn obstacles_exclude_passable_blocks() {
        assert!(is_obstacle(BlockType::STONE.id(), 0, 0));
        assert!(!is_obstacle(BlockType::CLOUD.id(), 0, 0));
        assert!(!is_obstacle(BlockType::TALL_GRASS.id(), 0, 0));
        let door = Shape::LowerDoor.id();
        assert!(is_obstacle(BlockType::PLANK.id(), door, 0));
        assert!(!is_obstacle(BlockType::PLANK.id(), door, EXTRA_BIT_OPEN));
        assert!(is_obstacle(BlockType::PLANK.id(), Shape::Fence.id(), EXTRA_BIT_OPEN));
    }

    #[test]
    fn tile_table_covers_named_blocks_and_palette() {
        assert_eq!(block_tiles(1), [16, 16, 32, 0, 16, 16]);
        assert_eq!(block_tiles(10), [9; 6]);
        assert_eq!(block_tiles(16), [15; 6]);
        assert_eq!(block_tiles(COLOR_00), [176; 6]);
        assert_eq!(block_tiles(COLOR_31), [207; 6]);
        assert_eq!(block_tiles(200), [0; 6]);
        assert_eq!(plant_tile(17), 48);
        assert_eq!(plant_tile(23), 54);
    }

    #[test]
    fn door_tiles_depend_on_material() {
        assert_eq!(door_tiles(BlockType::PLANK.id()), (57, 73));
        assert_eq!(door_tiles(COLOR_00), (96, 112));
        assert_eq!(door_tiles(COLOR_31), (159, 175));
        assert!(is_door_material(BlockType::GLASS.id()));
        assert!(!is_door_material(BlockType::STONE.id()));
    }

    #[test]
    fn extra_bits_are_independent() {
        assert!(is_open(EXTRA_BIT_OPEN | EXTRA_BIT_CONTROL));
        assert!(is_control(-(EXTRA_BIT_CONTROL)));
        assert!(!is_open(EXTRA_BIT_CONTROL));
    }
}
