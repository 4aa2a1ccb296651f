//! # Block Type Module
//!
//! This module defines the catalogue of named block ids stored in a chunk's
//! block map. Ids `32..=63` are the palette colors and have no named variant.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// The first palette color id.
pub const COLOR_00: i32 = 32;
/// The sixteenth palette color id; doors made of colors up to here use the
/// first door texture row.
pub const COLOR_15: i32 = 47;
/// The last palette color id.
pub const COLOR_31: i32 = 63;

/// Enumerates the named block types in the voxel world.
///
/// The `FromPrimitive` derive allows conversion from the raw ids stored in
/// voxel maps.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Nothing. Never stored in a map; a zero value means absent.
    EMPTY = 0,
    /// Grass-topped dirt.
    GRASS = 1,
    /// Sand.
    SAND = 2,
    /// Stone.
    STONE = 3,
    /// Brick.
    BRICK = 4,
    /// Tree trunk.
    WOOD = 5,
    /// Cement.
    CEMENT = 6,
    /// Dirt.
    DIRT = 7,
    /// Wooden planks.
    PLANK = 8,
    /// Snow.
    SNOW = 9,
    /// Glass, transparent.
    GLASS = 10,
    /// Cobblestone.
    COBBLE = 11,
    /// Light stone.
    LIGHT_STONE = 12,
    /// Dark stone.
    DARK_STONE = 13,
    /// Chest.
    CHEST = 14,
    /// Leaves, transparent.
    LEAVES = 15,
    /// Cloud, not an obstacle.
    CLOUD = 16,
    /// Tall grass plant.
    TALL_GRASS = 17,
    /// Yellow flower plant.
    YELLOW_FLOWER = 18,
    /// Red flower plant.
    RED_FLOWER = 19,
    /// Purple flower plant.
    PURPLE_FLOWER = 20,
    /// Sun flower plant.
    SUN_FLOWER = 21,
    /// White flower plant.
    WHITE_FLOWER = 22,
    /// Blue flower plant.
    BLUE_FLOWER = 23,
}

impl BlockType {
    /// Converts a raw block id to a named `BlockType`.
    ///
    /// Halo copies are stored negated, so the sign is ignored.
    ///
    /// # Returns
    /// `None` for palette colors and unknown ids.
    pub fn from_id(id: i32) -> Option<Self> {
        FromPrimitive::from_i32(id.abs())
    }

    /// The raw id stored in block maps.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Returns `true` for the cross-shaped plant blocks.
    pub fn is_plant(self) -> bool {
        (BlockType::TALL_GRASS.id()..=BlockType::BLUE_FLOWER.id()).contains(&self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_id() {
        assert_eq!(BlockType::from_id(10), Some(BlockType::GLASS));
        assert_eq!(BlockType::from_id(-15), Some(BlockType::LEAVES));
        assert_eq!(BlockType::from_id(COLOR_00), None);
        assert_eq!(BlockType::from_id(24), None);
    }

    #[test]
    fn plants_are_the_flower_range() {
        assert!(BlockType::TALL_GRASS.is_plant());
        assert!(BlockType::BLUE_FLOWER.is_plant());
        assert!(!BlockType::CLOUD.is_plant());
    }
}
