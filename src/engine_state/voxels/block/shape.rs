//! # Shape Module
//!
//! Non-cube geometry variants. A voxel's shape lives in its own map channel;
//! `0` (or absent) means a plain cube.

/// The geometry variant of a voxel.
///
/// Raw ids: `Cube = 0`, `Slab(n) = n` for `1..=15`, then `UpperDoor = 16`,
/// `LowerDoor = 17`, `Fence = 18`, `FencePost = 19`, `FenceHalf = 20`,
/// `FenceL = 21`, `FenceT = 22`, `FenceX = 23`, `Gate = 24`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A full unit cube.
    Cube,
    /// A slab `n/16` of a block tall, `n` in `1..=15`.
    Slab(u8),
    /// The upper half of a two-block door.
    UpperDoor,
    /// The lower half of a two-block door.
    LowerDoor,
    /// A straight fence through the post.
    Fence,
    /// A lone fence post.
    FencePost,
    /// A post with slats on one side.
    FenceHalf,
    /// A corner fence.
    FenceL,
    /// A three-way fence.
    FenceT,
    /// A four-way fence.
    FenceX,
    /// An openable fence gate.
    Gate,
}

/// Raw id of the thinnest slab.
pub const SLAB1: i32 = 1;
/// Raw id of the tallest slab.
pub const SLAB15: i32 = 15;

/// Door transform: closed against the block's -X face.
pub const DOOR_X: i32 = 0;
/// Door transform: closed against the +X face.
pub const DOOR_X_PLUS: i32 = 1;
/// Door transform: closed against the -Z face.
pub const DOOR_Z: i32 = 2;
/// Door transform: closed against the +Z face.
pub const DOOR_Z_PLUS: i32 = 3;
/// Mirrored `DOOR_X`.
pub const DOOR_X_FLIP: i32 = 4;
/// Mirrored `DOOR_X_PLUS`.
pub const DOOR_X_PLUS_FLIP: i32 = 5;
/// Mirrored `DOOR_Z`.
pub const DOOR_Z_FLIP: i32 = 6;
/// Mirrored `DOOR_Z_PLUS`.
pub const DOOR_Z_PLUS_FLIP: i32 = 7;

impl Shape {
    /// Converts a raw shape id to a `Shape`.
    ///
    /// Halo copies are stored negated, so the sign is ignored.
    ///
    /// # Returns
    /// `None` for unknown ids.
    pub fn from_id(id: i32) -> Option<Shape> {
        let shape = match id.abs() {
            0 => Shape::Cube,
            n @ SLAB1..=SLAB15 => Shape::Slab(n as u8),
            16 => Shape::UpperDoor,
            17 => Shape::LowerDoor,
            18 => Shape::Fence,
            19 => Shape::FencePost,
            20 => Shape::FenceHalf,
            21 => Shape::FenceL,
            22 => Shape::FenceT,
            23 => Shape::FenceX,
            24 => Shape::Gate,
            _ => return None,
        };
        Some(shape)
    }

    /// The raw id stored in shape maps.
    pub fn id(self) -> i32 {
        match self {
            Shape::Cube => 0,
            Shape::Slab(n) => n as i32,
            Shape::UpperDoor => 16,
            Shape::LowerDoor => 17,
            Shape::Fence => 18,
            Shape::FencePost => 19,
            Shape::FenceHalf => 20,
            Shape::FenceL => 21,
            Shape::FenceT => 22,
            Shape::FenceX => 23,
            Shape::Gate => 24,
        }
    }

    /// Returns `true` for either door half.
    pub fn is_door(self) -> bool {
        matches!(self, Shape::UpperDoor | Shape::LowerDoor)
    }

    /// Returns `true` for every fence variant, gates included.
    pub fn is_fence(self) -> bool {
        matches!(
            self,
            Shape::Fence
                | Shape::FencePost
                | Shape::FenceHalf
                | Shape::FenceL
                | Shape::FenceT
                | Shape::FenceX
                | Shape::Gate
        )
    }

    /// Returns `true` for shapes whose open state can be toggled in place.
    pub fn is_openable(self) -> bool {
        self.is_door() || self == Shape::Gate
    }

    /// The door half that pairs with this one, if this is a door.
    pub fn matching_door_half(self) -> Option<(Shape, i32)> {
        match self {
            Shape::UpperDoor => Some((Shape::LowerDoor, -1)),
            Shape::LowerDoor => Some((Shape::UpperDoor, 1)),
            _ => None,
        }
    }

    /// The fraction of a block this shape fills vertically.
    pub fn height(self) -> f32 {
        match self {
            Shape::Slab(n) => n as f32 / 16.0,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ids_round_trip() {
        for id in 0..=24 {
            let shape = Shape::from_id(id).unwrap();
            assert_eq!(shape.id(), id);
        }
        assert_eq!(Shape::from_id(25), None);
        assert_eq!(Shape::from_id(-17), Some(Shape::LowerDoor));
    }

    #[test]
    fn slab_height_is_sixteenths() {
        assert_relative_eq!(Shape::Slab(8).height(), 0.5);
        assert_relative_eq!(Shape::Slab(1).height(), 0.0625);
        assert_relative_eq!(Shape::Gate.height(), 1.0);
    }

    #[test]
    fn door_halves_pair_up() {
        assert_eq!(Shape::UpperDoor.matching_door_half(), Some((Shape::LowerDoor, -1)));
        assert_eq!(Shape::LowerDoor.matching_door_half(), Some((Shape::UpperDoor, 1)));
        assert_eq!(Shape::Gate.matching_door_half(), None);
        assert!(Shape::Gate.is_openable());
        assert!(!Shape::Fence.is_openable());
    }
}
