//! # Block Side Module
//!
//! This module defines the six faces of a voxel block in the order the mesh
//! generators, the face-visibility flags and the per-corner occlusion tables
//! all share.

/// Represents the six possible faces of a voxel block.
///
/// Each variant's discriminant is its index into per-face arrays
/// (`[bool; 6]` visibility flags, `[[f32; 4]; 6]` corner values, tile tables).
///
/// The order is: [LEFT, RIGHT, TOP, BOTTOM, FRONT, BACK]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The left face (facing negative X)
    LEFT = 0,

    /// The right face (facing positive X)
    RIGHT = 1,

    /// The top face (facing positive Y)
    TOP = 2,

    /// The bottom face (facing negative Y)
    BOTTOM = 3,

    /// The front face (facing negative Z)
    FRONT = 4,

    /// The back face (facing positive Z)
    BACK = 5,
}

/// Per-face visibility flags, indexed by `BlockSide as usize`.
pub type FaceVisibility = [bool; 6];

impl BlockSide {
    /// Returns an array containing all six block faces in index order.
    ///
    /// # Returns
    /// An array containing all `BlockSide` variants.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::TOP,
            BlockSide::BOTTOM,
            BlockSide::FRONT,
            BlockSide::BACK,
        ]
    }

    /// The outward unit normal of this face.
    pub fn normal(self) -> [f32; 3] {
        match self {
            BlockSide::LEFT => [-1.0, 0.0, 0.0],
            BlockSide::RIGHT => [1.0, 0.0, 0.0],
            BlockSide::TOP => [0.0, 1.0, 0.0],
            BlockSide::BOTTOM => [0.0, -1.0, 0.0],
            BlockSide::FRONT => [0.0, 0.0, -1.0],
            BlockSide::BACK => [0.0, 0.0, 1.0],
        }
    }

    /// The integer offset to the voxel this face looks at.
    pub fn offset(self) -> [i32; 3] {
        match self {
            BlockSide::LEFT => [-1, 0, 0],
            BlockSide::RIGHT => [1, 0, 0],
            BlockSide::TOP => [0, 1, 0],
            BlockSide::BOTTOM => [0, -1, 0],
            BlockSide::FRONT => [0, 0, -1],
            BlockSide::BACK => [0, 0, 1],
        }
    }

    /// Counts the visible faces in a visibility array.
    pub fn count_visible(faces: &FaceVisibility) -> usize {
        faces.iter().filter(|visible| **visible).count()
    }
}
