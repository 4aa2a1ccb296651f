//! # Door Index
//!
//! A secondary per-chunk index over the doors and gates emitted by the last
//! mesh build. Each entry caches everything needed to regenerate that one
//! block's geometry (per-corner occlusion and light, face visibility, shape,
//! extra bits, transform) together with its position inside the chunk's
//! vertex buffer.
//!
//! ## Architecture
//!
//! The index is keyed and probed exactly like `SparseVoxelMap` (same origin,
//! same hash, linear probing, growth past 50% load). Entries are much larger
//! than a packed voxel, so slots hold `Option<DoorEntry>` directly.
//!
//! ## Fast Path
//!
//! Toggling a door only flips a bit in the cached entry, regenerates that
//! block's faces and patches the existing buffer in place; the chunk is never
//! marked dirty.

use cgmath::Point3;

use super::block::block_side::FaceVisibility;
use super::block::shape::Shape;
use super::map::{hash_position, to_local};

/// Per-face, per-corner scalar values (`[face][corner]`).
pub type CornerValues = [[f32; 4]; 6];

/// Cached inputs for regenerating a door or gate in place.
#[derive(Clone, Debug, PartialEq)]
pub struct DoorGeometry {
    /// Offset of the block's first vertex in the chunk buffer, in floats.
    pub offset: usize,
    /// Number of faces the block occupies in the chunk buffer.
    pub face_count: usize,
    /// Ambient occlusion per face corner.
    pub ao: CornerValues,
    /// Light intensity per face corner.
    pub light: CornerValues,
    /// Face visibility flags the block was built with.
    pub faces: FaceVisibility,
    /// Half extent of the block (0.5 for a unit block).
    pub n: f32,
    /// Door half or gate.
    pub shape: Shape,
    /// Extra bits, including the open bit.
    pub extra: i32,
    /// Orientation transform.
    pub transform: i32,
}

/// A single door index entry.
#[derive(Clone, Debug, PartialEq)]
pub struct DoorEntry {
    /// World position of the block.
    pub position: Point3<i32>,
    /// Block id. Zero after the entry has been cleared.
    pub w: i32,
    /// Cached geometry inputs.
    pub geometry: DoorGeometry,
}

#[derive(Clone, Debug)]
struct DoorSlot {
    local: [u8; 3],
    entry: DoorEntry,
}

/// Open-addressing index of door and gate geometry for one chunk.
#[derive(Clone, Debug)]
pub struct DoorIndex {
    origin: Point3<i32>,
    mask: u32,
    size: u32,
    slots: Vec<Option<DoorSlot>>,
}

impl DoorIndex {
    /// Creates an empty index anchored at `origin`.
    pub fn new(origin: Point3<i32>, mask: u32) -> Self {
        debug_assert!(mask.wrapping_add(1).is_power_of_two());
        DoorIndex {
            origin,
            mask,
            size: 0,
            slots: vec![None; mask as usize + 1],
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.size as usize
    }

    /// Returns `true` when no entry has been recorded.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Records or replaces the entry at a world position.
    ///
    /// # Returns
    /// `false` if the position lies outside the index's addressable range.
    pub fn set(&mut self, x: i32, y: i32, z: i32, w: i32, geometry: DoorGeometry) -> bool {
        let Some(local) = to_local(self.origin, x, y, z) else {
            return false;
        };
        let (index, found) = self.probe(hash_position(x, y, z), local);
        let entry = DoorEntry {
            position: Point3::new(x, y, z),
            w,
            geometry,
        };
        self.slots[index] = Some(DoorSlot { local, entry });
        if !found {
            self.size += 1;
            if self.size * 2 > self.mask {
                self.grow();
            }
        }
        true
    }

    /// Looks up a live entry.
    ///
    /// # Returns
    /// `None` when the position is absent, cleared, or out of range.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<&DoorEntry> {
        let index = self.find(x, y, z)?;
        self.slots[index]
            .as_ref()
            .map(|slot| &slot.entry)
            .filter(|entry| entry.w != 0)
    }

    /// Mutable variant of [`DoorIndex::get`].
    pub fn get_mut(&mut self, x: i32, y: i32, z: i32) -> Option<&mut DoorEntry> {
        let index = self.find(x, y, z)?;
        self.slots[index]
            .as_mut()
            .map(|slot| &mut slot.entry)
            .filter(|entry| entry.w != 0)
    }

    /// Clears the block id, shape, extra bits and transform of an entry.
    ///
    /// The slot stays occupied so other probe chains are unaffected.
    pub fn clear(&mut self, x: i32, y: i32, z: i32) {
        if let Some(index) = self.find(x, y, z) {
            if let Some(slot) = self.slots[index].as_mut() {
                slot.entry.w = 0;
                slot.entry.geometry.shape = Shape::Cube;
                slot.entry.geometry.extra = 0;
                slot.entry.geometry.transform = 0;
            }
        }
    }

    /// Iterates over every live entry in table order.
    pub fn iter(&self) -> impl Iterator<Item = &DoorEntry> + '_ {
        self.slots
            .iter()
            .flatten()
            .map(|slot| &slot.entry)
            .filter(|entry| entry.w != 0)
    }

    fn find(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let local = to_local(self.origin, x, y, z)?;
        match self.probe(hash_position(x, y, z), local) {
            (index, true) => Some(index),
            (_, false) => None,
        }
    }

    fn probe(&self, hash: u32, local: [u8; 3]) -> (usize, bool) {
        let mut index = (hash & self.mask) as usize;
        while let Some(slot) = &self.slots[index] {
            if slot.local == local {
                return (index, true);
            }
            index = (index + 1) & self.mask as usize;
        }
        (index, false)
    }

    fn grow(&mut self) {
        let mask = (self.mask << 1) | 1;
        let mut slots: Vec<Option<DoorSlot>> = vec![None; mask as usize + 1];
        let mut size = 0;
        for slot in self.slots.drain(..).flatten() {
            if slot.entry.w == 0 {
                continue;
            }
            let position = slot.entry.position;
            let mut index = (hash_position(position.x, position.y, position.z) & mask) as usize;
            while slots[index].is_some() {
                index = (index + 1) & mask as usize;
            }
            slots[index] = Some(slot);
            size += 1;
        }
        self.mask = mask;
        self.size = size;
        self.slots = slots;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(offset: usize, shape: Shape) -> DoorGeometry {
        DoorGeometry {
            offset,
            face_count: 6,
            ao: [[0.0; 4]; 6],
            light: [[0.0; 4]; 6],
            faces: [true; 6],
            n: 0.5,
            shape,
            extra: 0,
            transform: 0,
        }
    }

    fn index() -> DoorIndex {
        DoorIndex::new(Point3::new(-1, 0, -1), 0xf)
    }

    #[test]
    fn set_then_get_returns_entry() {
        let mut doors = index();
        assert!(doors.set(3, 4, 5, 8, geometry(120, Shape::LowerDoor)));
        let entry = doors.get(3, 4, 5).unwrap();
        assert_eq!(entry.position, Point3::new(3, 4, 5));
        assert_eq!(entry.geometry.offset, 120);
        assert!(doors.get(3, 5, 5).is_none());
    }

    #[test]
    fn clear_hides_entry_and_resets_state() {
        let mut doors = index();
        doors.set(3, 4, 5, 8, geometry(0, Shape::Gate));
        doors.set(3, 5, 5, 8, geometry(60, Shape::UpperDoor));
        doors.clear(3, 4, 5);
        assert!(doors.get(3, 4, 5).is_none());
        assert_eq!(doors.get(3, 5, 5).unwrap().geometry.offset, 60);
        assert_eq!(doors.iter().count(), 1);
    }

    #[test]
    fn growth_keeps_every_entry_reachable() {
        let mut doors = index();
        for i in 0..40 {
            doors.set(i % 16, i, i / 16, 8, geometry(i as usize * 60, Shape::Gate));
        }
        for i in 0..40 {
            let entry = doors.get(i % 16, i, i / 16).unwrap();
            assert_eq!(entry.geometry.offset, i as usize * 60);
        }
        assert_eq!(doors.len(), 40);
    }

    #[test]
    fn out_of_range_positions_are_ignored() {
        let mut doors = index();
        assert!(!doors.set(-5, 0, 0, 8, geometry(0, Shape::Gate)));
        assert!(doors.get(-5, 0, 0).is_none());
        assert!(doors.is_empty());
    }
}
