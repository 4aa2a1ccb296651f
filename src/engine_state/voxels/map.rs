//! # Sparse Voxel Map
//!
//! This module provides `SparseVoxelMap`, the storage primitive behind every
//! per-voxel attribute channel of a chunk (block ids, light levels, extra bit
//! flags, shapes and transforms).
//!
//! ## Architecture
//!
//! The map is an open-addressing hash table with a power-of-two capacity:
//! - Keys are world coordinates, hashed with an integer mixing function and
//!   probed linearly on collision
//! - Entries store the coordinate *relative to the map origin* packed into
//!   three bytes plus a signed byte value, so one entry is exactly 4 bytes
//! - Slot occupancy is tracked in a separate `BitVec`, which keeps every
//!   packed entry value (including all-zero entries) a valid key
//!
//! A value of `0` means "absent". Writing `0` over an existing entry leaves
//! the slot occupied (so probe chains stay intact) but `get` reports `0`,
//! exactly as if the position had never been written.
//!
//! ## Performance Considerations
//!
//! - The table doubles and rehashes once more than half of its slots are in
//!   use, so probe sequences stay short and always terminate
//! - Zero-valued entries are dropped during a rehash
//! - Cloning a map (for worker snapshots) is a pair of flat buffer copies

use bitvec::prelude::BitVec;
use cgmath::Point3;
use log::warn;

/// Initial capacity mask for block maps, which hold most of a chunk's data.
pub const BLOCK_MAP_MASK: u32 = 0x3fff;

/// Initial capacity mask for the sparse attribute channels.
pub const ATTRIBUTE_MAP_MASK: u32 = 0xf;

/// Largest local offset (per axis) a map can address from its origin.
pub const MAX_LOCAL_OFFSET: i32 = u8::MAX as i32;

/// A single packed map entry.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute keeps the entry at exactly 4 bytes:
/// three unsigned local coordinates followed by the signed value.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MapEntry {
    /// X offset from the map origin.
    pub x: u8,
    /// Y offset from the map origin.
    pub y: u8,
    /// Z offset from the map origin.
    pub z: u8,
    /// The stored value. Negative values are neighbor halo copies.
    pub w: i8,
}

/// Integer hash used for all voxel-keyed tables.
pub(crate) fn hash_int(key: i32) -> i32 {
    let mut key = (!key).wrapping_add(key.wrapping_shl(15));
    key ^= key >> 12;
    key = key.wrapping_add(key.wrapping_shl(2));
    key ^= key >> 4;
    key = key.wrapping_mul(2057);
    key ^= key >> 16;
    key
}

/// Hashes a world coordinate into an (unmasked) table index.
pub(crate) fn hash_position(x: i32, y: i32, z: i32) -> u32 {
    (hash_int(x) ^ hash_int(y) ^ hash_int(z)) as u32
}

/// Converts a world coordinate into byte-sized local offsets from `origin`.
///
/// # Returns
/// `None` when any axis falls outside `0..=255` relative to the origin.
pub(crate) fn to_local(origin: Point3<i32>, x: i32, y: i32, z: i32) -> Option<[u8; 3]> {
    let lx = u8::try_from(x.wrapping_sub(origin.x)).ok()?;
    let ly = u8::try_from(y.wrapping_sub(origin.y)).ok()?;
    let lz = u8::try_from(z.wrapping_sub(origin.z)).ok()?;
    Some([lx, ly, lz])
}

/// An open-addressing hash map from voxel positions to small signed values.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_terrain::engine_state::voxels::map::{SparseVoxelMap, ATTRIBUTE_MAP_MASK};
///
/// let mut map = SparseVoxelMap::new(Point3::new(-1, 0, -1), ATTRIBUTE_MAP_MASK);
/// assert!(map.set(3, 10, 4, 7));
/// assert_eq!(map.get(3, 10, 4), 7);
/// assert!(!map.set(3, 10, 4, 7));
/// assert_eq!(map.get(0, 0, 0), 0);
/// ```
#[derive(Clone, Debug)]
pub struct SparseVoxelMap {
    origin: Point3<i32>,
    mask: u32,
    size: u32,
    entries: Vec<MapEntry>,
    occupied: BitVec,
}

impl SparseVoxelMap {
    /// Creates an empty map.
    ///
    /// # Arguments
    /// * `origin` - World coordinate that local offset `(0, 0, 0)` maps to
    /// * `mask` - Initial capacity minus one; must be `2^k - 1`
    pub fn new(origin: Point3<i32>, mask: u32) -> Self {
        debug_assert!(mask.wrapping_add(1).is_power_of_two());
        let capacity = mask as usize + 1;
        SparseVoxelMap {
            origin,
            mask,
            size: 0,
            entries: vec![MapEntry::default(); capacity],
            occupied: BitVec::repeat(false, capacity),
        }
    }

    /// The world coordinate of local offset `(0, 0, 0)`.
    pub fn origin(&self) -> Point3<i32> {
        self.origin
    }

    /// Number of occupied slots (zero-valued overwrites included).
    pub fn len(&self) -> usize {
        self.size as usize
    }

    /// Returns `true` when nothing was ever written since the last rehash.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.mask as usize + 1
    }

    /// Looks up the value stored at a world position.
    ///
    /// # Returns
    /// The stored value, or `0` when the position is absent or outside the
    /// map's addressable range.
    pub fn get(&self, x: i32, y: i32, z: i32) -> i32 {
        let Some(local) = to_local(self.origin, x, y, z) else {
            return 0;
        };
        match self.probe(hash_position(x, y, z), local) {
            (index, true) => self.entries[index].w as i32,
            (_, false) => 0,
        }
    }

    /// Stores a value at a world position.
    ///
    /// Writing `0` to an absent position is a no-op. Writing `0` to a present
    /// position logically removes it.
    ///
    /// # Returns
    /// `true` if the stored value changed. Positions outside the map's
    /// addressable range, and values that do not fit a signed byte, are
    /// rejected and reported as unchanged.
    pub fn set(&mut self, x: i32, y: i32, z: i32, w: i32) -> bool {
        let Some(local) = to_local(self.origin, x, y, z) else {
            warn!(
                "Voxel ({}, {}, {}) is outside the map anchored at {:?}",
                x, y, z, self.origin
            );
            return false;
        };
        let Ok(value) = i8::try_from(w) else {
            warn!("Value {} at ({}, {}, {}) does not fit a voxel map entry", w, x, y, z);
            return false;
        };

        let (index, found) = self.probe(hash_position(x, y, z), local);
        if found {
            let entry = &mut self.entries[index];
            if entry.w == value {
                return false;
            }
            entry.w = value;
            return true;
        }
        if value == 0 {
            return false;
        }

        self.entries[index] = MapEntry {
            x: local[0],
            y: local[1],
            z: local[2],
            w: value,
        };
        self.occupied.set(index, true);
        self.size += 1;
        if self.size * 2 > self.mask {
            self.grow();
        }
        true
    }

    /// Replaces the contents of `self` with a deep copy of `src`.
    pub fn copy_from(&mut self, src: &SparseVoxelMap) {
        self.clone_from(src);
    }

    /// Iterates over every live `(x, y, z, w)` entry in table order.
    ///
    /// Zero-valued entries are skipped. The order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, i32, i32)> + '_ {
        self.occupied.iter_ones().filter_map(move |index| {
            let entry = self.entries[index];
            (entry.w != 0).then(|| {
                (
                    entry.x as i32 + self.origin.x,
                    entry.y as i32 + self.origin.y,
                    entry.z as i32 + self.origin.z,
                    entry.w as i32,
                )
            })
        })
    }

    /// Walks the probe sequence for `local` starting at `hash`.
    ///
    /// # Returns
    /// The slot holding the key and `true`, or the first free slot and `false`.
    fn probe(&self, hash: u32, local: [u8; 3]) -> (usize, bool) {
        let mut index = (hash & self.mask) as usize;
        while self.occupied[index] {
            let entry = &self.entries[index];
            if entry.x == local[0] && entry.y == local[1] && entry.z == local[2] {
                return (index, true);
            }
            index = (index + 1) & self.mask as usize;
        }
        (index, false)
    }

    /// Doubles the capacity and reinserts every non-zero entry.
    fn grow(&mut self) {
        let mut grown = SparseVoxelMap::new(self.origin, (self.mask << 1) | 1);
        for (x, y, z, w) in self.iter() {
            let local = [
                (x - self.origin.x) as u8,
                (y - self.origin.y) as u8,
                (z - self.origin.z) as u8,
            ];
            let (index, _) = grown.probe(hash_position(x, y, z), local);
            grown.entries[index] = MapEntry {
                x: local[0],
                y: local[1],
                z: local[2],
                w: w as i8,
            };
            grown.occupied.set(index, true);
            grown.size += 1;
        }
        *self = grown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_map(mask: u32) -> SparseVoxelMap {
        SparseVoxelMap::new(Point3::new(-1, 0, -1), mask)
    }

    #[test]
    fn get_returns_last_written_value() {
        let mut map = chunk_map(ATTRIBUTE_MAP_MASK);
        let writes = [
            (0, 5, 0, 3),
            (1, 5, 0, 4),
            (0, 5, 0, 9),
            (15, 255, 16, -2),
            (-1, 0, -1, 1),
            (1, 5, 0, 12),
        ];
        for &(x, y, z, w) in &writes {
            map.set(x, y, z, w);
        }
        assert_eq!(map.get(0, 5, 0), 9);
        assert_eq!(map.get(1, 5, 0), 12);
        assert_eq!(map.get(15, 255, 16), -2);
        assert_eq!(map.get(-1, 0, -1), 1);
    }

    #[test]
    fn zero_write_reads_as_never_written() {
        let mut map = chunk_map(ATTRIBUTE_MAP_MASK);
        assert!(map.set(2, 2, 2, 5));
        assert!(map.set(2, 2, 2, 0));
        assert_eq!(map.get(2, 2, 2), 0);
        assert_eq!(map.iter().count(), 0);
        assert!(!map.set(2, 2, 2, 0));
        assert!(!map.set(7, 7, 7, 0));
    }

    #[test]
    fn origin_corner_entry_survives_zero_overwrite() {
        let mut map = chunk_map(ATTRIBUTE_MAP_MASK);
        // Local (0, 0, 0) with value 0 must not break the probe chain.
        map.set(-1, 0, -1, 4);
        map.set(3, 3, 3, 6);
        map.set(-1, 0, -1, 0);
        assert_eq!(map.get(3, 3, 3), 6);
        assert_eq!(map.get(-1, 0, -1), 0);
    }

    #[test]
    fn set_reports_changes_only() {
        let mut map = chunk_map(ATTRIBUTE_MAP_MASK);
        assert!(map.set(4, 4, 4, 2));
        assert!(!map.set(4, 4, 4, 2));
        assert!(map.set(4, 4, 4, 3));
    }

    #[test]
    fn load_factor_stays_at_most_half() {
        let mut map = chunk_map(ATTRIBUTE_MAP_MASK);
        for x in -1..17 {
            for z in -1..17 {
                let before = map.len();
                map.set(x, (x * z).rem_euclid(200), z, 1 + (x + z).rem_euclid(60));
                if map.len() > before {
                    assert!(map.len() * 2 <= map.capacity());
                }
            }
        }
        assert_eq!(map.iter().count(), 18 * 18);
        for x in -1..17 {
            for z in -1..17 {
                assert_eq!(map.get(x, (x * z).rem_euclid(200), z), 1 + (x + z).rem_euclid(60));
            }
        }
    }

    #[test]
    fn out_of_range_positions_are_rejected() {
        let mut map = chunk_map(ATTRIBUTE_MAP_MASK);
        assert!(!map.set(-2, 0, 0, 1));
        assert!(!map.set(0, 256, 0, 1));
        assert!(!map.set(0, -1, 0, 1));
        assert!(!map.set(0, 0, 0, 200));
        assert_eq!(map.get(-2, 0, 0), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn copy_is_independent_of_source() {
        let mut map = chunk_map(ATTRIBUTE_MAP_MASK);
        map.set(1, 1, 1, 1);
        let mut copy = chunk_map(BLOCK_MAP_MASK);
        copy.copy_from(&map);
        map.set(1, 1, 1, 2);
        assert_eq!(copy.get(1, 1, 1), 1);
        assert_eq!(copy.capacity(), map.capacity());
    }

    #[test]
    fn iteration_yields_world_coordinates() {
        let mut map = SparseVoxelMap::new(Point3::new(31, 0, -17), ATTRIBUTE_MAP_MASK);
        map.set(40, 12, -10, 3);
        map.set(31, 0, -17, -5);
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort();
        assert_eq!(entries, vec![(31, 0, -17, -5), (40, 12, -10, 3)]);
    }
}
