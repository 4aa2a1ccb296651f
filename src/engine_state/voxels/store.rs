//! # Voxel Store
//!
//! Persistence of voxel edits is an external concern. The terrain core talks
//! to it through the `VoxelStore` trait: `load_*` populate a freshly
//! allocated chunk, `insert_*` persist single edits and the sign calls keep
//! the sign table in step.
//!
//! Every call is fire-and-forget. Implementations queue, batch or drop work
//! as they see fit and never report failures back; the in-memory chunk stays
//! authoritative. Loads run on worker threads, so implementations must be
//! `Send + Sync`.
//!
//! Two implementations ship with the crate:
//! - `NullStore` persists nothing
//! - `MemoryStore` keeps every edit in process memory

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::chunk::sign::SignList;
use super::chunk::Channel;
use super::map::SparseVoxelMap;

/// Persistence collaborator for voxel edits and signs.
///
/// All methods default to no-ops.
pub trait VoxelStore: Send + Sync {
    /// Applies every stored value of one channel of chunk `(p, q)` to `map`.
    fn load(&self, _channel: Channel, _map: &mut SparseVoxelMap, _p: i32, _q: i32) {}

    /// Persists one value of one channel, keyed by the chunk it was written to.
    #[allow(clippy::too_many_arguments)]
    fn insert(&self, _channel: Channel, _p: i32, _q: i32, _x: i32, _y: i32, _z: i32, _w: i32) {}

    /// Adds every stored sign of chunk `(p, q)` to `signs`.
    fn load_signs(&self, _signs: &mut SignList, _p: i32, _q: i32) {}

    /// Persists a sign, replacing any sign on the same face.
    #[allow(clippy::too_many_arguments)]
    fn insert_sign(&self, _p: i32, _q: i32, _x: i32, _y: i32, _z: i32, _face: i32, _text: &str) {}

    /// Deletes the sign on one block face.
    fn delete_sign(&self, _x: i32, _y: i32, _z: i32, _face: i32) {}

    /// Deletes every sign on a block.
    fn delete_signs(&self, _x: i32, _y: i32, _z: i32) {}

    /// Looks up a stored sign for a chunk that is not resident.
    fn sign(&self, _p: i32, _q: i32, _x: i32, _y: i32, _z: i32, _face: i32) -> Option<String> {
        None
    }

    /// Acknowledges that chunk `(p, q)` finished loading.
    fn chunk_loaded(&self, _p: i32, _q: i32) {}

    /// Loads the block channel.
    fn load_blocks(&self, map: &mut SparseVoxelMap, p: i32, q: i32) {
        self.load(Channel::Block, map, p, q);
    }

    /// Loads the extra channel.
    fn load_extras(&self, map: &mut SparseVoxelMap, p: i32, q: i32) {
        self.load(Channel::Extra, map, p, q);
    }

    /// Loads the light channel.
    fn load_lights(&self, map: &mut SparseVoxelMap, p: i32, q: i32) {
        self.load(Channel::Light, map, p, q);
    }

    /// Loads the shape channel.
    fn load_shapes(&self, map: &mut SparseVoxelMap, p: i32, q: i32) {
        self.load(Channel::Shape, map, p, q);
    }

    /// Loads the transform channel.
    fn load_transforms(&self, map: &mut SparseVoxelMap, p: i32, q: i32) {
        self.load(Channel::Transform, map, p, q);
    }

    /// Persists a block edit.
    fn insert_block(&self, p: i32, q: i32, x: i32, y: i32, z: i32, w: i32) {
        self.insert(Channel::Block, p, q, x, y, z, w);
    }

    /// Persists an extra edit.
    fn insert_extra(&self, p: i32, q: i32, x: i32, y: i32, z: i32, w: i32) {
        self.insert(Channel::Extra, p, q, x, y, z, w);
    }

    /// Persists a light edit.
    fn insert_light(&self, p: i32, q: i32, x: i32, y: i32, z: i32, w: i32) {
        self.insert(Channel::Light, p, q, x, y, z, w);
    }

    /// Persists a shape edit.
    fn insert_shape(&self, p: i32, q: i32, x: i32, y: i32, z: i32, w: i32) {
        self.insert(Channel::Shape, p, q, x, y, z, w);
    }

    /// Persists a transform edit.
    fn insert_transform(&self, p: i32, q: i32, x: i32, y: i32, z: i32, w: i32) {
        self.insert(Channel::Transform, p, q, x, y, z, w);
    }
}

/// A store that persists nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStore;

impl VoxelStore for NullStore {}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredSign {
    p: i32,
    q: i32,
    x: i32,
    y: i32,
    z: i32,
    face: i32,
    text: String,
}

type ChannelKey = (Channel, i32, i32);

#[derive(Debug, Default)]
struct MemoryState {
    voxels: HashMap<ChannelKey, HashMap<(i32, i32, i32), i32>>,
    signs: Vec<StoredSign>,
    loaded: Vec<(i32, i32)>,
}

/// A store that keeps every edit in process memory.
///
/// Edits are keyed by the chunk they were written to, so halo copies written
/// to a neighbor come back when that neighbor loads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The stored value of one voxel, if any.
    pub fn voxel(&self, channel: Channel, p: i32, q: i32, x: i32, y: i32, z: i32) -> Option<i32> {
        self.state()
            .voxels
            .get(&(channel, p, q))
            .and_then(|values| values.get(&(x, y, z)))
            .copied()
    }

    /// Every chunk acknowledged by `chunk_loaded`, in call order.
    pub fn loaded_chunks(&self) -> Vec<(i32, i32)> {
        self.state().loaded.clone()
    }

    /// Number of stored signs.
    pub fn sign_count(&self) -> usize {
        self.state().signs.len()
    }
}

impl VoxelStore for MemoryStore {
    fn load(&self, channel: Channel, map: &mut SparseVoxelMap, p: i32, q: i32) {
        let state = self.state();
        if let Some(values) = state.voxels.get(&(channel, p, q)) {
            for (&(x, y, z), &w) in values {
                map.set(x, y, z, w);
            }
        }
    }

    fn insert(&self, channel: Channel, p: i32, q: i32, x: i32, y: i32, z: i32, w: i32) {
        self.state()
            .voxels
            .entry((channel, p, q))
            .or_default()
            .insert((x, y, z), w);
    }

    fn load_signs(&self, signs: &mut SignList, p: i32, q: i32) {
        for sign in self.state().signs.iter().filter(|s| s.p == p && s.q == q) {
            signs.add(sign.x, sign.y, sign.z, sign.face, &sign.text);
        }
    }

    fn insert_sign(&self, p: i32, q: i32, x: i32, y: i32, z: i32, face: i32, text: &str) {
        let mut state = self.state();
        state
            .signs
            .retain(|s| !(s.x == x && s.y == y && s.z == z && s.face == face));
        state.signs.push(StoredSign {
            p,
            q,
            x,
            y,
            z,
            face,
            text: text.to_owned(),
        });
    }

    fn delete_sign(&self, x: i32, y: i32, z: i32, face: i32) {
        self.state()
            .signs
            .retain(|s| !(s.x == x && s.y == y && s.z == z && s.face == face));
    }

    fn delete_signs(&self, x: i32, y: i32, z: i32) {
        self.state()
            .signs
            .retain(|s| !(s.x == x && s.y == y && s.z == z));
    }

    fn sign(&self, p: i32, q: i32, x: i32, y: i32, z: i32, face: i32) -> Option<String> {
        self.state()
            .signs
            .iter()
            .find(|s| s.p == p && s.q == q && s.x == x && s.y == y && s.z == z && s.face == face)
            .map(|s| s.text.clone())
    }

    fn chunk_loaded(&self, p: i32, q: i32) {
        self.state().loaded.push((p, q));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::ChunkMaps;

    #[test]
    fn inserted_values_load_into_matching_chunk_only() {
        let store = MemoryStore::new();
        store.insert_block(0, 0, 3, 4, 5, 7);
        store.insert_block(1, 0, 16, 4, 5, 2);
        store.insert_light(0, 0, 3, 5, 5, 15);

        let mut maps = ChunkMaps::new(0, 0);
        store.load_blocks(&mut maps.blocks, 0, 0);
        store.load_lights(&mut maps.lights, 0, 0);
        assert_eq!(maps.blocks.get(3, 4, 5), 7);
        assert_eq!(maps.blocks.get(16, 4, 5), 0);
        assert_eq!(maps.lights.get(3, 5, 5), 15);
        assert_eq!(store.voxel(Channel::Block, 1, 0, 16, 4, 5), Some(2));
    }

    #[test]
    fn signs_replace_and_delete() {
        let store = MemoryStore::new();
        store.insert_sign(0, 0, 1, 2, 3, 0, "first");
        store.insert_sign(0, 0, 1, 2, 3, 0, "second");
        store.insert_sign(0, 0, 1, 2, 3, 1, "other");
        assert_eq!(store.sign_count(), 2);
        assert_eq!(store.sign(0, 0, 1, 2, 3, 0).as_deref(), Some("second"));
        store.delete_sign(1, 2, 3, 1);
        assert_eq!(store.sign_count(), 1);
        store.delete_signs(1, 2, 3);
        assert_eq!(store.sign(0, 0, 1, 2, 3, 0), None);
    }

    #[test]
    fn null_store_is_inert() {
        let store = NullStore;
        store.insert_block(0, 0, 1, 1, 1, 1);
        let mut maps = ChunkMaps::new(0, 0);
        store.load_blocks(&mut maps.blocks, 0, 0);
        assert!(maps.blocks.is_empty());
        assert_eq!(store.sign(0, 0, 1, 1, 1, 0), None);
    }
}
