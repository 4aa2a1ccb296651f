//! # World Module
//!
//! This module provides the `World` struct, the explicitly owned context every
//! terrain operation runs against. It owns the resident chunks, the world
//! generator, the persistence store and the mesh builder used for synchronous
//! builds on the main thread.
//!
//! ## Architecture
//!
//! Resident chunks live in a `ChunkTable`: a contiguous arena with a fixed
//! capacity and a coordinate-to-slot index, giving O(1) lookup. Eviction
//! swaps the last chunk into the freed slot, so slot indices are only stable
//! within a frame. Nothing outside the table holds them across frames.
//!
//! ## Edits
//!
//! Every attribute edit at world `(x, y, z)` is written to the owning chunk
//! and, negated, to each neighbor whose one-voxel halo covers `(x, z)`.
//! Changed values are persisted through the store; edits to chunks that are
//! not resident go to the store only. Light sources carry no halo copy.
//!
//! Reads of a chunk that is not resident create it synchronously when the
//! pool has room.
//!
//! ## Door Fast Path
//!
//! Toggling a door or gate flips its open bit in the chunk's `DoorIndex`,
//! regenerates just that block's faces and patches them into the existing
//! buffer. The chunk is never marked dirty.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use web_time::Instant;

use super::block::{is_obstacle, EXTRA_BIT_OPEN};
use super::chunk::sign::SignList;
use super::chunk::{chunk_distance, chunked, Channel, Chunk, ChunkMaps};
use super::door_index::DoorEntry;
use super::generation::WorldGenerator;
use super::store::VoxelStore;
use crate::config::TerrainConfig;
use crate::engine_state::rendering::backend::{BufferHandle, GraphicsBackend};
use crate::engine_state::rendering::frustum::Viewpoint;
use crate::engine_state::rendering::meshing::{rebuild_openable, MeshBuilder, NeighborMaps};

/// Maximum light level a light source can hold.
pub const MAX_LIGHT: i32 = 15;

/// A bounded arena of resident chunks indexed by chunk coordinate.
pub struct ChunkTable {
    chunks: Vec<Chunk>,
    index: HashMap<(i32, i32), usize>,
    capacity: usize,
    show_lights: bool,
}

impl ChunkTable {
    /// Creates an empty table holding at most `capacity` chunks.
    pub fn new(capacity: usize, show_lights: bool) -> Self {
        ChunkTable {
            chunks: Vec::new(),
            index: HashMap::new(),
            capacity,
            show_lights,
        }
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` when no chunk is resident.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Maximum number of resident chunks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` when another chunk can be allocated.
    pub fn has_room(&self) -> bool {
        self.chunks.len() < self.capacity
    }

    /// Looks up a resident chunk.
    pub fn find(&self, p: i32, q: i32) -> Option<&Chunk> {
        self.index.get(&(p, q)).map(|&slot| &self.chunks[slot])
    }

    /// Mutable variant of [`ChunkTable::find`].
    pub fn find_mut(&mut self, p: i32, q: i32) -> Option<&mut Chunk> {
        self.index.get(&(p, q)).map(|&slot| &mut self.chunks[slot])
    }

    /// Allocates an empty, dirty chunk at `(p, q)`.
    ///
    /// # Returns
    /// `None` when the pool is full or the chunk is already resident.
    pub fn next_available(&mut self, p: i32, q: i32) -> Option<&mut Chunk> {
        if self.index.contains_key(&(p, q)) {
            warn!("Chunk ({}, {}) is already resident", p, q);
            return None;
        }
        if !self.has_room() {
            warn!(
                "Chunk pool is full ({} chunks), skipping ({}, {})",
                self.capacity, p, q
            );
            return None;
        }
        let slot = self.chunks.len();
        self.chunks.push(Chunk::new(p, q));
        self.index.insert((p, q), slot);
        self.dirty(p, q);
        Some(&mut self.chunks[slot])
    }

    /// Iterates over every resident chunk.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.iter()
    }

    /// Mutable variant of [`ChunkTable::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chunk> + '_ {
        self.chunks.iter_mut()
    }

    /// Removes the chunk in `slot` by moving the last chunk into its place.
    fn remove_at(&mut self, slot: usize) -> Chunk {
        let chunk = self.chunks.swap_remove(slot);
        self.index.remove(&chunk.coordinates());
        if let Some(moved) = self.chunks.get(slot) {
            self.index.insert(moved.coordinates(), slot);
        }
        chunk
    }

    /// Returns `true` when light sources exist in `(p, q)` or a resident
    /// 8-neighbor and lighting is enabled.
    pub fn has_lights(&self, p: i32, q: i32) -> bool {
        if !self.show_lights {
            return false;
        }
        (-1..=1).any(|dp| {
            (-1..=1).any(|dq| {
                self.find(p + dp, q + dq)
                    .is_some_and(|chunk| !chunk.maps.lights.is_empty())
            })
        })
    }

    /// Marks a chunk's geometry and signs stale.
    ///
    /// When light sources are nearby, every resident chunk of the 3x3
    /// neighborhood is marked too.
    pub fn dirty(&mut self, p: i32, q: i32) {
        let lights = self.has_lights(p, q);
        let Some(chunk) = self.find_mut(p, q) else {
            return;
        };
        chunk.dirty = true;
        chunk.dirty_signs = true;
        if lights {
            for dp in -1..=1 {
                for dq in -1..=1 {
                    if let Some(other) = self.find_mut(p + dp, q + dq) {
                        other.dirty = true;
                    }
                }
            }
        }
    }

    /// Evicts every chunk that no viewpoint is within `delete_radius` of.
    ///
    /// # Arguments
    /// * `centers` - Chunk coordinates of every tracked viewpoint
    /// * `delete_radius` - Chunks at this Chebyshev distance or more are evicted
    /// * `backend` - Receives the evicted chunks' buffer releases
    ///
    /// # Returns
    /// The number of evicted chunks.
    pub fn delete_if_far(
        &mut self,
        centers: &[(i32, i32)],
        delete_radius: i32,
        backend: &mut dyn GraphicsBackend,
    ) -> usize {
        let mut evicted = 0;
        let mut slot = 0;
        while slot < self.chunks.len() {
            let chunk = &self.chunks[slot];
            let keep = centers
                .iter()
                .any(|&center| chunk_distance(chunk.coordinates(), center) < delete_radius);
            if keep {
                slot += 1;
                continue;
            }
            // the swapped-in chunk now occupies `slot` and is examined next
            let mut chunk = self.remove_at(slot);
            debug!("Evicting chunk ({}, {})", chunk.p, chunk.q);
            chunk.release_buffers(backend);
            evicted += 1;
        }
        evicted
    }

    /// Evicts every chunk.
    pub fn clear(&mut self, backend: &mut dyn GraphicsBackend) {
        for chunk in self.chunks.iter_mut() {
            chunk.release_buffers(backend);
        }
        self.chunks.clear();
        self.index.clear();
    }
}

/// Populates a chunk's maps and signs from the generator and the store.
///
/// Runs on the main thread for synchronous creation and on worker threads
/// for asynchronous loads.
pub fn load_chunk(
    p: i32,
    q: i32,
    maps: &mut ChunkMaps,
    signs: &mut SignList,
    generator: &dyn WorldGenerator,
    store: &dyn VoxelStore,
) {
    let start_time = Instant::now();
    {
        let blocks = &mut maps.blocks;
        generator.generate(p, q, &mut |x, y, z, w| {
            blocks.set(x, y, z, w);
        });
    }
    store.load_blocks(&mut maps.blocks, p, q);
    store.load_extras(&mut maps.extras, p, q);
    store.load_lights(&mut maps.lights, p, q);
    store.load_shapes(&mut maps.shapes, p, q);
    store.load_signs(signs, p, q);
    store.load_transforms(&mut maps.transforms, p, q);
    debug!(
        "Loaded chunk ({}, {}) with {} blocks in {:?}",
        p,
        q,
        maps.blocks.len(),
        start_time.elapsed()
    );
}

/// Chunk coordinates of the neighbors whose halo covers world column `(x, z)`.
fn halo_chunks(x: i32, z: i32) -> impl Iterator<Item = (i32, i32)> {
    let p = chunked(x as f32);
    let q = chunked(z as f32);
    (-1..=1)
        .flat_map(|dx| (-1..=1).map(move |dz| (dx, dz)))
        .filter(move |&(dx, dz)| {
            if dx == 0 && dz == 0 {
                return false;
            }
            if dx != 0 && chunked((x + dx) as f32) == p {
                return false;
            }
            if dz != 0 && chunked((z + dz) as f32) == q {
                return false;
            }
            true
        })
        .map(move |(dx, dz)| (p + dx, q + dz))
}

/// Represents the resident voxel world and everything needed to edit and
/// rebuild it.
pub struct World {
    config: TerrainConfig,
    chunks: ChunkTable,
    generator: Arc<dyn WorldGenerator>,
    store: Arc<dyn VoxelStore>,
    mesh_builder: MeshBuilder,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Arguments
    /// * `config` - Pool capacity, radii and lighting settings
    /// * `generator` - Initial terrain for newly created chunks
    /// * `store` - Persistence for edits and loads
    pub fn new(
        config: TerrainConfig,
        generator: Arc<dyn WorldGenerator>,
        store: Arc<dyn VoxelStore>,
    ) -> Self {
        World {
            chunks: ChunkTable::new(config.max_chunks, config.show_lights),
            mesh_builder: MeshBuilder::new(config.show_lights),
            config,
            generator,
            store,
        }
    }

    /// The configuration the world was created with.
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// The resident chunks.
    pub fn chunks(&self) -> &ChunkTable {
        &self.chunks
    }

    /// Mutable access to the resident chunks.
    pub fn chunks_mut(&mut self) -> &mut ChunkTable {
        &mut self.chunks
    }

    /// Looks up a resident chunk.
    pub fn find_chunk(&self, p: i32, q: i32) -> Option<&Chunk> {
        self.chunks.find(p, q)
    }

    /// The terrain generator, shared with the worker pool.
    pub fn generator(&self) -> Arc<dyn WorldGenerator> {
        Arc::clone(&self.generator)
    }

    /// The persistence store, shared with the worker pool.
    pub fn store(&self) -> Arc<dyn VoxelStore> {
        Arc::clone(&self.store)
    }

    /// Allocates an empty chunk to be loaded later by a worker.
    ///
    /// # Returns
    /// `false` when the pool is full.
    pub fn init_chunk(&mut self, p: i32, q: i32) -> bool {
        self.chunks.next_available(p, q).is_some()
    }

    /// Allocates and synchronously loads chunk `(p, q)` on the calling thread.
    ///
    /// # Returns
    /// `false` when the pool is full.
    pub fn create_chunk(&mut self, p: i32, q: i32) -> bool {
        let generator = &*self.generator;
        let store = &*self.store;
        let Some(chunk) = self.chunks.next_available(p, q) else {
            return false;
        };
        load_chunk(p, q, &mut chunk.maps, &mut chunk.signs, generator, store);
        store.chunk_loaded(p, q);
        true
    }

    /// Marks a chunk stale, spreading to neighbors when lights are nearby.
    pub fn dirty_chunk(&mut self, p: i32, q: i32) {
        self.chunks.dirty(p, q);
    }

    /// Returns `true` when lights in or around `(p, q)` affect its geometry.
    pub fn has_lights(&self, p: i32, q: i32) -> bool {
        self.chunks.has_lights(p, q)
    }

    /// Borrowed 3x3 maps around `(p, q)`; absent neighbors are `None`.
    pub fn neighborhood(&self, p: i32, q: i32) -> NeighborMaps<'_> {
        let mut maps: NeighborMaps<'_> = [[None; 3]; 3];
        for (a, row) in maps.iter_mut().enumerate() {
            for (b, cell) in row.iter_mut().enumerate() {
                *cell = self
                    .chunks
                    .find(p + a as i32 - 1, q + b as i32 - 1)
                    .map(|chunk| &chunk.maps);
            }
        }
        maps
    }

    /// Deep copies of the 3x3 maps around `(p, q)`, for a worker job.
    pub fn snapshot(&self, p: i32, q: i32) -> [[Option<ChunkMaps>; 3]; 3] {
        let neighbors = self.neighborhood(p, q);
        neighbors.map(|row| row.map(|maps| maps.cloned()))
    }

    /// Rebuilds a resident chunk's geometry on the calling thread.
    pub fn gen_chunk_buffer(&mut self, p: i32, q: i32, backend: &mut dyn GraphicsBackend) {
        if self.chunks.find(p, q).is_none() {
            return;
        }
        let output = self.mesh_builder.build(p, q, &self.neighborhood(p, q));
        if let Some(chunk) = self.chunks.find_mut(p, q) {
            chunk.apply_mesh(output, backend);
            chunk.dirty = false;
        }
    }

    /// Regenerates a resident chunk's sign buffer.
    pub fn gen_sign_buffer(&mut self, p: i32, q: i32, backend: &mut dyn GraphicsBackend) {
        if let Some(chunk) = self.chunks.find_mut(p, q) {
            chunk.regenerate_sign_buffer(backend);
        }
    }

    /// Evicts chunks no viewpoint is within the delete radius of.
    ///
    /// # Returns
    /// The number of evicted chunks.
    pub fn delete_chunks(
        &mut self,
        viewpoints: &[Viewpoint],
        backend: &mut dyn GraphicsBackend,
    ) -> usize {
        let centers: Vec<(i32, i32)> = viewpoints.iter().map(Viewpoint::chunk).collect();
        self.chunks
            .delete_if_far(&centers, self.config.delete_radius, backend)
    }

    /// Evicts every chunk.
    pub fn delete_all_chunks(&mut self, backend: &mut dyn GraphicsBackend) {
        self.chunks.clear(backend);
    }

    /// Highest obstacle block in world column `(x, z)` of the resident
    /// chunk, or `-1`.
    pub fn highest_block(&self, x: f32, z: f32) -> i32 {
        let nx = x.round() as i32;
        let nz = z.round() as i32;
        let Some(chunk) = self.chunks.find(chunked(x), chunked(z)) else {
            return -1;
        };
        chunk
            .maps
            .blocks
            .iter()
            .filter(|&(ex, _, ez, ew)| ex == nx && ez == nz && is_obstacle(ew, 0, 0))
            .map(|(_, ey, _, _)| ey)
            .max()
            .unwrap_or(-1)
    }

    /// Writes one channel value into chunk `(p, q)`, or to the store alone
    /// when the chunk is not resident.
    ///
    /// # Returns
    /// `true` if a resident map changed.
    #[allow(clippy::too_many_arguments)]
    fn set_in_chunk(
        &mut self,
        channel: Channel,
        p: i32,
        q: i32,
        x: i32,
        y: i32,
        z: i32,
        w: i32,
        dirty: bool,
    ) -> bool {
        let Some(chunk) = self.chunks.find_mut(p, q) else {
            self.store.insert(channel, p, q, x, y, z, w);
            return false;
        };
        if !chunk.maps.channel_mut(channel).set(x, y, z, w) {
            return false;
        }
        chunk.generation = chunk.generation.wrapping_add(1);
        if dirty {
            self.chunks.dirty(p, q);
        }
        self.store.insert(channel, p, q, x, y, z, w);
        true
    }

    /// Writes a channel value to its owner and the negated value to every
    /// neighbor halo covering the position.
    fn set_with_halo(&mut self, channel: Channel, x: i32, y: i32, z: i32, w: i32, dirty: bool) {
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        self.set_in_chunk(channel, p, q, x, y, z, w, dirty);
        for (a, b) in halo_chunks(x, z) {
            self.set_in_chunk(channel, a, b, x, y, z, -w, dirty);
        }
    }

    /// Reads a channel value, creating the chunk when it is not resident.
    fn get_channel(&mut self, channel: Channel, x: i32, y: i32, z: i32) -> i32 {
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        if self.chunks.find(p, q).is_none() && !self.create_chunk(p, q) {
            return 0;
        }
        self.chunks
            .find(p, q)
            .map_or(0, |chunk| chunk.maps.channel(channel).get(x, y, z))
    }

    /// Places (or with `w == 0` removes) a block.
    ///
    /// Removing a block also clears its light, extra bits, shape, transform,
    /// signs and door entry.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, w: i32) {
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        self.set_in_chunk(Channel::Block, p, q, x, y, z, w, true);
        if w == 0 {
            self.unset_sign(x, y, z);
            self.set_light(x, y, z, 0);
            self.set_extra(x, y, z, 0);
            self.set_shape(x, y, z, 0);
            self.set_transform(x, y, z, 0);
            if let Some(chunk) = self.chunks.find_mut(p, q) {
                chunk.doors.clear(x, y, z);
            }
        }
        for (a, b) in halo_chunks(x, z) {
            self.set_in_chunk(Channel::Block, a, b, x, y, z, -w, true);
        }
    }

    /// Block id at a position.
    pub fn get_block(&mut self, x: i32, y: i32, z: i32) -> i32 {
        self.get_channel(Channel::Block, x, y, z)
    }

    /// Sets a light source level, clamped to `0..=15`.
    ///
    /// # Returns
    /// The clamped level.
    pub fn set_light(&mut self, x: i32, y: i32, z: i32, w: i32) -> i32 {
        let w = w.clamp(0, MAX_LIGHT);
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        self.set_in_chunk(Channel::Light, p, q, x, y, z, w, true);
        w
    }

    /// Light source level at a position.
    pub fn get_light(&mut self, x: i32, y: i32, z: i32) -> i32 {
        self.get_channel(Channel::Light, x, y, z)
    }

    /// Switches a light source between off and full intensity.
    ///
    /// Only resident chunks are affected.
    pub fn toggle_light(&mut self, x: i32, y: i32, z: i32) {
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        let Some(chunk) = self.chunks.find(p, q) else {
            return;
        };
        let w = if chunk.maps.lights.get(x, y, z) != 0 { 0 } else { MAX_LIGHT };
        self.set_in_chunk(Channel::Light, p, q, x, y, z, w, true);
    }

    /// Sets the extra bits of a block.
    pub fn set_extra(&mut self, x: i32, y: i32, z: i32, w: i32) {
        self.set_with_halo(Channel::Extra, x, y, z, w, true);
    }

    /// Sets the extra bits of a block without marking any chunk dirty.
    pub fn set_extra_non_dirty(&mut self, x: i32, y: i32, z: i32, w: i32) {
        self.set_with_halo(Channel::Extra, x, y, z, w, false);
    }

    /// Extra bits at a position.
    pub fn get_extra(&mut self, x: i32, y: i32, z: i32) -> i32 {
        self.get_channel(Channel::Extra, x, y, z)
    }

    /// Sets the shape of a block.
    pub fn set_shape(&mut self, x: i32, y: i32, z: i32, w: i32) {
        self.set_with_halo(Channel::Shape, x, y, z, w, true);
    }

    /// Shape id at a position.
    pub fn get_shape(&mut self, x: i32, y: i32, z: i32) -> i32 {
        self.get_channel(Channel::Shape, x, y, z)
    }

    /// Sets the orientation transform of a block.
    pub fn set_transform(&mut self, x: i32, y: i32, z: i32, w: i32) {
        self.set_with_halo(Channel::Transform, x, y, z, w, true);
    }

    /// Transform at a position.
    pub fn get_transform(&mut self, x: i32, y: i32, z: i32) -> i32 {
        self.get_channel(Channel::Transform, x, y, z)
    }

    /// Attaches text to one face of a block. Empty text removes the sign.
    pub fn set_sign(&mut self, x: i32, y: i32, z: i32, face: i32, text: &str) {
        if text.is_empty() {
            self.unset_sign_face(x, y, z, face);
            return;
        }
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        if let Some(chunk) = self.chunks.find_mut(p, q) {
            chunk.signs.add(x, y, z, face, text);
            chunk.dirty_signs = true;
        }
        self.store.insert_sign(p, q, x, y, z, face, text);
    }

    /// Text of the sign on one block face.
    pub fn get_sign(&self, x: i32, y: i32, z: i32, face: i32) -> Option<String> {
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        match self.chunks.find(p, q) {
            Some(chunk) => chunk.signs.get(x, y, z, face).map(str::to_owned),
            None => self.store.sign(p, q, x, y, z, face),
        }
    }

    /// Removes every sign on a block.
    pub fn unset_sign(&mut self, x: i32, y: i32, z: i32) {
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        match self.chunks.find_mut(p, q) {
            Some(chunk) => {
                if chunk.signs.remove_all(x, y, z) {
                    chunk.dirty_signs = true;
                    self.store.delete_signs(x, y, z);
                }
            }
            None => self.store.delete_signs(x, y, z),
        }
    }

    /// Removes the sign on one block face.
    pub fn unset_sign_face(&mut self, x: i32, y: i32, z: i32, face: i32) {
        let p = chunked(x as f32);
        let q = chunked(z as f32);
        match self.chunks.find_mut(p, q) {
            Some(chunk) => {
                if chunk.signs.remove(x, y, z, face) {
                    chunk.dirty_signs = true;
                    self.store.delete_sign(x, y, z, face);
                }
            }
            None => self.store.delete_sign(x, y, z, face),
        }
    }

    /// Opens or closes the door or gate at a position in place.
    ///
    /// The matching half of a door is toggled with it. Only the affected
    /// vertex ranges of the chunk buffer are rewritten.
    ///
    /// # Returns
    /// `false` when no built door or gate exists at the position.
    pub fn toggle_door(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        backend: &mut dyn GraphicsBackend,
    ) -> bool {
        let Some(chunk) = self.chunks.find_mut(chunked(x as f32), chunked(z as f32)) else {
            return false;
        };
        let Some(buffer) = chunk.buffer else {
            return false;
        };
        let Some(entry) = chunk.doors.get_mut(x, y, z) else {
            return false;
        };
        let shape = entry.geometry.shape;
        let mut toggled = vec![toggle_entry(entry, buffer, backend)];

        if let Some((other_shape, dy)) = shape.matching_door_half() {
            if let Some(other) = chunk
                .doors
                .get_mut(x, y + dy, z)
                .filter(|other| other.geometry.shape == other_shape)
            {
                toggled.push(toggle_entry(other, buffer, backend));
            }
        }

        for (position, extra) in toggled {
            self.set_extra_non_dirty(position[0], position[1], position[2], extra);
        }
        true
    }
}

/// Flips an entry's open bit and patches its vertices into `buffer`.
///
/// # Returns
/// The entry's position and new extra bits.
fn toggle_entry(
    entry: &mut DoorEntry,
    buffer: BufferHandle,
    backend: &mut dyn GraphicsBackend,
) -> ([i32; 3], i32) {
    entry.geometry.extra ^= EXTRA_BIT_OPEN;
    let vertices = rebuild_openable(entry);
    backend.partial_update(
        buffer,
        entry.geometry.offset * std::mem::size_of::<f32>(),
        bytemuck::cast_slice(&vertices),
    );
    let position = entry.position;
    debug!(
        "Toggled {:?} at ({}, {}, {})",
        entry.geometry.shape, position.x, position.y, position.z
    );
    ([position.x, position.y, position.z], entry.geometry.extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::backend::RecordingBackend;
    use crate::engine_state::voxels::generation::{EmptyGenerator, FlatGenerator};
    use crate::engine_state::voxels::store::MemoryStore;

    fn world_with(store: Arc<MemoryStore>) -> World {
        let config = TerrainConfig {
            max_chunks: 16,
            ..TerrainConfig::default()
        };
        World::new(config, Arc::new(EmptyGenerator), store)
    }

    fn world() -> World {
        world_with(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn table_lookup_survives_swap_removal() {
        let mut table = ChunkTable::new(8, false);
        for p in 0..5 {
            table.next_available(p, 0).unwrap();
        }
        let mut backend = RecordingBackend::new();
        let evicted = table.delete_if_far(&[(4, 0)], 2, &mut backend);
        assert_eq!(evicted, 3);
        assert_eq!(table.len(), 2);
        assert!(table.find(0, 0).is_none());
        assert_eq!(table.find(3, 0).unwrap().p, 3);
        assert_eq!(table.find(4, 0).unwrap().p, 4);
    }

    #[test]
    fn pool_exhaustion_is_soft() {
        let mut table = ChunkTable::new(1, false);
        assert!(table.next_available(0, 0).is_some());
        assert!(table.next_available(1, 0).is_none());
        assert!(table.next_available(0, 0).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dirty_spreads_only_with_lights() {
        let mut table = ChunkTable::new(16, true);
        for p in -1..=1 {
            for q in -1..=1 {
                table.next_available(p, q).unwrap().dirty = false;
            }
        }
        table.dirty(0, 0);
        assert_eq!(table.iter().filter(|c| c.dirty).count(), 1);

        table.find_mut(1, 1).unwrap().maps.lights.set(17, 5, 17, 15);
        table.dirty(0, 0);
        assert_eq!(table.iter().filter(|c| c.dirty).count(), 9);
        table.dirty(0, 0);
        assert_eq!(table.iter().filter(|c| c.dirty).count(), 9);
    }

    #[test]
    fn edits_mirror_into_neighbor_halos() {
        let mut world = world();
        for p in -1..=1 {
            for q in -1..=1 {
                assert!(world.create_chunk(p, q));
            }
        }
        world.set_block(15, 3, 0, 4);
        assert_eq!(world.find_chunk(0, 0).unwrap().maps.blocks.get(15, 3, 0), 4);
        assert_eq!(world.find_chunk(1, 0).unwrap().maps.blocks.get(15, 3, 0), -4);
        assert_eq!(world.find_chunk(0, -1).unwrap().maps.blocks.get(15, 3, 0), -4);
        assert_eq!(world.find_chunk(1, -1).unwrap().maps.blocks.get(15, 3, 0), -4);
        assert_eq!(world.find_chunk(-1, 0).unwrap().maps.blocks.get(15, 3, 0), 0);
    }

    #[test]
    fn removing_a_block_clears_its_attributes() {
        let mut world = world();
        world.create_chunk(0, 0);
        world.set_block(4, 4, 4, 8);
        world.set_shape(4, 4, 4, 17);
        world.set_extra(4, 4, 4, EXTRA_BIT_OPEN);
        world.set_light(4, 4, 4, 40);
        world.set_sign(4, 4, 4, 0, "hi");
        assert_eq!(world.get_light(4, 4, 4), MAX_LIGHT);

        world.set_block(4, 4, 4, 0);
        assert_eq!(world.get_shape(4, 4, 4), 0);
        assert_eq!(world.get_extra(4, 4, 4), 0);
        assert_eq!(world.get_light(4, 4, 4), 0);
        assert_eq!(world.get_sign(4, 4, 4, 0), None);
    }

    #[test]
    fn edits_to_absent_chunks_reach_the_store_only() {
        let store = Arc::new(MemoryStore::new());
        let mut world = world_with(Arc::clone(&store));
        world.set_block(40, 2, 40, 3);
        assert!(world.chunks().is_empty());
        assert_eq!(store.voxel(Channel::Block, 2, 2, 40, 2, 40), Some(3));

        assert_eq!(world.get_block(40, 2, 40), 3);
        assert!(world.find_chunk(2, 2).is_some());
        assert_eq!(store.loaded_chunks(), vec![(2, 2)]);
    }

    #[test]
    fn toggle_light_switches_between_off_and_full() {
        let mut world = world();
        world.create_chunk(0, 0);
        world.toggle_light(1, 1, 1);
        assert_eq!(world.get_light(1, 1, 1), MAX_LIGHT);
        world.toggle_light(1, 1, 1);
        assert_eq!(world.get_light(1, 1, 1), 0);
    }

    #[test]
    fn highest_block_ignores_passable_blocks() {
        let config = TerrainConfig::default();
        let generator = FlatGenerator { height: 3, block: 3 };
        let mut world = World::new(config, Arc::new(generator), Arc::new(MemoryStore::new()));
        world.create_chunk(0, 0);
        assert_eq!(world.highest_block(2.2, 5.0), 2);
        world.set_block(2, 6, 5, 16);
        assert_eq!(world.highest_block(2.0, 5.0), 2);
        world.set_block(2, 9, 5, 3);
        assert_eq!(world.highest_block(2.0, 4.6), 9);
        assert_eq!(world.highest_block(100.0, 5.0), -1);
    }

    #[test]
    fn empty_sign_text_removes_the_sign() {
        let mut world = world();
        world.create_chunk(0, 0);
        world.set_sign(1, 2, 3, 4, "hello");
        assert_eq!(world.get_sign(1, 2, 3, 4).as_deref(), Some("hello"));
        world.set_sign(1, 2, 3, 4, "");
        assert_eq!(world.get_sign(1, 2, 3, 4), None);
    }
}
