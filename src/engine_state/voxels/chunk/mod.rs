//! # Chunk Module
//!
//! This module provides the `Chunk` struct: one 16x16 column of the world,
//! full world height, addressed by integer grid coordinates `(p, q)`.
//!
//! ## Storage
//!
//! A chunk keeps one `SparseVoxelMap` per attribute channel (`ChunkMaps`):
//! - `blocks`: block ids
//! - `extras`: extra bit flags (open, control)
//! - `lights`: light source levels, `0..=15`
//! - `shapes`: shape ids
//! - `transforms`: orientation transforms
//!
//! Every map is anchored at `(p*16 - 1, 0, q*16 - 1)`, so it addresses the
//! chunk's own 16x16 column plus a one-voxel halo on each horizontal side.
//! Edits near a chunk border are mirrored into the halo of each neighbor with
//! a negated value, which lets a mesh build see across the border without
//! touching the neighbor's maps.
//!
//! ## Lifecycle
//!
//! A chunk is created dirty. Its maps are populated either synchronously on
//! the main thread or by a worker job, after which it is meshed, uploaded and
//! eventually evicted once every viewpoint has moved away.

use cgmath::Point3;
use sign::SignList;

use super::door_index::DoorIndex;
use super::map::{SparseVoxelMap, ATTRIBUTE_MAP_MASK, BLOCK_MAP_MASK};
use crate::engine_state::rendering::backend::{BufferHandle, GraphicsBackend};
use crate::engine_state::rendering::meshing::MeshOutput;

pub mod sign;

/// The width and depth of a chunk in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// The number of addressable block layers.
pub const WORLD_HEIGHT: i32 = 256;

/// Converts a world coordinate to the chunk coordinate containing it.
pub fn chunked(x: f32) -> i32 {
    (x.round() / CHUNK_SIZE as f32).floor() as i32
}

/// Chebyshev distance between two chunk coordinates.
pub fn chunk_distance(a: (i32, i32), b: (i32, i32)) -> i32 {
    let dp = (a.0 - b.0).abs();
    let dq = (a.1 - b.1).abs();
    dp.max(dq)
}

/// The world coordinate every map of chunk `(p, q)` is anchored at.
pub fn chunk_origin(p: i32, q: i32) -> Point3<i32> {
    Point3::new(p * CHUNK_SIZE - 1, 0, q * CHUNK_SIZE - 1)
}

/// One of the per-voxel attribute channels of a chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Block ids.
    Block,
    /// Extra bit flags.
    Extra,
    /// Light source levels.
    Light,
    /// Shape ids.
    Shape,
    /// Orientation transforms.
    Transform,
}

impl Channel {
    /// Every channel, in storage order.
    pub fn all() -> [Channel; 5] {
        [
            Channel::Block,
            Channel::Extra,
            Channel::Light,
            Channel::Shape,
            Channel::Transform,
        ]
    }
}

/// The attribute maps of one chunk.
///
/// Cloning produces the independent snapshot a worker job reads from.
#[derive(Clone, Debug)]
pub struct ChunkMaps {
    /// Block ids.
    pub blocks: SparseVoxelMap,
    /// Extra bit flags.
    pub extras: SparseVoxelMap,
    /// Light source levels.
    pub lights: SparseVoxelMap,
    /// Shape ids.
    pub shapes: SparseVoxelMap,
    /// Orientation transforms.
    pub transforms: SparseVoxelMap,
}

impl ChunkMaps {
    /// Allocates empty maps for chunk `(p, q)`.
    pub fn new(p: i32, q: i32) -> Self {
        let origin = chunk_origin(p, q);
        ChunkMaps {
            blocks: SparseVoxelMap::new(origin, BLOCK_MAP_MASK),
            extras: SparseVoxelMap::new(origin, ATTRIBUTE_MAP_MASK),
            lights: SparseVoxelMap::new(origin, ATTRIBUTE_MAP_MASK),
            shapes: SparseVoxelMap::new(origin, ATTRIBUTE_MAP_MASK),
            transforms: SparseVoxelMap::new(origin, ATTRIBUTE_MAP_MASK),
        }
    }

    /// The map backing a channel.
    pub fn channel(&self, channel: Channel) -> &SparseVoxelMap {
        match channel {
            Channel::Block => &self.blocks,
            Channel::Extra => &self.extras,
            Channel::Light => &self.lights,
            Channel::Shape => &self.shapes,
            Channel::Transform => &self.transforms,
        }
    }

    /// Mutable variant of [`ChunkMaps::channel`].
    pub fn channel_mut(&mut self, channel: Channel) -> &mut SparseVoxelMap {
        match channel {
            Channel::Block => &mut self.blocks,
            Channel::Extra => &mut self.extras,
            Channel::Light => &mut self.lights,
            Channel::Shape => &mut self.shapes,
            Channel::Transform => &mut self.transforms,
        }
    }
}

/// Represents one resident column of the voxel world.
pub struct Chunk {
    /// Chunk x coordinate.
    pub p: i32,
    /// Chunk z coordinate.
    pub q: i32,
    /// Authoritative voxel data.
    pub maps: ChunkMaps,
    /// Doors and gates from the last mesh build.
    pub doors: DoorIndex,
    /// Signs attached to blocks in this chunk.
    pub signs: SignList,
    /// Geometry no longer matches the maps.
    pub dirty: bool,
    /// The sign buffer no longer matches `signs`.
    pub dirty_signs: bool,
    /// Bumped on every write to `maps`.
    pub generation: u64,
    /// Lowest y with geometry, from the last mesh build.
    pub miny: i32,
    /// Highest y with geometry, from the last mesh build.
    pub maxy: i32,
    /// Number of faces in `buffer`.
    pub faces: usize,
    /// Number of glyph quads in `sign_buffer`.
    pub sign_faces: usize,
    /// Vertex buffer holding the chunk geometry.
    pub buffer: Option<BufferHandle>,
    /// Vertex buffer holding the sign glyphs.
    pub sign_buffer: Option<BufferHandle>,
}

impl Chunk {
    /// Creates a chunk with empty maps, marked dirty.
    pub fn new(p: i32, q: i32) -> Self {
        Chunk {
            p,
            q,
            maps: ChunkMaps::new(p, q),
            doors: DoorIndex::new(chunk_origin(p, q), ATTRIBUTE_MAP_MASK),
            signs: SignList::new(),
            dirty: true,
            dirty_signs: true,
            generation: 0,
            miny: 0,
            maxy: 0,
            faces: 0,
            sign_faces: 0,
            buffer: None,
            sign_buffer: None,
        }
    }

    /// The chunk's grid coordinates.
    pub fn coordinates(&self) -> (i32, i32) {
        (self.p, self.q)
    }

    /// Chebyshev distance from this chunk to `(p, q)`.
    pub fn distance(&self, p: i32, q: i32) -> i32 {
        chunk_distance(self.coordinates(), (p, q))
    }

    /// Returns `true` when world column `(x, z)` belongs to this chunk.
    pub fn owns(&self, x: i32, z: i32) -> bool {
        x.div_euclid(CHUNK_SIZE) == self.p && z.div_euclid(CHUNK_SIZE) == self.q
    }

    /// Installs a finished mesh build, replacing the previous geometry.
    ///
    /// The door index, vertical bounds and face count are taken from
    /// `output`, the old vertex buffer is released and the new one uploaded.
    /// The sign buffer is regenerated as well.
    pub fn apply_mesh(&mut self, output: MeshOutput, backend: &mut dyn GraphicsBackend) {
        self.miny = output.miny;
        self.maxy = output.maxy;
        self.faces = output.faces;
        self.doors = output.doors;
        if let Some(handle) = self.buffer.take() {
            backend.release(handle);
        }
        self.buffer = Some(backend.upload(bytemuck::cast_slice(&output.vertices)));
        self.regenerate_sign_buffer(backend);
    }

    /// Uploads the current sign list, replacing the previous sign buffer.
    pub fn regenerate_sign_buffer(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(handle) = self.sign_buffer.take() {
            backend.release(handle);
        }
        self.sign_buffer = Some(backend.upload_signs(self.signs.as_slice()));
        self.sign_faces = self.signs.glyph_count();
        self.dirty_signs = false;
    }

    /// Releases both GPU buffers.
    pub fn release_buffers(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(handle) = self.buffer.take() {
            backend.release(handle);
        }
        if let Some(handle) = self.sign_buffer.take() {
            backend.release(handle);
        }
        self.faces = 0;
        self.sign_faces = 0;
    }
}
