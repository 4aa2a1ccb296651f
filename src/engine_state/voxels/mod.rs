//! # Voxel Engine Core
//!
//! This module contains the voxel storage side of the terrain: how voxels
//! are stored, grouped into chunks, edited, generated and persisted.
//!
//! ## Architecture
//!
//! * **map**: `SparseVoxelMap`, the open-addressing table every attribute
//!   channel is stored in
//! * **block**: Block ids, faces, shapes and the predicates built on them
//! * **chunk**: One 16x16 column of the world with its maps and signs
//! * **door_index**: Cached geometry of doors and gates for in-place toggles
//! * **world**: The chunk pool and the edit API
//! * **generation** and **store**: The seams to terrain generation and
//!   persistence
//!
//! ## Data Flow
//!
//! 1. An edit reaches `World`, which writes the owning chunk and the halos
//!    of its neighbors
//! 2. Touched chunks are marked dirty, spreading to neighbors around lights
//! 3. The scheduler rebuilds dirty chunks on the main thread or a worker
//! 4. The resulting mesh replaces the chunk's buffer
//!
//! ## Thread Safety
//!
//! Chunks are owned and mutated by the main thread only. Workers receive
//! deep copies of the maps they need.

pub mod block;
pub mod chunk;
pub mod door_index;
pub mod generation;
pub mod map;
pub mod store;
pub mod world;
