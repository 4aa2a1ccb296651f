//! # Worker Jobs
//!
//! This module defines `WorkerItem`, the unit of work handed to a background
//! worker.
//!
//! ## Ownership
//!
//! An item owns deep copies of the 3x3 chunk maps around the chunk it builds.
//! The scheduler moves the item into a worker, the worker moves it back once
//! the mesh is built, and at no point do both sides hold it. The worker never
//! sees live chunk state.
//!
//! ## Job Lifecycle
//! 1. The scheduler snapshots the neighborhood into a new item
//! 2. A worker calls `process()`: loads the center chunk first when `load`
//!    is set, then meshes the snapshot
//! 3. The scheduler harvests the item, committing loaded maps back into the
//!    chunk and uploading `output`

use crate::engine_state::rendering::meshing::{MeshBuilder, MeshOutput, NeighborMaps};
use crate::engine_state::voxels::chunk::sign::SignList;
use crate::engine_state::voxels::chunk::ChunkMaps;
use crate::engine_state::voxels::generation::WorldGenerator;
use crate::engine_state::voxels::store::VoxelStore;
use crate::engine_state::voxels::world::load_chunk;

/// A self-contained mesh build for one chunk.
#[derive(Debug)]
pub struct WorkerItem {
    /// Chunk coordinate being built.
    pub p: i32,
    /// Chunk coordinate being built.
    pub q: i32,
    /// Whether the center maps must be populated before meshing.
    pub load: bool,
    /// Edit generation of the center chunk when the snapshot was taken.
    pub generation: u64,
    /// Private copies of the neighborhood, indexed `[dp + 1][dq + 1]`.
    pub maps: [[Option<ChunkMaps>; 3]; 3],
    /// Signs of the center chunk, filled in by a load.
    pub signs: SignList,
    /// The mesh, once processed.
    pub output: Option<MeshOutput>,
}

impl WorkerItem {
    /// Creates an unprocessed job.
    ///
    /// # Arguments
    /// * `p`, `q` - The chunk to build
    /// * `load` - Populate the center maps from the generator and store first
    /// * `maps` - Snapshot of the neighborhood; the center must be present
    pub fn new(p: i32, q: i32, load: bool, maps: [[Option<ChunkMaps>; 3]; 3]) -> Self {
        WorkerItem {
            p,
            q,
            load,
            generation: 0,
            maps,
            signs: SignList::new(),
            output: None,
        }
    }

    /// Runs the job on the calling thread.
    ///
    /// Only reads the item's own snapshot and writes its own output, so it
    /// needs no locking.
    pub fn process(
        &mut self,
        builder: &MeshBuilder,
        generator: &dyn WorldGenerator,
        store: &dyn VoxelStore,
    ) {
        if self.load {
            if let Some(center) = self.maps[1][1].as_mut() {
                load_chunk(self.p, self.q, center, &mut self.signs, generator, store);
            }
        }
        let neighbors: NeighborMaps<'_> = self
            .maps
            .each_ref()
            .map(|row| row.each_ref().map(Option::as_ref));
        self.output = Some(builder.build(self.p, self.q, &neighbors));
    }

    /// Returns `true` once `process` has run.
    pub fn is_processed(&self) -> bool {
        self.output.is_some()
    }

    /// Takes the center maps out of the job.
    pub fn take_center(&mut self) -> Option<ChunkMaps> {
        self.maps[1][1].take()
    }
}
