//! # Engine State Module
//!
//! The terrain engine: chunk storage, meshing, background workers and the
//! per-frame scheduler, tied together by `TerrainState`.
//!
//! ## Key Components
//!
//! * `TerrainState` - Owns the world and the scheduler and runs one frame
//! * `rendering` - Vertex format, frustum culling, the graphics backend seam
//!   and the mesh builder
//! * `scheduler` - Decides which chunk is built next and where
//! * `task_management` - The worker pool and its jobs
//! * `voxels` - Voxel maps, chunks, world edits, generation and persistence
//!
//! ## Architecture
//!
//! Everything runs against an explicitly owned `World`; there is no global
//! state. The host calls `TerrainState::update` once per frame with the
//! current viewpoints and its graphics backend. Edits go through
//! `TerrainState::world` at any point between frames.

use std::sync::Arc;

use log::{debug, info};
use web_time::Instant;

use crate::config::TerrainConfig;
use rendering::backend::GraphicsBackend;
use scheduler::{ChunkScheduler, Viewpoint};
use voxels::generation::WorldGenerator;
use voxels::store::VoxelStore;
use voxels::world::World;

pub mod rendering;
pub mod scheduler;
pub mod task_management;
pub mod voxels;

/// Counters describing one `TerrainState::update`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Chunks evicted this frame.
    pub evicted: usize,
    /// Jobs handed to workers this frame.
    pub assigned: usize,
    /// Sign buffers regenerated outside a mesh build.
    pub signs_refreshed: usize,
    /// Resident chunks after the frame.
    pub resident: usize,
}

/// The terrain subsystem as a host sees it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cgmath::{Point3, Vector3};
/// use voxel_terrain::config::TerrainConfig;
/// use voxel_terrain::engine_state::TerrainState;
/// use voxel_terrain::engine_state::rendering::backend::RecordingBackend;
/// use voxel_terrain::engine_state::scheduler::Viewpoint;
/// use voxel_terrain::engine_state::voxels::generation::FlatGenerator;
/// use voxel_terrain::engine_state::voxels::store::NullStore;
///
/// let config = TerrainConfig { worker_count: 0, ..Default::default() };
/// let mut terrain = TerrainState::new(config, Arc::new(FlatGenerator::default()), Arc::new(NullStore));
/// let mut backend = RecordingBackend::new();
/// let viewpoint = Viewpoint::new(Point3::new(8.0, 20.0, 8.0), Vector3::unit_x(), 65.0);
///
/// let stats = terrain.update(&[viewpoint], &mut backend);
/// assert_eq!(stats.resident, 9);
/// ```
pub struct TerrainState {
    /// The resident world; edit it between frames.
    pub world: World,
    /// The chunk scheduler and its workers.
    pub scheduler: ChunkScheduler,
}

impl TerrainState {
    /// Creates the world and starts the workers.
    ///
    /// # Arguments
    /// * `config` - Pool capacity, radii, worker count and lighting settings
    /// * `generator` - Initial terrain for new chunks
    /// * `store` - Persistence for edits and loads
    pub fn new(
        config: TerrainConfig,
        generator: Arc<dyn WorldGenerator>,
        store: Arc<dyn VoxelStore>,
    ) -> Self {
        info!(
            "Creating terrain: {} workers, create radius {}, delete radius {}, {} chunk slots",
            config.worker_count, config.create_radius, config.delete_radius, config.max_chunks
        );
        let world = World::new(config, generator, store);
        let scheduler = ChunkScheduler::new(&world);
        TerrainState { world, scheduler }
    }

    /// Runs one frame: evicts far chunks, schedules builds and refreshes
    /// stale sign buffers.
    ///
    /// # Arguments
    /// * `viewpoints` - Tracked cameras; the first is the primary viewpoint
    /// * `backend` - Receives every upload and release of the frame
    pub fn update(
        &mut self,
        viewpoints: &[Viewpoint],
        backend: &mut dyn GraphicsBackend,
    ) -> FrameStats {
        let start_time = Instant::now();
        let mut stats = FrameStats {
            evicted: self.world.delete_chunks(viewpoints, backend),
            ..Default::default()
        };
        stats.assigned = self
            .scheduler
            .ensure_chunks(&mut self.world, viewpoints, backend);
        for chunk in self.world.chunks_mut().iter_mut() {
            if chunk.dirty_signs && !chunk.dirty && chunk.buffer.is_some() {
                chunk.regenerate_sign_buffer(backend);
                stats.signs_refreshed += 1;
            }
        }
        stats.resident = self.world.chunks().len();
        debug!("Terrain frame {:?} in {:?}", stats, start_time.elapsed());
        stats
    }

    /// Stops the workers and releases every chunk.
    pub fn shutdown(&mut self, backend: &mut dyn GraphicsBackend) {
        self.scheduler.shutdown();
        self.world.delete_all_chunks(backend);
        info!("Terrain shut down");
    }
}
