//! # Chunk Scheduler
//!
//! The per-frame driver that keeps the chunks around a viewpoint built. It
//! runs on the main thread and is the only code that talks to both the
//! worker pool and the graphics backend.
//!
//! ## Frame Steps
//!
//! `ensure_chunks` performs, in order:
//!
//! 1. **Harvest** (`check_workers`): every `Done` job is committed. A job
//!    that loaded its chunk replaces the chunk's maps and signs with its
//!    populated copies and acknowledges the load to the store. The mesh is
//!    always uploaded. Jobs for chunks evicted in the meantime are dropped.
//!    A chunk edited after its snapshot was taken is marked dirty again.
//! 2. **Force** (`force_chunks`): the 3x3 chunks around the primary
//!    viewpoint are created and meshed synchronously when missing or dirty.
//!    This bounds the main-thread stall to nine builds per frame.
//! 3. **Assign** (`ensure_chunks_worker`): every idle worker receives the
//!    best candidate from its static partition within the create radius.
//!
//! ## Candidate Score
//!
//! Lower wins. Packed into one integer, most significant first:
//!
//! - bit 24: the chunk is outside the view frustum
//! - bit 16: the chunk already has a buffer and is only stale
//! - low bits: Chebyshev distance to the viewpoint

use log::{debug, warn};
use web_time::Instant;

use crate::engine_state::rendering::backend::GraphicsBackend;
use crate::engine_state::rendering::frustum::Frustum;
use crate::engine_state::rendering::meshing::MeshBuilder;
use crate::engine_state::task_management::task::WorkerItem;
use crate::engine_state::task_management::{worker_for, WorkerPool, WorkerState};
use crate::engine_state::voxels::chunk::WORLD_HEIGHT;
use crate::engine_state::voxels::world::World;

pub use crate::engine_state::rendering::frustum::Viewpoint;

/// Score above every real candidate.
const NO_CANDIDATE: i32 = 0x0fff_ffff;

/// Radius of the synchronously built neighborhood.
const FORCE_RADIUS: i32 = 1;

/// Drives chunk creation and mesh builds.
pub struct ChunkScheduler {
    pool: WorkerPool,
}

impl ChunkScheduler {
    /// Starts a scheduler with `world.config().worker_count` workers.
    pub fn new(world: &World) -> Self {
        let config = world.config();
        let pool = WorkerPool::new(
            config.worker_count,
            MeshBuilder::new(config.show_lights),
            world.generator(),
            world.store(),
        );
        ChunkScheduler { pool }
    }

    /// Wraps an existing pool.
    pub fn with_pool(pool: WorkerPool) -> Self {
        ChunkScheduler { pool }
    }

    /// The worker pool.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Runs one frame of scheduling.
    ///
    /// # Arguments
    /// * `world` - The resident world
    /// * `viewpoints` - Tracked cameras; the first is the primary viewpoint
    ///   chunks are forced and prioritized around
    /// * `backend` - Receives uploads for harvested and forced builds
    ///
    /// # Returns
    /// The number of jobs assigned this frame.
    pub fn ensure_chunks(
        &mut self,
        world: &mut World,
        viewpoints: &[Viewpoint],
        backend: &mut dyn GraphicsBackend,
    ) -> usize {
        self.check_workers(world, backend);
        let Some(primary) = viewpoints.first() else {
            return 0;
        };
        self.force_chunks(world, primary, backend);

        let frustum = Frustum::new(primary, world.config().render_radius);
        let mut assigned = 0;
        for index in 0..self.pool.len() {
            if !self.pool.is_idle(index) {
                continue;
            }
            if self.ensure_chunks_worker(world, primary, &frustum, index) {
                assigned += 1;
            }
        }
        assigned
    }

    /// Commits every finished job.
    ///
    /// # Returns
    /// The number of jobs harvested.
    pub fn check_workers(&mut self, world: &mut World, backend: &mut dyn GraphicsBackend) -> usize {
        let mut harvested = 0;
        for index in 0..self.pool.len() {
            let Some(mut item) = self.pool.take_finished(index) else {
                continue;
            };
            harvested += 1;
            let (p, q) = (item.p, item.q);
            let store = world.store();
            let Some(chunk) = world.chunks_mut().find_mut(p, q) else {
                debug!("Dropping build of evicted chunk ({}, {})", p, q);
                continue;
            };
            if item.load {
                if let Some(maps) = item.take_center() {
                    chunk.maps = maps;
                }
                chunk.signs = std::mem::take(&mut item.signs);
                store.chunk_loaded(p, q);
            }
            if let Some(output) = item.output.take() {
                chunk.apply_mesh(output, backend);
            }
            if chunk.generation != item.generation {
                debug!("Chunk ({}, {}) was edited during its build", p, q);
                chunk.dirty = true;
            }
        }
        harvested
    }

    /// Synchronously creates and builds the chunks around `viewpoint`.
    pub fn force_chunks(
        &mut self,
        world: &mut World,
        viewpoint: &Viewpoint,
        backend: &mut dyn GraphicsBackend,
    ) {
        let (p, q) = viewpoint.chunk();
        for dp in -FORCE_RADIUS..=FORCE_RADIUS {
            for dq in -FORCE_RADIUS..=FORCE_RADIUS {
                let (a, b) = (p + dp, q + dq);
                match world.find_chunk(a, b) {
                    Some(chunk) if !chunk.dirty => {}
                    Some(_) => world.gen_chunk_buffer(a, b, backend),
                    None => {
                        if world.create_chunk(a, b) {
                            world.gen_chunk_buffer(a, b, backend);
                        }
                    }
                }
            }
        }
    }

    /// Picks and assigns the best candidate of worker `index`.
    ///
    /// A missing candidate is allocated empty and built with `load` set.
    ///
    /// # Returns
    /// `true` when a job was assigned.
    pub fn ensure_chunks_worker(
        &mut self,
        world: &mut World,
        viewpoint: &Viewpoint,
        frustum: &Frustum,
        index: usize,
    ) -> bool {
        let start_time = Instant::now();
        let count = self.pool.len();
        let (p, q) = viewpoint.chunk();
        let r = world.config().create_radius;
        let mut best_score = NO_CANDIDATE;
        let mut best = (0, 0);
        for dp in -r..=r {
            for dq in -r..=r {
                let (a, b) = (p + dp, q + dq);
                if worker_for(a, b, count) != Some(index) {
                    continue;
                }
                let chunk = world.find_chunk(a, b);
                if chunk.is_some_and(|chunk| !chunk.dirty) {
                    continue;
                }
                let distance = dp.abs().max(dq.abs());
                let invisible = i32::from(!frustum.chunk_visible(a, b, 0, WORLD_HEIGHT));
                let stale = i32::from(chunk.is_some_and(|chunk| chunk.buffer.is_some()));
                let score = (invisible << 24) | (stale << 16) | distance;
                if score < best_score {
                    best_score = score;
                    best = (a, b);
                }
            }
        }
        if best_score == NO_CANDIDATE {
            return false;
        }

        let (a, b) = best;
        let load = world.find_chunk(a, b).is_none();
        if load && !world.init_chunk(a, b) {
            return false;
        }
        let mut item = WorkerItem::new(a, b, load, world.snapshot(a, b));
        item.generation = world.find_chunk(a, b).map_or(0, |chunk| chunk.generation);
        if let Err(item) = self.pool.try_assign(index, item) {
            warn!("Worker {} refused chunk ({}, {})", index, item.p, item.q);
            return false;
        }
        if let Some(chunk) = world.chunks_mut().find_mut(a, b) {
            chunk.dirty = false;
        }
        debug!(
            "Scheduled chunk ({}, {}) on worker {} (score {:#x}) in {:?}",
            a,
            b,
            index,
            best_score,
            start_time.elapsed()
        );
        true
    }

    /// Blocks until no worker is busy.
    pub fn wait_for_workers(&self) {
        for index in 0..self.pool.len() {
            self.pool.wait_until_settled(index);
        }
    }

    /// Returns `true` when any worker is busy or holds an unharvested job.
    pub fn has_pending_jobs(&self) -> bool {
        (0..self.pool.len()).any(|index| self.pool.state(index) != Some(WorkerState::Idle))
    }

    /// Stops the workers. Unharvested results are dropped.
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use crate::engine_state::rendering::backend::RecordingBackend;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::block::shape::{Shape, DOOR_X};
    use crate::engine_state::voxels::block::EXTRA_BIT_OPEN;
    use crate::engine_state::voxels::generation::{EmptyGenerator, FlatGenerator};
    use crate::engine_state::voxels::store::{MemoryStore, NullStore};
    use cgmath::{Point3, Vector3};
    use std::sync::Arc;

    fn world(config: TerrainConfig) -> World {
        World::new(config, Arc::new(EmptyGenerator), Arc::new(NullStore))
    }

    fn viewpoint_at(x: f32, z: f32) -> Viewpoint {
        Viewpoint::new(Point3::new(x, 20.0, z), Vector3::unit_x(), 65.0)
    }

    #[test]
    fn force_builds_the_neighborhood() {
        let config = TerrainConfig {
            worker_count: 0,
            ..Default::default()
        };
        let mut world = world(config);
        let mut scheduler = ChunkScheduler::new(&world);
        let mut backend = RecordingBackend::new();

        let assigned = scheduler.ensure_chunks(&mut world, &[viewpoint_at(8.0, 8.0)], &mut backend);
        assert_eq!(assigned, 0);
        assert_eq!(world.chunks().len(), 9);
        assert!(world.chunks().iter().all(|chunk| !chunk.dirty && chunk.buffer.is_some()));
    }

    #[test]
    fn workers_pick_the_nearest_visible_chunk() {
        let config = TerrainConfig {
            worker_count: 1,
            create_radius: 3,
            ..Default::default()
        };
        let mut world = world(config);
        let mut scheduler = ChunkScheduler::new(&world);
        let viewpoint = viewpoint_at(8.0, 8.0);
        let frustum = Frustum::new(&viewpoint, world.config().render_radius);

        assert!(scheduler.ensure_chunks_worker(&mut world, &viewpoint, &frustum, 0));
        // (0, 0) is the closest chunk and lies inside the frustum
        let chunk = world.find_chunk(0, 0).unwrap();
        assert!(!chunk.dirty);
        scheduler.wait_for_workers();
        assert!(scheduler.has_pending_jobs());

        let mut backend = RecordingBackend::new();
        assert_eq!(scheduler.check_workers(&mut world, &mut backend), 1);
        assert!(world.find_chunk(0, 0).unwrap().buffer.is_some());
        assert!(!scheduler.has_pending_jobs());
    }

    #[test]
    fn loaded_jobs_commit_their_maps() {
        let config = TerrainConfig {
            worker_count: 1,
            create_radius: 0,
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let generator = FlatGenerator {
            height: 2,
            block: BlockType::SAND.id(),
        };
        let mut world = World::new(config, Arc::new(generator), store.clone());
        let mut scheduler = ChunkScheduler::new(&world);
        let viewpoint = viewpoint_at(40.0, 40.0);
        let frustum = Frustum::new(&viewpoint, 10);

        assert!(scheduler.ensure_chunks_worker(&mut world, &viewpoint, &frustum, 0));
        assert!(world.find_chunk(2, 2).unwrap().maps.blocks.is_empty());
        scheduler.wait_for_workers();
        let mut backend = RecordingBackend::new();
        scheduler.check_workers(&mut world, &mut backend);

        let chunk = world.find_chunk(2, 2).unwrap();
        assert_eq!(chunk.maps.blocks.get(40, 1, 40), BlockType::SAND.id());
        assert_eq!(chunk.faces, 256);
        assert_eq!(store.loaded_chunks(), vec![(2, 2)]);
    }

    #[test]
    fn clean_chunks_are_not_rescheduled() {
        let config = TerrainConfig {
            worker_count: 1,
            create_radius: 0,
            ..Default::default()
        };
        let mut world = world(config);
        let mut scheduler = ChunkScheduler::new(&world);
        let viewpoint = viewpoint_at(8.0, 8.0);
        let frustum = Frustum::new(&viewpoint, 10);
        let mut backend = RecordingBackend::new();

        assert!(scheduler.ensure_chunks_worker(&mut world, &viewpoint, &frustum, 0));
        scheduler.wait_for_workers();
        scheduler.check_workers(&mut world, &mut backend);
        assert!(!scheduler.ensure_chunks_worker(&mut world, &viewpoint, &frustum, 0));

        world.dirty_chunk(0, 0);
        assert!(scheduler.ensure_chunks_worker(&mut world, &viewpoint, &frustum, 0));
        scheduler.shutdown();
    }

    #[test]
    fn single_block_is_built_by_a_worker() {
        let config = TerrainConfig {
            worker_count: 1,
            create_radius: 0,
            ..Default::default()
        };
        let mut world = world(config);
        let mut scheduler = ChunkScheduler::new(&world);
        let viewpoint = viewpoint_at(8.0, 8.0);
        let frustum = Frustum::new(&viewpoint, 10);
        let mut backend = RecordingBackend::new();

        assert!(world.create_chunk(0, 0));
        world.set_block(0, 5, 0, BlockType::STONE.id());
        assert!(scheduler.ensure_chunks_worker(&mut world, &viewpoint, &frustum, 0));
        scheduler.wait_for_workers();
        assert_eq!(scheduler.check_workers(&mut world, &mut backend), 1);

        let chunk = world.find_chunk(0, 0).unwrap();
        assert_eq!(chunk.faces, 6);
        assert!(chunk.buffer.is_some());
        assert_eq!((chunk.miny, chunk.maxy), (5, 5));
        assert!(!chunk.dirty);
    }

    #[test]
    fn door_toggled_during_a_build_is_not_lost() {
        let config = TerrainConfig {
            worker_count: 1,
            create_radius: 0,
            ..Default::default()
        };
        let mut world = world(config);
        let mut scheduler = ChunkScheduler::new(&world);
        let viewpoint = viewpoint_at(8.0, 8.0);
        let frustum = Frustum::new(&viewpoint, 10);
        let mut backend = RecordingBackend::new();

        assert!(world.create_chunk(0, 0));
        world.set_block(3, 5, 3, BlockType::PLANK.id());
        world.set_shape(3, 5, 3, Shape::LowerDoor.id());
        world.set_transform(3, 5, 3, DOOR_X);
        world.gen_chunk_buffer(0, 0, &mut backend);

        world.set_block(10, 5, 10, BlockType::STONE.id());
        assert!(scheduler.ensure_chunks_worker(&mut world, &viewpoint, &frustum, 0));
        assert!(world.toggle_door(3, 5, 3, &mut backend));
        scheduler.wait_for_workers();
        scheduler.check_workers(&mut world, &mut backend);

        // the harvested mesh predates the toggle
        assert!(world.find_chunk(0, 0).unwrap().dirty);
        assert!(scheduler.ensure_chunks_worker(&mut world, &viewpoint, &frustum, 0));
        scheduler.wait_for_workers();
        scheduler.check_workers(&mut world, &mut backend);

        let chunk = world.find_chunk(0, 0).unwrap();
        assert!(!chunk.dirty);
        let entry = chunk.doors.get(3, 5, 3).unwrap();
        assert_eq!(entry.geometry.extra & EXTRA_BIT_OPEN, EXTRA_BIT_OPEN);
        assert_eq!(world.get_extra(3, 5, 3) & EXTRA_BIT_OPEN, EXTRA_BIT_OPEN);
    }
}
