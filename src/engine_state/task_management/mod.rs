//! # Task Management System
//!
//! This module provides the pool of long-lived background threads that build
//! chunk meshes off the main thread.
//!
//! ## Architecture Overview
//!
//! - `WorkerPool`: owns the workers and is the scheduler's only handle on them
//! - `WorkerItem` (in `task`): one self-contained job
//! - Each worker holds at most one job, guarded by its own mutex and
//!   condition variable
//!
//! ## Worker Lifecycle
//!
//! ```text
//! Idle --try_assign--> Busy --worker finishes--> Done --take_finished--> Idle
//! ```
//!
//! A worker blocks on its condition variable whenever it is not `Busy`. The
//! job is moved out of the shared slot while it is processed, so meshing
//! runs without holding the lock. Shutdown sets `exit_requested` on every
//! worker; a `Busy` job still runs to completion, a `Done` result that was
//! never harvested is dropped.
//!
//! ## Partitioning
//!
//! `worker_for` statically assigns every chunk coordinate to one worker, so
//! two workers can never build the same chunk at the same time.

pub mod task;

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use task::WorkerItem;

use crate::engine_state::rendering::meshing::MeshBuilder;
use crate::engine_state::voxels::generation::WorldGenerator;
use crate::engine_state::voxels::store::VoxelStore;

/// Where a worker is in its job cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a job.
    Idle,
    /// Processing a job.
    Busy,
    /// Holding a finished job until the scheduler harvests it.
    Done,
}

#[derive(Debug)]
struct WorkerSlot {
    state: WorkerState,
    item: Option<WorkerItem>,
    exit_requested: bool,
}

#[derive(Debug)]
struct WorkerShared {
    slot: Mutex<WorkerSlot>,
    signal: Condvar,
}

impl WorkerShared {
    fn lock(&self) -> MutexGuard<'_, WorkerSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, WorkerSlot>) -> MutexGuard<'a, WorkerSlot> {
        self.signal
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct Worker {
    shared: Arc<WorkerShared>,
    handle: Option<JoinHandle<()>>,
}

/// Everything a worker thread needs besides its slot.
#[derive(Clone)]
struct WorkerContext {
    builder: MeshBuilder,
    generator: Arc<dyn WorldGenerator>,
    store: Arc<dyn VoxelStore>,
}

/// The worker responsible for chunk `(p, q)` among `count` workers.
///
/// # Returns
/// `None` when there are no workers.
pub fn worker_for(p: i32, q: i32, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some((p.unsigned_abs() ^ q.unsigned_abs()) as usize % count)
}

/// A fixed pool of mesh-building threads.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Spawns `count` workers.
    ///
    /// A worker whose thread cannot be spawned is left out of the pool with
    /// a warning; the pool may therefore hold fewer workers than requested.
    ///
    /// # Arguments
    /// * `count` - Number of threads to start
    /// * `builder` - Mesh builder cloned into every worker
    /// * `generator` - Terrain generator for jobs that load their chunk
    /// * `store` - Store for jobs that load their chunk
    pub fn new(
        count: usize,
        builder: MeshBuilder,
        generator: Arc<dyn WorldGenerator>,
        store: Arc<dyn VoxelStore>,
    ) -> Self {
        let context = WorkerContext {
            builder,
            generator,
            store,
        };
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let shared = Arc::new(WorkerShared {
                slot: Mutex::new(WorkerSlot {
                    state: WorkerState::Idle,
                    item: None,
                    exit_requested: false,
                }),
                signal: Condvar::new(),
            });
            let thread_shared = Arc::clone(&shared);
            let thread_context = context.clone();
            let spawned = thread::Builder::new()
                .name(format!("terrain-worker-{}", index))
                .spawn(move || run_worker(index, &thread_shared, &thread_context));
            match spawned {
                Ok(handle) => workers.push(Worker {
                    shared,
                    handle: Some(handle),
                }),
                Err(error) => warn!("Failed to spawn terrain worker {}: {}", index, error),
            }
        }
        info!(
            "Started {} terrain workers (available parallelism: {:?})",
            workers.len(),
            thread::available_parallelism()
        );
        WorkerPool { workers }
    }

    /// Number of workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Returns `true` when the pool has no workers.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Current state of worker `index`.
    pub fn state(&self, index: usize) -> Option<WorkerState> {
        self.workers
            .get(index)
            .map(|worker| worker.shared.lock().state)
    }

    /// Returns `true` when worker `index` can take a job.
    pub fn is_idle(&self, index: usize) -> bool {
        self.state(index) == Some(WorkerState::Idle)
    }

    /// Hands a job to worker `index` if it is idle.
    ///
    /// # Returns
    /// The item back when the worker is missing or not idle.
    pub fn try_assign(&self, index: usize, item: WorkerItem) -> Result<(), WorkerItem> {
        let Some(worker) = self.workers.get(index) else {
            return Err(item);
        };
        let mut slot = worker.shared.lock();
        if slot.state != WorkerState::Idle || slot.exit_requested {
            return Err(item);
        }
        debug!("Assigning chunk ({}, {}) to worker {}", item.p, item.q, index);
        slot.item = Some(item);
        slot.state = WorkerState::Busy;
        worker.shared.signal.notify_all();
        Ok(())
    }

    /// Takes the finished job of worker `index`, returning it to idle.
    pub fn take_finished(&self, index: usize) -> Option<WorkerItem> {
        let worker = self.workers.get(index)?;
        let mut slot = worker.shared.lock();
        if slot.state != WorkerState::Done {
            return None;
        }
        slot.state = WorkerState::Idle;
        slot.item.take()
    }

    /// Blocks until worker `index` is no longer busy.
    pub fn wait_until_settled(&self, index: usize) -> Option<WorkerState> {
        let worker = self.workers.get(index)?;
        let mut slot = worker.shared.lock();
        while slot.state == WorkerState::Busy {
            slot = worker.shared.wait(slot);
        }
        Some(slot.state)
    }

    /// Stops every worker and joins its thread.
    ///
    /// In-flight jobs finish first. Unharvested results are dropped.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        for worker in &self.workers {
            worker.shared.lock().exit_requested = true;
            worker.shared.signal.notify_all();
        }
        for (index, worker) in self.workers.iter_mut().enumerate() {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    warn!("Terrain worker {} panicked", index);
                }
            }
        }
        info!("Stopped {} terrain workers", self.workers.len());
        self.workers.clear();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(index: usize, shared: &WorkerShared, context: &WorkerContext) {
    debug!("Terrain worker {} running", index);
    loop {
        let mut item = {
            let mut slot = shared.lock();
            while slot.state != WorkerState::Busy && !slot.exit_requested {
                slot = shared.wait(slot);
            }
            if slot.state != WorkerState::Busy {
                break;
            }
            match slot.item.take() {
                Some(item) => item,
                None => {
                    slot.state = WorkerState::Idle;
                    continue;
                }
            }
        };

        item.process(&context.builder, &*context.generator, &*context.store);

        let mut slot = shared.lock();
        slot.item = Some(item);
        slot.state = WorkerState::Done;
        shared.signal.notify_all();
    }
    debug!("Terrain worker {} exiting", index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::chunk::ChunkMaps;
    use crate::engine_state::voxels::generation::EmptyGenerator;
    use crate::engine_state::voxels::store::NullStore;
    use std::collections::HashSet;

    fn pool(count: usize) -> WorkerPool {
        WorkerPool::new(
            count,
            MeshBuilder::new(true),
            Arc::new(EmptyGenerator),
            Arc::new(NullStore),
        )
    }

    fn job(p: i32, q: i32) -> WorkerItem {
        let mut maps = ChunkMaps::new(p, q);
        maps.blocks.set(p * 16 + 3, 5, q * 16 + 3, BlockType::STONE.id());
        let mut grid: [[Option<ChunkMaps>; 3]; 3] = Default::default();
        grid[1][1] = Some(maps);
        WorkerItem::new(p, q, false, grid)
    }

    #[test]
    fn partition_is_stable_and_in_range() {
        assert_eq!(worker_for(0, 0, 4), Some(0));
        assert_eq!(worker_for(3, 1, 4), Some(2));
        assert_eq!(worker_for(-3, 1, 4), worker_for(3, -1, 4));
        assert_eq!(worker_for(5, 5, 0), None);
        for p in -8..8 {
            for q in -8..8 {
                assert!(worker_for(p, q, 3).unwrap() < 3);
            }
        }
    }

    #[test]
    fn one_pass_never_doubles_up_a_chunk() {
        let pool = pool(3);
        let mut assigned = 0;
        for p in -2..=2 {
            for q in -2..=2 {
                let index = worker_for(p, q, pool.len()).unwrap();
                if pool.try_assign(index, job(p, q)).is_ok() {
                    assigned += 1;
                }
            }
        }
        assert_eq!(assigned, 3);

        let mut held = HashSet::new();
        for index in 0..pool.len() {
            assert_eq!(pool.wait_until_settled(index), Some(WorkerState::Done));
            let item = pool.take_finished(index).unwrap();
            assert_eq!(worker_for(item.p, item.q, pool.len()), Some(index));
            assert!(held.insert((item.p, item.q)));
        }
        assert_eq!(held.len(), 3);
    }

    #[test]
    fn job_cycles_through_states() {
        let pool = pool(1);
        assert!(pool.is_idle(0));
        assert!(pool.try_assign(0, job(0, 0)).is_ok());

        assert_eq!(pool.wait_until_settled(0), Some(WorkerState::Done));
        let item = pool.take_finished(0).unwrap();
        assert_eq!(item.output.unwrap().faces, 6);
        assert!(pool.is_idle(0));
        assert!(pool.take_finished(0).is_none());
    }

    #[test]
    fn busy_or_done_workers_reject_jobs() {
        let pool = pool(1);
        assert!(pool.try_assign(0, job(0, 0)).is_ok());
        let rejected = pool.try_assign(0, job(1, 0)).unwrap_err();
        assert_eq!((rejected.p, rejected.q), (1, 0));
        pool.wait_until_settled(0);
        assert!(pool.try_assign(0, job(1, 0)).is_err());
        assert!(pool.try_assign(7, job(1, 0)).is_err());
    }

    #[test]
    fn shutdown_joins_all_workers() {
        let mut pool = pool(3);
        assert_eq!(pool.len(), 3);
        assert!(pool.try_assign(1, job(1, 0)).is_ok());
        pool.shutdown();
        assert!(pool.is_empty());
        assert_eq!(pool.state(0), None);
    }
}
