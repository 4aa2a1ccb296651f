#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! The terrain subsystem of a voxel sandbox: sparse chunked voxel storage,
//! threaded neighbor-aware mesh building and per-frame build scheduling.
//!
//! ## Key Modules
//!
//! * `config` - Runtime settings loaded from JSON
//! * `engine_state` - The terrain engine: voxels, meshing, workers and the
//!   scheduler
//!
//! ## Architecture
//!
//! The crate decides *what* geometry exists and *when* it is rebuilt. Three
//! seams connect it to a host:
//! * `WorldGenerator` produces initial terrain, possibly on worker threads
//! * `VoxelStore` persists edits and loads them back
//! * `GraphicsBackend` receives vertex buffers on the main thread
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use voxel_terrain::config::TerrainConfig;
//! use voxel_terrain::engine_state::TerrainState;
//! use voxel_terrain::engine_state::rendering::backend::RecordingBackend;
//! use voxel_terrain::engine_state::voxels::generation::NoiseGenerator;
//! use voxel_terrain::engine_state::voxels::store::MemoryStore;
//!
//! voxel_terrain::init_logging();
//! let mut terrain = TerrainState::new(
//!     TerrainConfig::default(),
//!     Arc::new(NoiseGenerator::new(1)),
//!     Arc::new(MemoryStore::new()),
//! );
//! let mut backend = RecordingBackend::new();
//! // once per frame:
//! // terrain.update(&viewpoints, &mut backend);
//! terrain.shutdown(&mut backend);
//! ```

use log::info;

pub mod config;
pub mod engine_state;

/// Installs an `env_logger` logger reading `RUST_LOG`, writing to stdout.
///
/// Does nothing when a logger is already installed.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let installed = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
    if installed.is_ok() {
        info!("Logger initialized");
    }
}
