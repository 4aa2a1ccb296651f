//! # Headless Terrain Driver
//!
//! Runs the terrain subsystem without a window: walks a viewpoint across a
//! noise-generated world, places and toggles a door, and logs what the
//! scheduler and the recording backend did.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

use std::sync::Arc;

use anyhow::Context;
use cgmath::{Deg, Point3, Vector3};
use log::info;
use voxel_terrain::config::TerrainConfig;
use voxel_terrain::engine_state::rendering::backend::RecordingBackend;
use voxel_terrain::engine_state::scheduler::Viewpoint;
use voxel_terrain::engine_state::voxels::block::block_type::BlockType;
use voxel_terrain::engine_state::voxels::block::shape::{Shape, DOOR_X};
use voxel_terrain::engine_state::voxels::generation::NoiseGenerator;
use voxel_terrain::engine_state::voxels::store::MemoryStore;
use voxel_terrain::engine_state::TerrainState;

const FRAMES: usize = 120;
const SEED: u32 = 2024;

fn main() -> anyhow::Result<()> {
    voxel_terrain::init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => TerrainConfig::load(&path)?,
        None => TerrainConfig::default(),
    };
    let fov = config.fov;
    let store = Arc::new(MemoryStore::new());
    let mut terrain = TerrainState::new(
        config,
        Arc::new(NoiseGenerator::new(SEED)),
        store.clone(),
    );
    let mut backend = RecordingBackend::new();

    for frame in 0..FRAMES {
        let x = frame as f32 * 0.5;
        let ground = terrain.world.highest_block(x, 0.0).max(0) as f32;
        let position = Point3::new(x, ground + 2.0, 0.0);
        let viewpoint = Viewpoint::from_angles(position, Deg(0.0), Deg(-10.0), fov);
        let stats = terrain.update(&[viewpoint], &mut backend);
        if frame % 30 == 0 {
            info!("Frame {}: {:?}", frame, stats);
        }
    }
    terrain.scheduler.wait_for_workers();
    let last = Viewpoint::new(Point3::new(0.0, 40.0, 0.0), Vector3::unit_z(), fov);
    terrain.update(&[last], &mut backend);

    let (x, z) = (4, 4);
    let y = terrain.world.highest_block(x as f32, z as f32) + 1;
    let plank = BlockType::PLANK.id();
    for (dy, shape) in [(0, Shape::LowerDoor), (1, Shape::UpperDoor)] {
        terrain.world.set_block(x, y + dy, z, plank);
        terrain.world.set_shape(x, y + dy, z, shape.id());
        terrain.world.set_transform(x, y + dy, z, DOOR_X);
    }
    terrain.world.gen_chunk_buffer(0, 0, &mut backend);

    backend.clear_calls();
    let toggled = terrain.world.toggle_door(x, y, z, &mut backend);
    info!(
        "Door toggle at ({}, {}, {}): {} ({} backend calls)",
        x,
        y,
        z,
        toggled,
        backend.calls().len()
    );

    let resident = terrain.world.chunks().len();
    terrain.shutdown(&mut backend);
    info!(
        "Done: {} chunks were resident, {} chunks loaded from the store, {} buffers still live",
        resident,
        store.loaded_chunks().len(),
        backend.live_buffers()
    );
    let summary = terrain
        .world
        .config()
        .to_json_string()
        .context("Summarizing configuration")?;
    info!("Configuration: {}", summary);
    Ok(())
}
