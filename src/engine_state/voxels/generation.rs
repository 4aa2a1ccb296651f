//! # World Generation
//!
//! A `WorldGenerator` fills a freshly allocated chunk with its initial
//! terrain through a voxel-set callback. Generators run inside worker threads
//! whenever a chunk is built asynchronously, so they must be `Send + Sync`
//! and safe to call concurrently.
//!
//! Generators write the chunk's own 16x16 column with positive ids and the
//! one-voxel halo around it with negated ids, the same convention the edit
//! API uses for neighbor copies.
//!
//! ## Generators
//!
//! - `FlatGenerator`: a flat slab of one block type, handy for tests
//! - `NoiseGenerator`: rolling hills with sand below the water line, grass,
//!   flowers, trees and a cloud layer, driven by fractal Perlin noise

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::block::block_type::BlockType;
use super::chunk::{CHUNK_SIZE, WORLD_HEIGHT};

/// Populates chunks with their initial terrain.
pub trait WorldGenerator: Send + Sync {
    /// Generates chunk `(p, q)`, reporting every voxel as `set(x, y, z, w)`
    /// in world coordinates.
    fn generate(&self, p: i32, q: i32, set: &mut dyn FnMut(i32, i32, i32, i32));
}

/// Visits every column of chunk `(p, q)` plus its one-voxel halo.
///
/// The callback receives the local column `(dx, dz)`, the world column
/// `(x, z)` and the sign to apply to ids: `1` inside the chunk, `-1` in the
/// halo.
fn for_each_column(p: i32, q: i32, mut visit: impl FnMut(i32, i32, i32, i32, i32)) {
    for dx in -1..CHUNK_SIZE + 1 {
        for dz in -1..CHUNK_SIZE + 1 {
            let halo = dx < 0 || dz < 0 || dx >= CHUNK_SIZE || dz >= CHUNK_SIZE;
            let flag = if halo { -1 } else { 1 };
            visit(dx, dz, p * CHUNK_SIZE + dx, q * CHUNK_SIZE + dz, flag);
        }
    }
}

/// Fills every column from `y = 0` up to (not including) `height`.
#[derive(Clone, Copy, Debug)]
pub struct FlatGenerator {
    /// Number of filled layers.
    pub height: i32,
    /// Block id used for every layer.
    pub block: i32,
}

impl Default for FlatGenerator {
    fn default() -> Self {
        FlatGenerator {
            height: 8,
            block: BlockType::STONE.id(),
        }
    }
}

impl WorldGenerator for FlatGenerator {
    fn generate(&self, p: i32, q: i32, set: &mut dyn FnMut(i32, i32, i32, i32)) {
        let height = self.height.clamp(0, WORLD_HEIGHT);
        for_each_column(p, q, |_, _, x, z, flag| {
            for y in 0..height {
                set(x, y, z, self.block * flag);
            }
        });
    }
}

/// A generator that places nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyGenerator;

impl WorldGenerator for EmptyGenerator {
    fn generate(&self, _p: i32, _q: i32, _set: &mut dyn FnMut(i32, i32, i32, i32)) {}
}

/// Builds a fractal Perlin source.
pub(crate) fn fractal(seed: u32, octaves: usize, persistence: f64) -> Fbm<Perlin> {
    Fbm::<Perlin>::new(seed)
        .set_octaves(octaves)
        .set_persistence(persistence)
        .set_lacunarity(2.0)
}

/// Samples a 2-D source and maps it into `0..=1`.
pub(crate) fn sample2(source: &Fbm<Perlin>, x: f64, z: f64) -> f64 {
    ((source.get([x, z]) + 1.0) / 2.0).clamp(0.0, 1.0)
}

fn sample3(source: &Fbm<Perlin>, x: f64, y: f64, z: f64) -> f64 {
    ((source.get([x, y, z]) + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Layer below which terrain turns to sand.
const WATER_LINE: i32 = 12;

/// Lowest cloud layer.
const CLOUD_MIN: i32 = 64;

/// One past the highest cloud layer.
const CLOUD_MAX: i32 = 72;

/// Distance trees keep from the chunk border so their canopy stays inside.
const TREE_MARGIN: i32 = 4;

/// Noise-driven terrain.
///
/// # Examples
///
/// ```
/// use voxel_terrain::engine_state::voxels::generation::{NoiseGenerator, WorldGenerator};
///
/// let generator = NoiseGenerator::new(7);
/// let mut count = 0;
/// generator.generate(0, 0, &mut |_, _, _, _| count += 1);
/// assert!(count > 0);
/// ```
pub struct NoiseGenerator {
    height: Fbm<Perlin>,
    mountains: Fbm<Perlin>,
    grass: Fbm<Perlin>,
    flowers: Fbm<Perlin>,
    flower_kind: Fbm<Perlin>,
    trees: Fbm<Perlin>,
    clouds: Fbm<Perlin>,
}

impl NoiseGenerator {
    /// Creates a generator. Equal seeds produce identical worlds.
    pub fn new(seed: u32) -> Self {
        NoiseGenerator {
            height: fractal(seed, 4, 0.5),
            mountains: fractal(seed.wrapping_add(1), 2, 0.9),
            grass: fractal(seed.wrapping_add(2), 4, 0.8),
            flowers: fractal(seed.wrapping_add(3), 4, 0.8),
            flower_kind: fractal(seed.wrapping_add(4), 4, 0.8),
            trees: fractal(seed.wrapping_add(5), 6, 0.5),
            clouds: fractal(seed.wrapping_add(6), 8, 0.5),
        }
    }

    /// Surface height and surface block of a world column.
    fn surface(&self, x: i32, z: i32) -> (i32, i32) {
        let (fx, fz) = (x as f64, z as f64);
        let f = sample2(&self.height, fx * 0.01, fz * 0.01);
        let g = sample2(&self.mountains, -fx * 0.01, -fz * 0.01);
        let max_height = (g * 32.0 + 16.0) as i32;
        let h = (f * max_height as f64) as i32;
        if h <= WATER_LINE {
            (WATER_LINE, BlockType::SAND.id())
        } else {
            (h, BlockType::GRASS.id())
        }
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        NoiseGenerator::new(0)
    }
}

impl WorldGenerator for NoiseGenerator {
    fn generate(&self, p: i32, q: i32, set: &mut dyn FnMut(i32, i32, i32, i32)) {
        for_each_column(p, q, |dx, dz, x, z, flag| {
            let (fx, fz) = (x as f64, z as f64);
            let (h, w) = self.surface(x, z);
            for y in 0..h {
                set(x, y, z, w * flag);
            }

            if w == BlockType::GRASS.id() {
                if sample2(&self.grass, -fx * 0.1, fz * 0.1) > 0.6 {
                    set(x, h, z, BlockType::TALL_GRASS.id() * flag);
                }
                if sample2(&self.flowers, fx * 0.05, -fz * 0.05) > 0.7 {
                    let kind = sample2(&self.flower_kind, fx * 0.1, fz * 0.1) * 7.0;
                    let flower = (BlockType::YELLOW_FLOWER.id() + kind as i32)
                        .min(BlockType::BLUE_FLOWER.id());
                    set(x, h, z, flower * flag);
                }

                let inside = dx - TREE_MARGIN >= 0
                    && dz - TREE_MARGIN >= 0
                    && dx + TREE_MARGIN < CHUNK_SIZE
                    && dz + TREE_MARGIN < CHUNK_SIZE;
                // offset keeps samples off the lattice points, where Perlin is zero
                if inside && sample2(&self.trees, fx + 0.5, fz + 0.5) > 0.84 {
                    for y in h + 3..h + 8 {
                        for ox in -3..=3 {
                            for oz in -3..=3 {
                                let oy = y - (h + 4);
                                if ox * ox + oz * oz + oy * oy < 11 {
                                    set(x + ox, y, z + oz, BlockType::LEAVES.id());
                                }
                            }
                        }
                    }
                    for y in h..h + 7 {
                        set(x, y, z, BlockType::WOOD.id());
                    }
                }
            }

            for y in CLOUD_MIN..CLOUD_MAX {
                if sample3(&self.clouds, fx * 0.01, y as f64 * 0.1, fz * 0.01) > 0.75 {
                    set(x, y, z, BlockType::CLOUD.id() * flag);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn collect(generator: &dyn WorldGenerator, p: i32, q: i32) -> HashMap<(i32, i32, i32), i32> {
        let mut voxels = HashMap::new();
        generator.generate(p, q, &mut |x, y, z, w| {
            voxels.insert((x, y, z), w);
        });
        voxels
    }

    #[test]
    fn flat_generator_fills_halo_with_negated_ids() {
        let voxels = collect(&FlatGenerator { height: 2, block: 3 }, 1, -1);
        assert_eq!(voxels.len(), 18 * 18 * 2);
        assert_eq!(voxels[&(16, 0, -16)], 3);
        assert_eq!(voxels[&(31, 1, -1)], 3);
        assert_eq!(voxels[&(15, 0, -16)], -3);
        assert_eq!(voxels[&(32, 1, -10)], -3);
        assert_eq!(voxels[&(20, 0, -17)], -3);
    }

    #[test]
    fn noise_generator_is_deterministic() {
        let a = collect(&NoiseGenerator::new(3), 2, 5);
        let b = collect(&NoiseGenerator::new(3), 2, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn noise_terrain_has_a_floor_in_every_column() {
        let voxels = collect(&NoiseGenerator::new(11), 0, 0);
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let w = voxels.get(&(x, 0, z)).copied().unwrap_or(0);
                assert!(w == BlockType::GRASS.id() || w == BlockType::SAND.id());
            }
        }
    }

    #[test]
    fn empty_generator_places_nothing() {
        assert!(collect(&EmptyGenerator, 0, 0).is_empty());
    }
}
