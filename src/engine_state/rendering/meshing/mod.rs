//! # Meshing Module
//!
//! This module turns the voxel maps of a chunk and its eight neighbors into
//! a flat vertex list ready for upload.
//!
//! ## Architecture
//!
//! A build runs in four passes over a padded grid (`grid::Grid`) covering
//! the 3x3 chunk neighborhood:
//!
//! 1. **Opacity**: every block of every available neighbor is rasterized;
//!    transparent blocks and any voxel with a non-cube shape stay open.
//! 2. **Light**: when lighting is enabled, each light source floods the
//!    grid (`light::light_fill`).
//! 3. **Counting**: each center-chunk voxel gets its face visibility from
//!    its six axis neighbors. Fully enclosed voxels are skipped, plants
//!    excepted, then the voxel's shape adjusts the flags and face total.
//! 4. **Emission**: per-corner occlusion and light are computed from the
//!    3x3x3 neighborhood and the shape generator appends its vertices to a
//!    buffer sized exactly by the counting pass.
//!
//! Doors and gates are additionally recorded in a fresh `DoorIndex` with
//! everything needed to rebuild them in place later (`rebuild_openable`).
//!
//! ## Threading
//!
//! `MeshBuilder` holds no per-build state and is cheap to clone, so each
//! worker thread owns its own copy. `build` only reads the maps it is given.

use cgmath::Point3;
use log::{debug, warn};
use noise::{Fbm, Perlin};
use web_time::Instant;

use crate::engine_state::rendering::vertex::{
    Vertex, FLOATS_PER_FACE, FLOATS_PER_VERTEX, VERTICES_PER_FACE,
};
use crate::engine_state::voxels::block::block_side::{BlockSide, FaceVisibility};
use crate::engine_state::voxels::block::shape::Shape;
use crate::engine_state::voxels::block::{is_plant, is_transparent};
use crate::engine_state::voxels::chunk::{chunk_origin, ChunkMaps, WORLD_HEIGHT};
use crate::engine_state::voxels::door_index::{DoorEntry, DoorGeometry, DoorIndex};
use crate::engine_state::voxels::generation::{fractal, sample2};
use crate::engine_state::voxels::map::ATTRIBUTE_MAP_MASK;

use cube::{make_cube, make_plant, make_slab, FaceInput};
use door::make_door;
use fence::{fence_face_count, make_fence};
use grid::Grid;
use light::light_fill;
use occlusion::occlusion;

mod cube;
mod door;
mod fence;
mod grid;
mod light;
mod occlusion;

/// Borrowed maps of a chunk and its eight neighbors, indexed `[dp + 1][dq + 1]`.
///
/// The center entry `[1][1]` is the chunk being built. Missing neighbors are
/// `None` and contribute nothing.
pub type NeighborMaps<'a> = [[Option<&'a ChunkMaps>; 3]; 3];

/// Half the size of a block in world units.
const HALF_BLOCK: f32 = 0.5;

/// Seed of the noise that rotates plants.
const PLANT_SEED: u32 = 0;

/// The result of a mesh build.
#[derive(Clone, Debug)]
pub struct MeshOutput {
    /// Interleaved vertices, six per face.
    pub vertices: Vec<Vertex>,
    /// Number of faces in `vertices`.
    pub faces: usize,
    /// Lowest layer holding a visible voxel, `WORLD_HEIGHT` when empty.
    pub miny: i32,
    /// Highest layer holding a visible voxel, `0` when empty.
    pub maxy: i32,
    /// Doors and gates emitted by this build.
    pub doors: DoorIndex,
}

/// Geometry a voxel is emitted with.
#[derive(Copy, Clone, Debug, PartialEq)]
enum VoxelGeometry {
    Cube,
    Slab(u8),
    Door(Shape),
    Fence(Shape),
    Plant,
}

impl VoxelGeometry {
    fn classify(w: i32, shape: i32) -> Self {
        if is_plant(w) {
            return VoxelGeometry::Plant;
        }
        match Shape::from_id(shape) {
            Some(Shape::Slab(height)) => VoxelGeometry::Slab(height),
            Some(shape) if shape.is_door() => VoxelGeometry::Door(shape),
            Some(shape) if shape.is_fence() => VoxelGeometry::Fence(shape),
            _ => VoxelGeometry::Cube,
        }
    }

    /// Adjusts face visibility for the shape and returns the face total.
    fn adjust(self, faces: &mut FaceVisibility) -> usize {
        match self {
            VoxelGeometry::Cube => BlockSide::count_visible(faces),
            VoxelGeometry::Plant => 4,
            VoxelGeometry::Slab(_) => {
                faces[BlockSide::TOP as usize] = true;
                BlockSide::count_visible(faces)
            }
            VoxelGeometry::Door(_) => {
                for side in [BlockSide::LEFT, BlockSide::RIGHT, BlockSide::FRONT, BlockSide::BACK] {
                    faces[side as usize] = true;
                }
                BlockSide::count_visible(faces)
            }
            VoxelGeometry::Fence(shape) => {
                *faces = [true; 6];
                fence_face_count(shape)
            }
        }
    }
}

/// A center-chunk voxel that survived the counting pass.
struct PendingVoxel {
    position: Point3<i32>,
    cell: Point3<i32>,
    w: i32,
    geometry: VoxelGeometry,
    faces: FaceVisibility,
    total: usize,
}

/// Builds chunk meshes.
#[derive(Clone)]
pub struct MeshBuilder {
    show_lights: bool,
    plant_noise: Fbm<Perlin>,
}

impl MeshBuilder {
    /// Creates a builder.
    ///
    /// # Arguments
    /// * `show_lights` - Whether light sources are propagated into vertex light
    pub fn new(show_lights: bool) -> Self {
        MeshBuilder {
            show_lights,
            plant_noise: fractal(PLANT_SEED, 4, 0.5),
        }
    }

    /// Returns `true` when builds propagate light.
    pub fn show_lights(&self) -> bool {
        self.show_lights
    }

    /// Builds the mesh of chunk `(p, q)`.
    ///
    /// # Arguments
    /// * `p`, `q` - Chunk coordinates of the center chunk
    /// * `neighbors` - Maps of the chunk and its neighbors
    ///
    /// # Returns
    /// The vertices, bounds and door index of the chunk. A missing center
    /// chunk yields an empty mesh.
    pub fn build(&self, p: i32, q: i32, neighbors: &NeighborMaps<'_>) -> MeshOutput {
        let start = Instant::now();
        let mut output = MeshOutput {
            vertices: Vec::new(),
            faces: 0,
            miny: WORLD_HEIGHT,
            maxy: 0,
            doors: DoorIndex::new(chunk_origin(p, q), ATTRIBUTE_MAP_MASK),
        };
        let Some(center) = neighbors[1][1] else {
            warn!("Mesh build of chunk ({}, {}) without its maps", p, q);
            return output;
        };

        let mut grid = Grid::new(p, q);
        self.fill_grid(&mut grid, neighbors);

        let voxels = self.count_faces(&grid, center, &mut output);
        output.vertices = Vec::with_capacity(output.faces * VERTICES_PER_FACE);
        for voxel in &voxels {
            self.emit_voxel(&grid, center, voxel, &mut output);
        }

        debug!(
            "Built chunk ({}, {}): {} faces from {} voxels in {:?}",
            p,
            q,
            output.faces,
            voxels.len(),
            start.elapsed()
        );
        output
    }

    /// Rasterizes opacity and, when enabled, light into the grid.
    fn fill_grid(&self, grid: &mut Grid, neighbors: &NeighborMaps<'_>) {
        let available = || neighbors.iter().flatten().flatten();
        for maps in available() {
            for (x, y, z, w) in maps.blocks.iter() {
                let Some(cell) = grid.local(x, y, z) else {
                    continue;
                };
                let opaque = !is_transparent(w) && maps.shapes.get(x, y, z) == 0;
                grid.set_opaque(cell.x, cell.y, cell.z, opaque);
            }
        }

        if !self.show_lights || available().all(|maps| maps.lights.is_empty()) {
            return;
        }
        for maps in available() {
            for (x, y, z, w) in maps.lights.iter() {
                if w <= 0 {
                    continue;
                }
                if let Some(cell) = grid.local(x, y, z) {
                    light_fill(grid, cell.x, cell.y, cell.z, w);
                }
            }
        }
    }

    /// Computes face visibility of every center voxel and totals the faces.
    fn count_faces(
        &self,
        grid: &Grid,
        center: &ChunkMaps,
        output: &mut MeshOutput,
    ) -> Vec<PendingVoxel> {
        let mut voxels = Vec::new();
        for (x, y, z, w) in center.blocks.iter() {
            if w <= 0 {
                continue;
            }
            let Some(cell) = grid.local(x, y, z) else {
                warn!("Voxel ({}, {}, {}) lies outside the mesh grid", x, y, z);
                continue;
            };
            let (cx, cy, cz) = (cell.x, cell.y, cell.z);
            let mut faces = [
                !grid.is_opaque(cx - 1, cy, cz),
                !grid.is_opaque(cx + 1, cy, cz),
                !grid.is_opaque(cx, cy + 1, cz),
                !grid.is_opaque(cx, cy - 1, cz) && y > 0,
                !grid.is_opaque(cx, cy, cz - 1),
                !grid.is_opaque(cx, cy, cz + 1),
            ];
            if BlockSide::count_visible(&faces) == 0 && !is_plant(w) {
                continue;
            }
            let geometry = VoxelGeometry::classify(w, center.shapes.get(x, y, z));
            let total = geometry.adjust(&mut faces);
            output.miny = output.miny.min(y);
            output.maxy = output.maxy.max(y);
            output.faces += total;
            voxels.push(PendingVoxel {
                position: Point3::new(x, y, z),
                cell,
                w,
                geometry,
                faces,
                total,
            });
        }
        voxels
    }

    /// Appends one voxel's vertices, recording doors and gates.
    fn emit_voxel(
        &self,
        grid: &Grid,
        center: &ChunkMaps,
        voxel: &PendingVoxel,
        output: &mut MeshOutput,
    ) {
        let samples = grid.neighborhood(voxel.cell.x, voxel.cell.y, voxel.cell.z);
        let (ao, light) = occlusion(&samples);
        let Point3 { x, y, z } = voxel.position;
        let input = FaceInput {
            ao: &ao,
            light: &light,
            faces: &voxel.faces,
            center: [x as f32, y as f32, z as f32],
            n: HALF_BLOCK,
        };
        let offset = output.vertices.len() * FLOATS_PER_VERTEX;
        let out = &mut output.vertices;

        match voxel.geometry {
            VoxelGeometry::Cube => make_cube(out, &input, voxel.w),
            VoxelGeometry::Slab(height) => make_slab(out, &input, voxel.w, height),
            VoxelGeometry::Plant => {
                let min_ao = ao.iter().flatten().copied().fold(1.0, f32::min);
                let max_light = light.iter().flatten().copied().fold(0.0, f32::max);
                let rotation =
                    sample2(&self.plant_noise, f64::from(x) + 0.5, f64::from(z) + 0.5) * 360.0;
                make_plant(
                    out,
                    input.center,
                    HALF_BLOCK,
                    voxel.w,
                    min_ao,
                    max_light,
                    rotation as f32,
                );
            }
            VoxelGeometry::Door(shape) | VoxelGeometry::Fence(shape) => {
                let extra = center.extras.get(x, y, z);
                let transform = center.transforms.get(x, y, z);
                if shape.is_door() {
                    make_door(out, &input, voxel.w, shape, extra, transform);
                } else {
                    make_fence(out, &input, voxel.w, shape, extra, transform);
                }
                if shape.is_openable() {
                    let geometry = DoorGeometry {
                        offset,
                        face_count: voxel.total,
                        ao,
                        light,
                        faces: voxel.faces,
                        n: HALF_BLOCK,
                        shape,
                        extra,
                        transform,
                    };
                    output.doors.set(x, y, z, voxel.w, geometry);
                }
            }
        }
        debug_assert_eq!(
            output.vertices.len() * FLOATS_PER_VERTEX,
            offset + voxel.total * FLOATS_PER_FACE
        );
    }
}

/// Regenerates the vertices of a door or gate from its cached entry.
///
/// The result has exactly `entry.geometry.face_count` faces, so it can
/// overwrite the block's range of the chunk buffer in place.
pub fn rebuild_openable(entry: &DoorEntry) -> Vec<Vertex> {
    let geometry = &entry.geometry;
    let Point3 { x, y, z } = entry.position;
    let input = FaceInput {
        ao: &geometry.ao,
        light: &geometry.light,
        faces: &geometry.faces,
        center: [x as f32, y as f32, z as f32],
        n: geometry.n,
    };
    let mut out = Vec::with_capacity(geometry.face_count * VERTICES_PER_FACE);
    if geometry.shape.is_door() {
        make_door(
            &mut out,
            &input,
            entry.w,
            geometry.shape,
            geometry.extra,
            geometry.transform,
        );
    } else if geometry.shape.is_fence() {
        make_fence(
            &mut out,
            &input,
            entry.w,
            geometry.shape,
            geometry.extra,
            geometry.transform,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::block::EXTRA_BIT_OPEN;

    fn build(maps: &ChunkMaps, show_lights: bool) -> MeshOutput {
        let mut neighbors: NeighborMaps<'_> = [[None; 3]; 3];
        neighbors[1][1] = Some(maps);
        MeshBuilder::new(show_lights).build(0, 0, &neighbors)
    }

    fn stone() -> i32 {
        BlockType::STONE.id()
    }

    #[test]
    fn lone_block_emits_six_faces() {
        let mut maps = ChunkMaps::new(0, 0);
        maps.blocks.set(4, 5, 4, stone());
        let output = build(&maps, false);
        assert_eq!(output.faces, 6);
        assert_eq!(output.vertices.len(), 36);
        assert_eq!((output.miny, output.maxy), (5, 5));
    }

    #[test]
    fn bottom_face_at_floor_is_hidden() {
        let mut maps = ChunkMaps::new(0, 0);
        maps.blocks.set(4, 0, 4, stone());
        assert_eq!(build(&maps, false).faces, 5);
    }

    #[test]
    fn enclosed_voxels_emit_nothing() {
        let mut maps = ChunkMaps::new(0, 0);
        for x in 4..7 {
            for y in 5..8 {
                for z in 4..7 {
                    maps.blocks.set(x, y, z, stone());
                }
            }
        }
        let output = build(&maps, false);
        assert_eq!(output.faces, 54);
        assert_eq!(output.vertices.len(), 54 * VERTICES_PER_FACE);
    }

    #[test]
    fn halo_blocks_hide_border_faces() {
        let mut maps = ChunkMaps::new(0, 0);
        maps.blocks.set(0, 5, 0, stone());
        maps.blocks.set(-1, 5, 0, -stone());
        let output = build(&maps, false);
        assert_eq!(output.faces, 5);
    }

    #[test]
    fn empty_center_yields_empty_mesh() {
        let neighbors: NeighborMaps<'_> = [[None; 3]; 3];
        let output = MeshBuilder::new(true).build(3, 3, &neighbors);
        assert_eq!(output.faces, 0);
        assert!(output.vertices.is_empty());
        assert_eq!((output.miny, output.maxy), (WORLD_HEIGHT, 0));
    }

    #[test]
    fn plants_emit_four_faces() {
        let mut maps = ChunkMaps::new(0, 0);
        maps.blocks.set(4, 5, 4, BlockType::TALL_GRASS.id());
        let output = build(&maps, false);
        assert_eq!(output.faces, 4);
        assert_eq!(output.vertices.len(), 24);
    }

    #[test]
    fn enclosed_plants_still_emit_four_faces() {
        let mut maps = ChunkMaps::new(0, 0);
        for side in BlockSide::all() {
            let [dx, dy, dz] = side.offset();
            maps.blocks.set(4 + dx, 5 + dy, 4 + dz, stone());
        }
        let walls = build(&maps, false).faces;
        assert_eq!(walls, 36);

        maps.blocks.set(4, 5, 4, BlockType::TALL_GRASS.id());
        let output = build(&maps, false);
        assert_eq!(output.faces, walls + 4);
        assert_eq!(output.vertices.len(), (walls + 4) * VERTICES_PER_FACE);
    }

    #[test]
    fn shaped_neighbors_do_not_occlude() {
        let mut maps = ChunkMaps::new(0, 0);
        maps.blocks.set(4, 5, 4, stone());
        maps.blocks.set(5, 5, 4, stone());
        maps.shapes.set(5, 5, 4, Shape::Slab(8).id());
        let output = build(&maps, false);
        // the cube keeps all six faces, the slab loses its -x face
        assert_eq!(output.faces, 6 + 5);
    }

    #[test]
    fn lights_reach_nearby_faces() {
        let mut maps = ChunkMaps::new(0, 0);
        maps.blocks.set(4, 5, 4, stone());
        maps.lights.set(6, 5, 4, 15);

        let lit = build(&maps, true);
        assert!(lit.vertices.iter().any(|v| v.light > 0.0));

        let unlit = build(&maps, false);
        assert!(unlit.vertices.iter().all(|v| v.light == 0.0));
    }

    #[test]
    fn doors_are_indexed_and_rebuild_in_place() {
        let mut maps = ChunkMaps::new(0, 0);
        maps.blocks.set(2, 5, 2, stone());
        maps.blocks.set(4, 5, 4, BlockType::PLANK.id());
        maps.shapes.set(4, 5, 4, Shape::LowerDoor.id());

        let output = build(&maps, false);
        assert_eq!(output.doors.len(), 1);
        let entry = output.doors.get(4, 5, 4).unwrap();
        assert_eq!(entry.geometry.face_count, 6);

        let start = entry.geometry.offset / FLOATS_PER_VERTEX;
        let end = start + entry.geometry.face_count * VERTICES_PER_FACE;
        assert_eq!(rebuild_openable(entry), output.vertices[start..end].to_vec());

        let mut opened = entry.clone();
        opened.geometry.extra ^= EXTRA_BIT_OPEN;
        let rebuilt = rebuild_openable(&opened);
        assert_eq!(rebuilt.len(), end - start);
        assert_ne!(rebuilt, output.vertices[start..end].to_vec());
    }

    #[test]
    fn gates_emit_all_parts() {
        let mut maps = ChunkMaps::new(0, 0);
        maps.blocks.set(4, 5, 4, BlockType::PLANK.id());
        maps.shapes.set(4, 5, 4, Shape::Gate.id());
        let output = build(&maps, false);
        assert_eq!(output.faces, 60);
        assert_eq!(output.doors.len(), 1);

        maps.shapes.set(4, 5, 4, Shape::FenceX.id());
        let output = build(&maps, false);
        assert_eq!(output.faces, 78);
        assert!(output.doors.is_empty());
    }
}
