//! Vertex data structures for voxel geometry.
//!
//! This module defines the vertex format produced by the mesh builder and
//! consumed by the graphics backend.

/// A vertex of chunk geometry.
///
/// Represents a single corner of a face with its normal, atlas coordinates
/// and the ambient occlusion and light values interpolated across the face.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Normal: 3x f32 (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Ambient Occlusion: f32 (4 bytes)
/// - Light: f32 (4 bytes)
///
/// Total size: 40 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in world space
    pub position: [f32; 3],
    /// Face normal
    pub normal: [f32; 3],
    /// Texture atlas coordinates (normalized 0.0-1.0)
    pub uv: [f32; 2],
    /// Ambient occlusion factor, 0.0 (unoccluded) to 1.0
    pub ao: f32,
    /// Light intensity, 0.0 to 1.0
    pub light: f32,
}

/// Number of `f32` values in one vertex.
pub const FLOATS_PER_VERTEX: usize = 10;

/// Number of vertices in one face (two triangles).
pub const VERTICES_PER_FACE: usize = 6;

/// Number of `f32` values in one face.
pub const FLOATS_PER_FACE: usize = FLOATS_PER_VERTEX * VERTICES_PER_FACE;

/// Number of bytes in one face.
pub const BYTES_PER_FACE: usize = FLOATS_PER_FACE * std::mem::size_of::<f32>();

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - World space position
    /// * `normal` - Face normal
    /// * `uv` - Texture atlas coordinates
    /// * `ao` - Ambient occlusion factor
    /// * `light` - Light intensity
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], ao: f32, light: f32) -> Self {
        Vertex {
            position,
            normal,
            uv,
            ao,
            light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_float_count() {
        assert_eq!(std::mem::size_of::<Vertex>(), FLOATS_PER_VERTEX * 4);
        assert_eq!(BYTES_PER_FACE, 240);
    }

    #[test]
    fn casts_to_flat_floats() {
        let vertex = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.25, 0.5], 0.75, 1.0);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&vertex));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
