//! # Frustum Culling
//!
//! This module turns a `Viewpoint` into clip planes and tests chunk bounding
//! boxes against them. The scheduler uses it to push chunks outside the view
//! to the back of the build queue.
//!
//! ## Architecture
//!
//! - `Viewpoint`: what the caller knows about a camera each frame (position,
//!   view direction, vertical field of view and projection mode)
//! - `Frustum`: the planes extracted from the combined projection and view
//!   matrix, six for perspective and the four side planes for orthographic
//!   projections
//!
//! Planes are extracted from the rows of the clip matrix, so a point is
//! inside a plane when `a*x + b*y + c*z + d >= 0`.

use cgmath::{Deg, InnerSpace, Matrix, Matrix4, Point3, Rad, Vector3, Vector4};

use crate::engine_state::voxels::chunk::{chunked, CHUNK_SIZE};

/// Distance to the near clip plane.
const Z_NEAR: f32 = 0.125;

/// A camera the world is rendered or observed from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewpoint {
    /// The camera's position in world space
    pub position: Point3<f32>,
    /// Direction the camera looks in; need not be normalized
    pub direction: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Viewport width divided by height
    pub aspect: f32,
    /// Half height of the view volume when orthographic
    pub ortho: Option<f32>,
}

impl Viewpoint {
    /// Creates a perspective viewpoint with a square aspect ratio.
    ///
    /// # Arguments
    /// * `position` - World space camera position
    /// * `direction` - View direction
    /// * `fov` - Vertical field of view in degrees
    pub fn new(position: Point3<f32>, direction: Vector3<f32>, fov: f32) -> Self {
        Viewpoint {
            position,
            direction,
            fov,
            aspect: 1.0,
            ortho: None,
        }
    }

    /// Creates a perspective viewpoint from yaw and pitch angles.
    ///
    /// Yaw rotates around the Y axis starting from +X, pitch tilts up from
    /// the horizon.
    pub fn from_angles<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: Point3<f32>,
        yaw: Y,
        pitch: P,
        fov: f32,
    ) -> Self {
        let (yaw_sin, yaw_cos) = yaw.into().0.sin_cos();
        let (pitch_sin, pitch_cos) = pitch.into().0.sin_cos();
        let direction = Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin);
        Viewpoint::new(position, direction, fov)
    }

    /// The chunk coordinate containing the camera.
    pub fn chunk(&self) -> (i32, i32) {
        (chunked(self.position.x), chunked(self.position.z))
    }

    /// The world-to-view matrix.
    ///
    /// A zero-length direction looks down -Z.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let direction = if self.direction.magnitude2() > f32::EPSILON {
            self.direction.normalize()
        } else {
            -Vector3::unit_z()
        };
        // looking straight up or down leaves unit_y parallel to the direction
        let up = if direction.y.abs() > 0.999 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        Matrix4::look_to_rh(self.position, direction, up)
    }

    /// The view-to-clip matrix for a scene spanning `render_radius` chunks.
    pub fn projection_matrix(&self, render_radius: i32) -> Matrix4<f32> {
        let z_far = (render_radius * 32 + 64) as f32;
        match self.ortho {
            Some(size) => cgmath::ortho(
                -size * self.aspect,
                size * self.aspect,
                -size,
                size,
                -z_far,
                z_far,
            ),
            None => cgmath::perspective(Deg(self.fov), self.aspect, Z_NEAR, z_far),
        }
    }
}

/// Clip planes of one viewpoint.
#[derive(Copy, Clone, Debug)]
pub struct Frustum {
    planes: [Vector4<f32>; 6],
    plane_count: usize,
}

impl Frustum {
    /// Builds the frustum of a viewpoint.
    ///
    /// # Arguments
    /// * `viewpoint` - The camera
    /// * `render_radius` - Render distance in chunks, which sets the far plane
    pub fn new(viewpoint: &Viewpoint, render_radius: i32) -> Self {
        let matrix = viewpoint.projection_matrix(render_radius) * viewpoint.view_matrix();
        let plane_count = if viewpoint.ortho.is_some() { 4 } else { 6 };
        Frustum::from_matrix(matrix, plane_count)
    }

    /// Extracts planes from a combined projection and view matrix.
    ///
    /// The planes are ordered left, right, bottom, top, near, far. Only the
    /// first `plane_count` take part in tests.
    pub fn from_matrix(matrix: Matrix4<f32>, plane_count: usize) -> Self {
        let (r0, r1, r2, r3) = (matrix.row(0), matrix.row(1), matrix.row(2), matrix.row(3));
        Frustum {
            planes: [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2],
            plane_count: plane_count.min(6),
        }
    }

    /// Returns `true` when `point` is inside every active plane.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        self.active_planes()
            .iter()
            .all(|plane| distance(plane, point) >= 0.0)
    }

    /// Returns `true` unless the chunk's bounding box lies entirely outside
    /// one of the planes.
    ///
    /// The box spans the chunk's column expanded by one voxel horizontally
    /// and `miny..=maxy` vertically.
    pub fn chunk_visible(&self, p: i32, q: i32, miny: i32, maxy: i32) -> bool {
        let x = (p * CHUNK_SIZE - 1) as f32;
        let z = (q * CHUNK_SIZE - 1) as f32;
        let d = (CHUNK_SIZE + 1) as f32;
        let corners = [
            Point3::new(x, miny as f32, z),
            Point3::new(x + d, miny as f32, z),
            Point3::new(x, miny as f32, z + d),
            Point3::new(x + d, miny as f32, z + d),
            Point3::new(x, maxy as f32, z),
            Point3::new(x + d, maxy as f32, z),
            Point3::new(x, maxy as f32, z + d),
            Point3::new(x + d, maxy as f32, z + d),
        ];
        !self.active_planes().iter().any(|plane| {
            corners
                .iter()
                .all(|&corner| distance(plane, corner) < 0.0)
        })
    }

    fn active_planes(&self) -> &[Vector4<f32>] {
        &self.planes[..self.plane_count]
    }
}

fn distance(plane: &Vector4<f32>, point: Point3<f32>) -> f32 {
    plane.x * point.x + plane.y * point.y + plane.z * point.z + plane.w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::WORLD_HEIGHT;
    use cgmath::Zero;

    fn looking_east() -> Viewpoint {
        Viewpoint::new(Point3::new(8.0, 40.0, 8.0), Vector3::unit_x(), 65.0)
    }

    #[test]
    fn chunks_ahead_are_visible_and_behind_are_not() {
        let frustum = Frustum::new(&looking_east(), 10);
        assert!(frustum.chunk_visible(3, 0, 0, 30));
        assert!(!frustum.chunk_visible(-3, 0, 0, 30));
        assert!(frustum.chunk_visible(0, 0, 0, 30));
    }

    #[test]
    fn far_plane_follows_render_radius() {
        let frustum = Frustum::new(&looking_east(), 1);
        assert!(frustum.contains_point(Point3::new(50.0, 40.0, 8.0)));
        assert!(!frustum.contains_point(Point3::new(200.0, 40.0, 8.0)));
    }

    #[test]
    fn orthographic_ignores_depth() {
        let viewpoint = Viewpoint {
            ortho: Some(20.0),
            ..looking_east()
        };
        let frustum = Frustum::new(&viewpoint, 10);
        assert!(frustum.chunk_visible(-3, 0, 30, 35));
        assert!(!frustum.chunk_visible(0, 5, 30, 35));
    }

    #[test]
    fn angles_produce_a_unit_direction() {
        let viewpoint = Viewpoint::from_angles(Point3::new(0.0, 0.0, 0.0), Deg(90.0), Deg(0.0), 65.0);
        assert!(viewpoint.direction.z > 0.999);
        assert!((viewpoint.direction.magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_direction_still_sees_its_own_chunk() {
        let viewpoint = Viewpoint::new(Point3::new(8.0, 40.0, 8.0), Vector3::zero(), 65.0);
        let view: [[f32; 4]; 4] = viewpoint.view_matrix().into();
        assert!(view.iter().flatten().all(|v| v.is_finite()));
        let frustum = Frustum::new(&viewpoint, 10);
        assert!(frustum.chunk_visible(0, 0, 0, WORLD_HEIGHT));
        assert!(frustum.chunk_visible(0, -3, 0, 60));
        assert!(!frustum.chunk_visible(0, 3, 0, 60));
    }

    #[test]
    fn viewpoint_reports_its_chunk() {
        let viewpoint = Viewpoint::new(Point3::new(-0.6, 3.0, 31.6), Vector3::unit_x(), 65.0);
        assert_eq!(viewpoint.chunk(), (-1, 2));
    }
}
