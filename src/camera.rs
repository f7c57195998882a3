//! Camera types and the camera-rig seam.
//!
//! The world's fit computation writes clip planes to a [`Camera`] and drives
//! an external rig controller through the [`CameraRig`] trait. Hosts with
//! their own orbit/fly controller implement the trait; [`OrbitRig`] is a
//! minimal ready-made implementation.

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};

/// Perspective camera parameters plus the derived projection matrix.
///
/// `fov` is the vertical field of view in degrees, matching what asset
/// viewers conventionally expose.
#[derive(Clone, Debug)]
pub struct Camera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl Camera {
    pub fn new(fov: f32, aspect: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near: 0.1,
            far: 1000.0,
            projection: Matrix4::identity(),
        };
        camera.update_projection();
        camera
    }

    /// Recompute the projection matrix from the current parameters.
    ///
    /// Degenerate clip planes (as produced by fitting a zero-size model)
    /// leave the previous projection in place instead of panicking.
    pub fn update_projection(&mut self) {
        if !(self.near > 0.0 && self.far > self.near && self.aspect > 0.0) {
            log::warn!(
                "degenerate camera parameters (near {}, far {}, aspect {}), keeping projection",
                self.near,
                self.far,
                self.aspect
            );
            return;
        }
        self.projection =
            cgmath::perspective(cgmath::Deg(self.fov), self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }
}

/// External orbit/rig controller driven by the camera fit.
pub trait CameraRig {
    fn set_target(&mut self, x: f32, y: f32, z: f32);
    fn set_position(&mut self, x: f32, y: f32, z: f32);
}

/// A minimal rig: remembers target and position and derives a view matrix.
#[derive(Clone, Debug)]
pub struct OrbitRig {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl OrbitRig {
    pub fn new() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        if self.position == self.target {
            // look_at is undefined for a zero view vector
            return Matrix4::from_translation(Vector3::new(
                -self.position.x,
                -self.position.y,
                -self.position.z,
            ));
        }
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }
}

impl Default for OrbitRig {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraRig for OrbitRig {
    fn set_target(&mut self, x: f32, y: f32, z: f32) {
        self.target = Point3::new(x, y, z);
    }

    fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Point3::new(x, y, z);
    }
}
