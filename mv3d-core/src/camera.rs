//! Fixed perspective camera and the per-frame transform set.

use glam::{Mat4, Vec3};

/// Right-handed perspective camera producing OpenGL clip space (z in [-1, 1]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

/// The three matrices pushed to the shader every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub model: Mat4,
}

impl Camera {
    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Transforms for a model rotated by `angle` radians about the vertical axis.
    pub fn transforms(&self, angle: f32) -> Transforms {
        Transforms {
            projection: self.projection(),
            view: self.view(),
            model: model_matrix(angle),
        }
    }
}

/// Rotation of `angle` radians about +Y.
#[inline]
pub fn model_matrix(angle: f32) -> Mat4 {
    Mat4::from_axis_angle(Vec3::Y, angle)
}
