/// Look-at camera with perspective or orthographic projection.
/// Projections use the OpenGL depth range (NDC z in [-1, 1]) which the
/// rasterizer maps to reversed-Z screen depth.
use glam::{Mat4, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Projection {
    Perspective {
        fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        half_width: f32,
        half_height: f32,
        near: f32,
        far: f32,
    },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov_degrees: 45.0,
                aspect: 1.0,
                near: 0.1,
                far: 100.0,
            },
        }
    }
}

impl Camera {
    pub fn perspective(eye: Vec3, target: Vec3, fov_degrees: f32, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov_degrees,
                aspect,
                near: 0.1,
                far: 100.0,
            },
        }
    }

    pub fn orthographic(eye: Vec3, target: Vec3, half_width: f32, half_height: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            projection: Projection::Orthographic {
                half_width,
                half_height,
                near: 0.1,
                far: 100.0,
            },
        }
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// Width over height of a perspective frustum. Orthographic cameras keep
    /// their explicit extents.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = aspect_ratio;
        }
    }

    /// World to eye space, right-handed, looking down -Z.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective {
                fov_degrees,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect, near, far),
            Projection::Orthographic {
                half_width,
                half_height,
                near,
                far,
            } => Mat4::orthographic_rh_gl(
                -half_width,
                half_width,
                -half_height,
                half_height,
                near,
                far,
            ),
        }
    }

    /// World to clip space. The rasterizer divides by `w` itself.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
