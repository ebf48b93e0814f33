//! Orbit camera looking at the scene centre

use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use std::f32::consts::FRAC_PI_2;

/// Camera orbiting `target` on a sphere of radius `distance`
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Point3<f32>,
    pub distance: f32,
    /// Rotation about the up axis, radians
    pub yaw: f32,
    /// Elevation above the horizontal plane, radians
    pub pitch: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    home: (Point3<f32>, f32),
}

impl OrbitCamera {
    pub fn new(target: Point3<f32>, distance: f32) -> Self {
        let mut camera = Self {
            target,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            fov: std::f32::consts::FRAC_PI_6,
            near: 0.01,
            far: 100.0,
            home: (target, distance),
        };
        camera.update_clip();
        camera
    }

    /// Frame an axis-aligned box so all of it fits in the field of view
    pub fn fit(min: Point3<f32>, max: Point3<f32>) -> Self {
        let center = nalgebra::center(&min, &max);
        let radius = ((max - min).norm() * 0.5).max(1e-3);
        let distance = radius / (std::f32::consts::FRAC_PI_6 * 0.5).sin();
        Self::new(center, distance)
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vector3::new(cp * sy, sp, cp * cy) * self.distance
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye(), &self.target, &Vector3::y())
    }

    /// Projection mapping depth to `[0, 1]`
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Matrix4<f32> {
        let gl = Perspective3::new(aspect_ratio.max(1e-3), self.fov, self.near, self.far);
        #[rustfmt::skip]
        let to_unit_depth = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        );
        to_unit_depth * gl.into_inner()
    }

    pub fn view_projection(&self, aspect_ratio: f32) -> Matrix4<f32> {
        self.projection_matrix(aspect_ratio) * self.view_matrix()
    }

    pub fn orbit(&mut self, horizontal: f32, vertical: f32) {
        self.yaw -= horizontal;
        self.pitch = (self.pitch + vertical).clamp(-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01);
    }

    /// Positive `amount` moves towards the target
    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance * (1.0 - amount)).max(self.home.1 * 0.01);
        self.update_clip();
    }

    pub fn reset(&mut self) {
        self.target = self.home.0;
        self.distance = self.home.1;
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.update_clip();
    }

    fn update_clip(&mut self) {
        self.near = self.distance * 0.01;
        self.far = self.distance * 10.0 + self.home.1 * 2.0;
    }
}
