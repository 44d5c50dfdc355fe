use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::PI;

/// Perspective camera orbiting a target point.
///
/// Panning and zooming are not supported; the distance to the target is fixed
/// and the polar angle is clamped so the camera never dips below the stand.
/// Input deltas are accumulated as angular velocity and bled off by `damping`
/// on each [`OrbitCamera::update`].
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Rotation around the Y axis, radians. Zero looks down the -Z axis.
    pub azimuth: f32,
    /// Angle from the +Y axis, radians.
    pub polar: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub max_polar: f32,
    pub sensitivity: f32,
    pub damping: f32,
    velocity: Vec2,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_from(Vec3::new(0.0, 0.9, 0.9), Vec3::ZERO)
    }
}

impl OrbitCamera {
    /// Place the camera at `position` looking at `target`.
    pub fn looking_from(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length().max(f32::EPSILON);
        Self {
            target,
            distance,
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
            fov: 55.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 10.0,
            max_polar: PI * 0.4,
            sensitivity: 0.005,
            damping: 0.05,
            velocity: Vec2::ZERO,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.distance
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Feed a pointer drag in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.velocity += Vec2::new(dx, dy) * self.sensitivity;
    }

    /// Apply accumulated rotation. Returns whether the camera moved.
    pub fn update(&mut self) -> bool {
        if self.velocity.length_squared() < 1e-10 {
            self.velocity = Vec2::ZERO;
            return false;
        }
        self.azimuth -= self.velocity.x * self.damping;
        self.polar = (self.polar - self.velocity.y * self.damping).clamp(1e-3, self.max_polar);
        self.velocity *= 1.0 - self.damping;
        true
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
