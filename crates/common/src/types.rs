use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Rotate about the local Y axis, composing with the current rotation.
    pub fn rotate_y(&mut self, radians: f32) {
        self.rotation *= Quat::from_rotation_y(radians);
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// A view's rectangle on the host surface, in logical pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewRect {
    pub top: i32,
    pub left: i32,
    pub width: u32,
    pub height: u32,
}

impl ViewRect {
    pub const fn new(top: i32, left: i32, width: u32, height: u32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    /// Width over height; a zero height is treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Whether any part of this rectangle lies inside `[0, width) x [0, height)`.
    pub fn intersects_surface(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.top < height as i32
            && self.bottom() > 0
            && self.left < width as i32
            && self.right() > 0
    }
}

/// A rectangle on the drawing surface with a bottom-left origin, the
/// convention viewport and scissor state are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the two rectangles share at least one pixel.
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        let (ax1, ay1) = (self.x + self.width as i32, self.y + self.height as i32);
        let (bx1, by1) = (other.x + other.width as i32, other.y + other.height as i32);
        self.x < bx1 && other.x < ax1 && self.y < by1 && other.y < ay1
    }
}
