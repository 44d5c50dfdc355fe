/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from a `0xRRGGBB` sRGB value, converting to linear space.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
            a: 1.0,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Lighting model a backend should apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Banded diffuse.
    Toon,
    /// Smooth diffuse.
    Standard,
    /// Translucent, lightly lit.
    Glass,
}

/// Stateless paint data. Shared by reference between every mesh using it.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Color,
    pub shading: Shading,
}

impl Material {
    pub fn new(name: impl Into<String>, color: Color, shading: Shading) -> Self {
        Self {
            name: name.into(),
            color,
            shading,
        }
    }

    pub fn toon(name: impl Into<String>, hex: u32) -> Self {
        Self::new(name, Color::from_hex(hex), Shading::Toon)
    }

    pub fn is_translucent(&self) -> bool {
        self.color.a < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_extremes_map_to_unit_range() {
        let white = Color::from_hex(0xffffff);
        let black = Color::from_hex(0x000000);
        assert!((white.r - 1.0).abs() < 1e-6);
        assert_eq!(black.to_array(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn hex_channels_are_ordered_rgb() {
        let red = Color::from_hex(0xff0000);
        assert!(red.r > 0.99 && red.g == 0.0 && red.b == 0.0);
        let blue = Color::from_hex(0x0000ff);
        assert!(blue.b > 0.99 && blue.r == 0.0);
    }

    #[test]
    fn translucency_follows_alpha() {
        let glass = Material::new("glass", Color::WHITE.with_alpha(0.5), Shading::Glass);
        assert!(glass.is_translucent());
        assert!(!Material::toon("red", 0xee3333).is_translucent());
    }
}
