use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::f32::consts::TAU;

/// Content-addressed geometry ID computed from the vertex data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeometryId(pub u64);

/// Errors from validating raw mesh data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("mesh `{name}` has {positions} positions but {normals} normals")]
    NormalCount {
        name: String,
        positions: usize,
        normals: usize,
    },
    #[error("mesh `{name}` index {index} out of range for {positions} positions")]
    IndexOutOfRange {
        name: String,
        index: u32,
        positions: usize,
    },
    #[error("mesh `{name}` index count {count} is not a multiple of 3")]
    PartialTriangle { name: String, count: usize },
}

/// Raw triangle-list mesh data, the on-disk fragment format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.normals.len() != self.positions.len() {
            return Err(GeometryError::NormalCount {
                name: self.name.clone(),
                positions: self.positions.len(),
                normals: self.normals.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(GeometryError::PartialTriangle {
                name: self.name.clone(),
                count: self.indices.len(),
            });
        }
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(GeometryError::IndexOutOfRange {
                name: self.name.clone(),
                index,
                positions: self.positions.len(),
            });
        }
        Ok(())
    }
}

/// Validated, immutable mesh data with a stable content id.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    id: GeometryId,
    data: MeshData,
}

impl Geometry {
    pub fn new(data: MeshData) -> Result<Self, GeometryError> {
        data.validate()?;
        Ok(Self {
            id: content_hash(&data),
            data,
        })
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.data.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.data.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.data.indices
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn triangle_count(&self) -> usize {
        self.data.indices.len() / 3
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.data.positions.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), p| {
                let p = Vec3::from_array(*p);
                (min.min(p), max.max(p))
            },
        )
    }

    /// Closed cylinder around the Y axis, centered on the origin.
    pub fn cylinder(name: &str, radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = height * 0.5;
        let ring: Vec<Vec2> = (0..segments)
            .map(|i| {
                let a = i as f32 / segments as f32 * TAU;
                Vec2::new(a.cos() * radius, a.sin() * radius)
            })
            .collect();
        let mut builder = Builder::default();
        builder.prism(&ring, -half, half, true);
        builder.finish(name)
    }

    /// Extrude a simple polygon in the XZ plane (x, z) from `y = 0` up to
    /// `height`. Caps are fanned from the first vertex, so the outline must be
    /// star-shaped with respect to it.
    pub fn extrude(name: &str, outline: &[Vec2], height: f32) -> Self {
        let mut builder = Builder::default();
        builder.prism(outline, 0.0, height, false);
        builder.finish(name)
    }
}

#[derive(Default)]
struct Builder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl Builder {
    fn vertex(&mut self, p: Vec3, n: Vec3) -> u32 {
        self.positions.push(p.to_array());
        self.normals.push(n.to_array());
        (self.positions.len() - 1) as u32
    }

    /// Side walls plus top and bottom caps. `smooth` gives radial side normals.
    fn prism(&mut self, outline: &[Vec2], y0: f32, y1: f32, smooth: bool) {
        if outline.len() < 3 {
            return;
        }
        let orientation = signed_area(outline).signum();

        for (i, &a) in outline.iter().enumerate() {
            let b = outline[(i + 1) % outline.len()];
            let edge = b - a;
            let flat = Vec3::new(edge.y, 0.0, -edge.x).normalize_or_zero() * orientation;
            let (na, nb) = if smooth {
                (
                    Vec3::new(a.x, 0.0, a.y).normalize_or_zero(),
                    Vec3::new(b.x, 0.0, b.y).normalize_or_zero(),
                )
            } else {
                (flat, flat)
            };
            let a0 = self.vertex(Vec3::new(a.x, y0, a.y), na);
            let b0 = self.vertex(Vec3::new(b.x, y0, b.y), nb);
            let b1 = self.vertex(Vec3::new(b.x, y1, b.y), nb);
            let a1 = self.vertex(Vec3::new(a.x, y1, a.y), na);
            self.indices.extend_from_slice(&[a0, b0, b1, b1, a1, a0]);
        }

        for (y, normal) in [(y1, Vec3::Y), (y0, Vec3::NEG_Y)] {
            let start = self.positions.len() as u32;
            for p in outline {
                self.vertex(Vec3::new(p.x, y, p.y), normal);
            }
            for i in 1..outline.len() as u32 - 1 {
                self.indices.extend_from_slice(&[start, start + i, start + i + 1]);
            }
        }
    }

    fn finish(self, name: &str) -> Geometry {
        let data = MeshData {
            name: name.to_string(),
            positions: self.positions,
            normals: self.normals,
            indices: self.indices,
        };
        Geometry {
            id: content_hash(&data),
            data,
        }
    }
}

fn signed_area(outline: &[Vec2]) -> f32 {
    let mut sum = 0.0;
    for (i, a) in outline.iter().enumerate() {
        let b = outline[(i + 1) % outline.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

fn content_hash(data: &MeshData) -> GeometryId {
    let mut hasher = Sha256::new();
    hasher.update(data.name.as_bytes());
    for p in data.positions.iter().chain(data.normals.iter()) {
        for c in p {
            hasher.update(c.to_le_bytes());
        }
    }
    for i in &data.indices {
        hasher.update(i.to_le_bytes());
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    GeometryId(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn extrude_square() {
        let g = Geometry::extrude("box", &square(), 0.5);
        // 4 side quads (2 tris each) + 2 caps (2 tris each)
        assert_eq!(g.triangle_count(), 12);
        assert!(g.data().validate().is_ok());
        let (min, max) = g.bounds();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 0.5, 1.0));
    }

    #[test]
    fn side_normals_point_outward_for_either_winding() {
        let mut reversed = square();
        reversed.reverse();
        for outline in [square(), reversed] {
            let g = Geometry::extrude("box", &outline, 1.0);
            let center = Vec3::new(0.5, 0.5, 0.5);
            // First side quad: its vertices and normal.
            let p = Vec3::from_array(g.positions()[0]);
            let n = Vec3::from_array(g.normals()[0]);
            let q = Vec3::from_array(g.positions()[1]);
            let mid = (p + q) * 0.5;
            assert!(n.dot(mid - center) > 0.0);
        }
    }

    #[test]
    fn cylinder_is_centered() {
        let g = Geometry::cylinder("base", 0.55, 0.1, 32);
        let (min, max) = g.bounds();
        assert!((min.y + 0.05).abs() < 1e-6);
        assert!((max.y - 0.05).abs() < 1e-6);
        assert!((max.x - 0.55).abs() < 1e-5);
        assert!(g.data().validate().is_ok());
    }

    #[test]
    fn content_addressed_ids() {
        let a = Geometry::extrude("box", &square(), 1.0);
        let b = Geometry::extrude("box", &square(), 1.0);
        let c = Geometry::extrude("box", &square(), 2.0);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn validate_rejects_bad_indices() {
        let data = MeshData {
            name: "broken".into(),
            positions: vec![[0.0; 3]; 3],
            normals: vec![[0.0, 1.0, 0.0]; 3],
            indices: vec![0, 1, 3],
        };
        assert!(matches!(
            Geometry::new(data),
            Err(GeometryError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn validate_rejects_normal_mismatch() {
        let data = MeshData {
            name: "broken".into(),
            positions: vec![[0.0; 3]; 3],
            normals: vec![[0.0, 1.0, 0.0]; 2],
            indices: vec![0, 1, 2],
        };
        assert!(matches!(
            Geometry::new(data),
            Err(GeometryError::NormalCount { .. })
        ));
    }
}
