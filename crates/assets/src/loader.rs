use futures::FutureExt;
use futures::future::LocalBoxFuture;
use glam::Vec2;
use shapez_scene::{Geometry, MeshData};
use std::f32::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

use crate::error::AssetError;

/// Height of every procedural quarter fragment; a hair under one layer.
pub const FRAGMENT_HEIGHT: f32 = 0.09;

const QUARTER_RADIUS: f32 = 0.5;
const ARC_SEGMENTS: u32 = 12;

/// Loads a named mesh fragment. Implementations may suspend (network, disk);
/// the registry only awaits them on the render thread.
pub trait FragmentLoader {
    fn load<'a>(&'a self, name: &'a str) -> LocalBoxFuture<'a, Result<Geometry, AssetError>>;
}

/// Generates the built-in quarter fragments from 2D outlines.
///
/// Each outline occupies the `x >= 0, z >= 0` quadrant with the shape's center
/// at the origin, so rotating the slot by -90° steps covers all four quadrants.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduralLoader;

impl ProceduralLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(name: &str) -> Result<Geometry, AssetError> {
        let outline = match name {
            "circle-quarter" => circle_outline(),
            "rect-quarter" => vec![
                Vec2::ZERO,
                Vec2::new(0.42, 0.0),
                Vec2::new(0.42, 0.42),
                Vec2::new(0.0, 0.42),
            ],
            "wind-quarter" => vec![
                Vec2::ZERO,
                Vec2::new(0.42, 0.0),
                Vec2::new(0.42, 0.42),
                Vec2::new(0.0, 0.21),
            ],
            "star-quarter" => vec![
                Vec2::ZERO,
                Vec2::new(0.3, 0.0),
                Vec2::new(0.5, 0.5),
                Vec2::new(0.0, 0.3),
            ],
            "pin-quarter" => pin_outline(),
            other => return Err(AssetError::load(other, "no procedural outline")),
        };
        Ok(Geometry::extrude(name, &outline, FRAGMENT_HEIGHT))
    }
}

impl FragmentLoader for ProceduralLoader {
    fn load<'a>(&'a self, name: &'a str) -> LocalBoxFuture<'a, Result<Geometry, AssetError>> {
        futures::future::ready(Self::generate(name)).boxed_local()
    }
}

fn circle_outline() -> Vec<Vec2> {
    let mut outline = vec![Vec2::ZERO];
    outline.extend((0..=ARC_SEGMENTS).map(|i| {
        let a = i as f32 / ARC_SEGMENTS as f32 * FRAC_PI_2;
        Vec2::new(a.cos(), a.sin()) * QUARTER_RADIUS
    }));
    outline
}

fn pin_outline() -> Vec<Vec2> {
    let center = Vec2::splat(0.25);
    (0..ARC_SEGMENTS)
        .map(|i| {
            let a = i as f32 / ARC_SEGMENTS as f32 * std::f32::consts::TAU;
            center + Vec2::new(a.cos(), a.sin()) * 0.06
        })
        .collect()
}

/// Reads `<root>/<name>.json` fragment files.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    fn read(&self, name: &str) -> Result<Geometry, AssetError> {
        let path = self.path_for(name);
        let text = std::fs::read_to_string(&path).map_err(|e| AssetError::load(name, e))?;
        let data: MeshData = serde_json::from_str(&text).map_err(|e| AssetError::load(name, e))?;
        Geometry::new(data).map_err(|e| AssetError::load(name, e))
    }
}

impl FragmentLoader for DirectoryLoader {
    fn load<'a>(&'a self, name: &'a str) -> LocalBoxFuture<'a, Result<Geometry, AssetError>> {
        async move {
            tracing::debug!(name, root = %self.root.display(), "reading fragment");
            self.read(name)
        }
        .boxed_local()
    }
}

/// Write a fragment in the format [`DirectoryLoader`] reads.
pub fn write_fragment(dir: impl AsRef<Path>, geometry: &Geometry) -> Result<PathBuf, AssetError> {
    let path = dir.as_ref().join(format!("{}.json", geometry.name()));
    let export = |reason: String| AssetError::Export {
        path: path.clone(),
        reason,
    };
    let file = std::fs::File::create(&path).map_err(|e| export(e.to_string()))?;
    serde_json::to_writer_pretty(file, geometry.data()).map_err(|e| export(e.to_string()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::QUARTER_FRAGMENTS;
    use futures::executor::block_on;

    #[test]
    fn procedural_covers_every_fragment() {
        let loader = ProceduralLoader::new();
        for (_, name) in QUARTER_FRAGMENTS {
            let geometry = block_on(loader.load(name)).unwrap();
            assert_eq!(geometry.name(), name);
            assert!(geometry.triangle_count() > 0);
        }
    }

    #[test]
    fn procedural_fragments_stay_in_their_quadrant() {
        for (_, name) in QUARTER_FRAGMENTS {
            let geometry = ProceduralLoader::generate(name).unwrap();
            let (min, max) = geometry.bounds();
            assert!(min.x >= -1e-6 && min.z >= -1e-6, "{name} leaks out of quadrant");
            assert!(max.x <= 0.5 + 1e-6 && max.z <= 0.5 + 1e-6);
            assert!((max.y - FRAGMENT_HEIGHT).abs() < 1e-6);
        }
    }

    #[test]
    fn procedural_rejects_unknown_names() {
        let err = ProceduralLoader::generate("hexagon-quarter").unwrap_err();
        assert!(matches!(err, AssetError::LoadFailure { ref fragment, .. } if fragment == "hexagon-quarter"));
    }

    #[test]
    fn directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let original = ProceduralLoader::generate("star-quarter").unwrap();
        let path = write_fragment(dir.path(), &original).unwrap();
        assert!(path.ends_with("star-quarter.json"));

        let loader = DirectoryLoader::new(dir.path());
        let loaded = block_on(loader.load("star-quarter")).unwrap();
        assert_eq!(loaded.id(), original.id());
    }

    #[test]
    fn directory_missing_file_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DirectoryLoader::new(dir.path());
        let err = block_on(loader.load("circle-quarter")).unwrap_err();
        assert!(err.to_string().contains("circle-quarter"));
    }

    #[test]
    fn directory_rejects_invalid_mesh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rect-quarter.json"),
            r#"{"name":"rect-quarter","positions":[[0,0,0]],"normals":[],"indices":[0]}"#,
        )
        .unwrap();
        let loader = DirectoryLoader::new(dir.path());
        assert!(block_on(loader.load("rect-quarter")).is_err());
    }
}
