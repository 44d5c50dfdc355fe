use serde::{Deserialize, Serialize};
use shapez_assets::{DirectoryLoader, FragmentLoader, ProceduralLoader};
use shapez_common::{Component, Tagged, ViewRect};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::layout::grid_layout;
use crate::viewer::{ShapeViewOption, SurfaceSize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("[shape-viewer] cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("[shape-viewer] invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Tagged for ConfigError {
    fn component(&self) -> Component {
        Component::Viewer
    }
}

/// Where quarter fragments come from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentSource {
    /// Generated in process.
    #[default]
    Procedural,
    /// `<name>.json` geometry files in a directory.
    Directory(PathBuf),
}

impl FragmentSource {
    pub fn loader(&self) -> Rc<dyn FragmentLoader> {
        match self {
            Self::Procedural => Rc::new(ProceduralLoader::new()),
            Self::Directory(root) => Rc::new(DirectoryLoader::new(root)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Identifier to show; the default shape when absent.
    #[serde(default)]
    pub shape: Option<String>,
    /// Placement on the surface; a grid cell when absent.
    #[serde(default)]
    pub region: Option<ViewRect>,
}

/// Viewer settings as read from YAML.
///
/// ```yaml
/// width: 800
/// height: 400
/// fragments: procedural
/// views:
///   - shape: "CuCuCuCu"
///   - shape: "RrRr:cwcw"
///     region: { top: 0, left: 400, width: 400, height: 400 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: Option<f32>,
    pub fragments: FragmentSource,
    /// `tracing` filter directive for binaries, e.g. `shapez_viewer=debug`.
    pub log_filter: Option<String>,
    pub views: Vec<ViewConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            pixel_ratio: None,
            fragments: FragmentSource::Procedural,
            log_filter: None,
            views: vec![ViewConfig::default()],
        }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), views = config.views.len(), "loaded viewer config");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn surface(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.width,
            height: self.height,
            pixel_ratio: self.pixel_ratio,
        }
    }

    /// One option per configured view. Views without a region take the grid
    /// cell matching their position in the list.
    pub fn view_options(&self) -> Vec<ShapeViewOption> {
        let cells = grid_layout(self.views.len(), self.width, self.height);
        self.views
            .iter()
            .zip(cells)
            .map(|(view, cell)| ShapeViewOption {
                region: view.region.unwrap_or(cell),
                shape: view.shape.clone(),
            })
            .collect()
    }
}
