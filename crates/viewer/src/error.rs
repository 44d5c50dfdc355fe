use shapez_assets::AssetError;
use shapez_common::{Component, Tagged};
use shapez_model::AssemblyError;
use shapez_parser::ParseError;
use shapez_render::RenderError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("[shape-viewer] no GPU rendering is available on {platform}")]
    UnsupportedPlatform { platform: String },
    #[error("[shape-viewer] no views defined")]
    NoViewsDefined,
    #[error("[shape-viewer] no view at index {0}")]
    UnknownView(usize),
    #[error(transparent)]
    Identifier(#[from] ParseError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Assembly(AssemblyError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ViewerError {
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::Assembly(AssemblyError::NotInitialized))
    }
}

impl From<AssemblyError> for ViewerError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::Identifier(err) => Self::Identifier(err),
            other => Self::Assembly(other),
        }
    }
}

impl Tagged for ViewerError {
    fn component(&self) -> Component {
        match self {
            Self::Identifier(err) => err.component(),
            Self::Asset(err) => err.component(),
            Self::Assembly(err) => err.component(),
            Self::Render(err) => err.component(),
            Self::UnsupportedPlatform { .. }
            | Self::NoViewsDefined
            | Self::UnknownView(_)
            | Self::Config(_) => Component::Viewer,
        }
    }
}
