use shapez_common::{Component, Tagged};
use shapez_parser::ParseError;
use shapez_scene::SceneError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    #[error("[shape-assembly] quarter fragments are not resolved yet")]
    NotInitialized,
    #[error("[shape-assembly] no quarter slot at layer {layer}, quarter {quarter}")]
    IndexOutOfRange { layer: usize, quarter: usize },
    #[error(transparent)]
    Identifier(#[from] ParseError),
    #[error("[shape-assembly] {0}")]
    Scene(#[from] SceneError),
}

impl Tagged for AssemblyError {
    fn component(&self) -> Component {
        match self {
            Self::Identifier(err) => err.component(),
            _ => Component::Assembly,
        }
    }
}
