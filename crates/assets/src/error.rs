use shapez_common::{Component, Tagged};
use std::path::PathBuf;

/// Errors from fragment loading.
///
/// `Clone` so a single failed load can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    #[error("[quarter-registry] failed to load fragment `{fragment}`: {reason}")]
    LoadFailure { fragment: String, reason: String },
    #[error("[quarter-registry] failed to write fragment to {path:?}: {reason}")]
    Export { path: PathBuf, reason: String },
}

impl AssetError {
    pub(crate) fn load(fragment: &str, reason: impl ToString) -> Self {
        Self::LoadFailure {
            fragment: fragment.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Tagged for AssetError {
    fn component(&self) -> Component {
        Component::Registry
    }
}
