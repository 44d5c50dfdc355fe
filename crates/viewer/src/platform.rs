use crate::error::ViewerError;

/// Host capability check performed before a viewer touches the surface.
pub trait Platform {
    fn name(&self) -> &str;

    /// Whether GPU rendering is available.
    fn supports_rendering(&self) -> bool;
}

/// A platform with no display that always accepts; the backend decides what
/// drawing means.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Platform for Headless {
    fn name(&self) -> &str {
        "headless"
    }

    fn supports_rendering(&self) -> bool {
        true
    }
}

/// Fail with [`ViewerError::UnsupportedPlatform`] unless `platform` can render.
/// Hosts call this before creating a surface backend.
pub fn ensure_supported(platform: &impl Platform) -> Result<(), ViewerError> {
    if platform.supports_rendering() {
        return Ok(());
    }
    tracing::warn!(platform = platform.name(), "rendering unavailable");
    Err(ViewerError::UnsupportedPlatform {
        platform: platform.name().to_string(),
    })
}
