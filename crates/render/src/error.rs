use shapez_common::{Component, Tagged};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// The surface could not be acquired or presented.
    #[error("[render-scheduler] surface unavailable: {reason}")]
    Surface { reason: String },
    #[error("[render-scheduler] invalid pixel ratio {0}")]
    PixelRatio(f32),
}

impl Tagged for RenderError {
    fn component(&self) -> Component {
        Component::Scheduler
    }
}
