pub mod area;
pub mod bounds;
pub mod converter;
pub mod extract;
pub mod measure;
pub mod projection;
pub mod synth;

pub mod errors {
    use thiserror::Error;

    use dxfsvg_core::document::EntityId;

    #[derive(Debug, Error, Clone, PartialEq)]
    pub enum EngineError {
        #[error("bounding box is degenerate (width {width}, height {height}); cannot compute scale")]
        DegenerateGeometry { width: f64, height: f64 },
        #[error(
            "canvas size must be between 1 and {max}, got {0}",
            max = dxfsvg_core::vector::MAX_CANVAS_SIZE
        )]
        InvalidCanvasSize(u32),
        #[error("deadline exceeded during {stage}")]
        DeadlineExceeded { stage: &'static str },
    }

    /// 转换过程中的非致命问题，随结果一并返回。
    #[derive(Debug, Error, Clone, PartialEq)]
    pub enum ConversionWarning {
        #[error("frame `{name}` was not found; nothing selected")]
        UnresolvedFrame { name: String },
        #[error(
            "{kind} entity {} has {control_points} control points, not a cubic Bezier chain; skipped",
            entity.get()
        )]
        MalformedCurve {
            entity: EntityId,
            kind: String,
            control_points: usize,
        },
    }
}

pub use converter::{ConversionOptions, Converter, Deadline, Rendering};
pub use errors::{ConversionWarning, EngineError};
pub use extract::{ExtractOptions, Extraction, Frame, FrameStatus};
pub use measure::Measurements;
pub use projection::{Projection, RenderContext};
pub use synth::StyleProfile;
