use std::time::{Duration, Instant};

use tracing::{debug, warn};

use dxfsvg_core::document::Document;
use dxfsvg_core::geometry::Bounds2D;
use dxfsvg_core::vector::VectorDocument;

use crate::errors::{ConversionWarning, EngineError};
use crate::extract::{
    self, DEFAULT_MARGIN_FRACTION, DEFAULT_MARKER_LAYER, ExtractOptions, Extraction, FrameStatus,
};
use crate::measure::{self, Measurements};
use crate::projection::{DEFAULT_CANVAS_SIZE, Projection, RenderContext};
use crate::synth::{self, StyleProfile, SynthesisIssue};

/// 调用方给定的截止时间，`None` 表示不限时。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now().checked_add(timeout))
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|instant| Instant::now() >= instant)
    }

    pub fn check(&self, stage: &'static str) -> Result<(), EngineError> {
        if self.is_expired() {
            warn!(stage, "转换超时");
            return Err(EngineError::DeadlineExceeded { stage });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    pub marker_layer: String,
    pub frame_name: Option<String>,
    pub canvas_size: u32,
    pub margin_fraction: f64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            marker_layer: DEFAULT_MARKER_LAYER.to_string(),
            frame_name: None,
            canvas_size: DEFAULT_CANVAS_SIZE,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
        }
    }
}

impl ConversionOptions {
    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            marker_layer: self.marker_layer.clone(),
            frame_name: self.frame_name.clone(),
            margin_fraction: self.margin_fraction,
        }
    }
}

/// 单一样式方案下的转换结果。
#[derive(Debug, Clone)]
pub struct Rendering {
    pub profile: StyleProfile,
    pub document: VectorDocument,
    /// 无可绘制实体（占位文档）时为 `None`。
    pub context: Option<RenderContext>,
    pub bounds: Bounds2D,
    pub frame: FrameStatus,
    pub selected: usize,
    pub warnings: Vec<ConversionWarning>,
}

impl Rendering {
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.context.is_none()
    }
}

/// 转换器本身不可变，可在线程间共享，每次调用各自生成渲染参数。
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConversionOptions,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn extract<'a>(
        &self,
        document: &'a Document,
        deadline: &Deadline,
    ) -> Result<Extraction<'a>, EngineError> {
        deadline.check("extraction")?;
        Ok(extract::extract(document, &self.options.extract_options()))
    }

    pub fn render(
        &self,
        document: &Document,
        profile: StyleProfile,
        deadline: &Deadline,
    ) -> Result<Rendering, EngineError> {
        let extraction = self.extract(document, deadline)?;
        self.render_extraction(&extraction, profile, deadline)
    }

    pub fn measure(&self, extraction: &Extraction<'_>) -> Measurements {
        measure::measure(extraction.entities())
    }

    /// 投影并逐个合成图元。单个实体的问题记为警告并跳过，不中断整体转换。
    pub fn render_extraction(
        &self,
        extraction: &Extraction<'_>,
        profile: StyleProfile,
        deadline: &Deadline,
    ) -> Result<Rendering, EngineError> {
        let mut warnings = Vec::new();
        if let FrameStatus::Unresolved { name } = &extraction.frame {
            warnings.push(ConversionWarning::UnresolvedFrame { name: name.clone() });
        }

        if extraction.is_empty() {
            debug!(profile = profile.name(), "没有可绘制的实体，输出占位文档");
            return Ok(Rendering {
                profile,
                document: VectorDocument::placeholder(self.options.canvas_size),
                context: None,
                bounds: extraction.bounds,
                frame: extraction.frame.clone(),
                selected: 0,
                warnings,
            });
        }

        deadline.check("projection")?;
        let projection = Projection::fit(
            &extraction.bounds,
            self.options.canvas_size,
            self.options.margin_fraction,
        )?;
        let context = projection.context();

        let mut document = VectorDocument::new(context.canvas_size, projection.view_box());
        document.background = profile.background();

        for (id, entity) in &extraction.entities {
            deadline.check("synthesis")?;
            match synth::synthesize(*id, entity, &context, profile) {
                Ok(Some(primitive)) => document.primitives.push(primitive),
                Ok(None) => {}
                Err(SynthesisIssue::MalformedCurve { control_points }) => {
                    warn!(
                        entity = id.get(),
                        kind = entity.kind_name(),
                        control_points,
                        "控制点数量不构成三次 Bezier 链，已跳过"
                    );
                    warnings.push(ConversionWarning::MalformedCurve {
                        entity: *id,
                        kind: entity.kind_name().to_string(),
                        control_points,
                    });
                }
            }
        }

        debug!(
            profile = profile.name(),
            scale = context.scale,
            primitives = document.primitives.len(),
            "矢量文档生成完成"
        );

        Ok(Rendering {
            profile,
            document,
            context: Some(context),
            bounds: extraction.bounds,
            frame: extraction.frame.clone(),
            selected: extraction.entities.len(),
            warnings,
        })
    }
}
