use dxfsvg_core::geometry::{Bounds2D, Point2};
use dxfsvg_core::vector::{MAX_CANVAS_SIZE, PrimitiveTransform, ViewBox};

use crate::errors::EngineError;

pub const DEFAULT_CANVAS_SIZE: u32 = 512;

/// 单次转换的渲染参数，按调用生成并显式传递。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub scale: f64,
    pub canvas_size: u32,
    pub margin_fraction: f64,
}

/// 图纸坐标到画布坐标的映射：统一缩放并翻转 Y 轴。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    bounds: Bounds2D,
    context: RenderContext,
}

impl Projection {
    /// `scale = canvas_size / max(宽, 高)`；范围为空、非有限或宽高均为 0 时报错。
    pub fn fit(
        bounds: &Bounds2D,
        canvas_size: u32,
        margin_fraction: f64,
    ) -> Result<Self, EngineError> {
        if canvas_size == 0 || canvas_size > MAX_CANVAS_SIZE {
            return Err(EngineError::InvalidCanvasSize(canvas_size));
        }
        let width = bounds.width();
        let height = bounds.height();
        let extent = width.max(height);
        let finite = bounds.extents().iter().all(|value| value.is_finite());
        if bounds.is_empty() || !finite || extent <= 0.0 || !extent.is_finite() {
            return Err(EngineError::DegenerateGeometry { width, height });
        }

        Ok(Self {
            bounds: *bounds,
            context: RenderContext {
                scale: f64::from(canvas_size) / extent,
                canvas_size,
                margin_fraction,
            },
        })
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.context.scale
    }

    #[inline]
    pub fn context(&self) -> RenderContext {
        self.context
    }

    /// 视图框：原点 `(xmin·s, −ymax·s)`，尺寸 `(宽·s, 高·s)`。
    pub fn view_box(&self) -> ViewBox {
        let s = self.context.scale;
        let [xmin, _, _, ymax] = self.bounds.extents();
        ViewBox {
            min_x: xmin * s,
            min_y: -ymax * s,
            width: self.bounds.width() * s,
            height: self.bounds.height() * s,
        }
    }

    #[inline]
    pub fn primitive_transform(&self) -> PrimitiveTransform {
        PrimitiveTransform::Scale {
            x: self.context.scale,
            y: -self.context.scale,
        }
    }

    #[inline]
    pub fn project(&self, point: Point2) -> Point2 {
        let s = self.context.scale;
        Point2::new(point.x() * s, -point.y() * s)
    }

    #[inline]
    pub fn unproject(&self, point: Point2) -> Point2 {
        let s = self.context.scale;
        Point2::new(point.x() / s, -point.y() / s)
    }
}
