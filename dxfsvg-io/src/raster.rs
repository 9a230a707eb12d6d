use image::RgbaImage;
use dxfsvg_core::vector::MAX_CANVAS_SIZE;
use resvg::{tiny_skia, usvg};
use tracing::debug;

use crate::IoError;

/// SVG 栅格化接口，输出与画布同尺寸的 RGBA 位图。
pub trait Rasterizer {
    fn rasterize(&self, svg: &str, canvas_size: u32) -> Result<RgbaImage, IoError>;
}

/// 基于 resvg 的栅格化实现。
///
/// 不加载系统字体：面积统计只关心填充区域，文字不计入前景。
/// 画布边长超过 [`MAX_CANVAS_SIZE`] 时在分配位图之前报错。
#[derive(Debug, Default, Clone, Copy)]
pub struct ResvgRasterizer;

impl ResvgRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, canvas_size: u32) -> Result<RgbaImage, IoError> {
        if canvas_size == 0 || canvas_size > MAX_CANVAS_SIZE {
            return Err(IoError::Raster(format!(
                "画布边长 {canvas_size} 超出允许范围 1..={MAX_CANVAS_SIZE}"
            )));
        }
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|err| IoError::Raster(format!("SVG 解析失败: {err}")))?;

        let mut pixmap = tiny_skia::Pixmap::new(canvas_size, canvas_size).ok_or_else(|| {
            IoError::Raster(format!("无法分配 {canvas_size}x{canvas_size} 的位图"))
        })?;

        // 文档尺寸与画布不一致时按比例缩放到画布
        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            canvas_size as f32 / size.width(),
            canvas_size as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        debug!(canvas_size, "SVG 栅格化完成");

        RgbaImage::from_raw(canvas_size, canvas_size, pixmap.take())
            .ok_or_else(|| IoError::Raster("位图缓冲区长度与画布尺寸不符".to_string()))
    }
}
