use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbaImage;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use dxfsvg_config::AppConfig;
use dxfsvg_engine::area::estimate_area;
use dxfsvg_engine::{ConversionOptions, Converter, Deadline, Extraction, StyleProfile};
use dxfsvg_io::{IoError, Rasterizer, ResvgRasterizer, SvgWriter, VectorDocumentWriter};

use crate::errors::FrontendError;
use crate::loader::load_document;
use crate::report::WorkflowReport;

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub conversion: ConversionOptions,
    /// 轮廓 SVG 的输出路径，缺省为输入文件同名的 `.svg`。
    pub output: Option<PathBuf>,
    pub keep_intermediates: bool,
    pub units_label: String,
    pub timeout: Option<Duration>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::build(&AppConfig::default())
    }
}

impl WorkflowOptions {
    /// 校验配置后生成流程参数，越界的画布尺寸等在读取图纸之前就被拒绝。
    pub fn from_config(config: &AppConfig) -> Result<Self, FrontendError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &AppConfig) -> Self {
        let conversion = &config.conversion;
        Self {
            conversion: ConversionOptions {
                marker_layer: conversion.marker_layer_name.clone(),
                frame_name: conversion.frame_name.clone(),
                canvas_size: conversion.canvas_size,
                margin_fraction: conversion.margin_fraction,
            },
            output: None,
            keep_intermediates: config.output.keep_intermediates,
            units_label: config.output.units_label.clone(),
            timeout: conversion.timeout_ms.map(Duration::from_millis),
        }
    }

    fn deadline(&self) -> Deadline {
        self.timeout.map(Deadline::after).unwrap_or_default()
    }
}

/// 完整转换流程：读取 DXF，统计尺寸并以填充渲染估算面积，全部成功后才写出轮廓 SVG。
pub fn run(input: &Path, options: &WorkflowOptions) -> Result<WorkflowReport, FrontendError> {
    run_with(input, options, &ResvgRasterizer::new())
}

/// 同 [`run`]，栅格化由调用方提供。
///
/// 任一步骤失败时不写任何文件，已存在的输出保持原样。
pub fn run_with(
    input: &Path,
    options: &WorkflowOptions,
    rasterizer: &impl Rasterizer,
) -> Result<WorkflowReport, FrontendError> {
    let deadline = options.deadline();
    let document = load_document(input)?;
    let converter = Converter::new(options.conversion.clone());
    let writer = SvgWriter::new();
    let svg_path = output_path(input, options.output.as_deref())?;

    let extraction = converter.extract(&document, &deadline)?;
    let outline = converter.render_extraction(&extraction, StyleProfile::Outline, &deadline)?;
    let outline_svg = writer.write(&outline.document);

    let measurements = converter.measure(&extraction);
    let hatch = render_hatch(&converter, &extraction, rasterizer, &deadline)?;
    let hatch_area = hatch.as_ref().map_or(0.0, |hatch| hatch.area);

    if let Some(hatch) = hatch.as_ref().filter(|_| options.keep_intermediates) {
        hatch.save(&svg_path)?;
    }
    write_atomically(&svg_path, outline_svg.as_bytes())?;
    info!(path = %svg_path.display(), "轮廓 SVG 已写出");

    let report = WorkflowReport::new(
        svg_path,
        measurements,
        hatch_area,
        &options.units_label,
        outline.context.map(|context| context.scale),
        &outline.frame,
        &outline.warnings,
    );
    info!(
        width = report.width,
        height = report.height,
        total_length = report.total_length,
        hatch_area = report.hatch_area,
        warnings = report.warnings.len(),
        "转换完成"
    );
    Ok(report)
}

/// 填充渲染的中间结果，按需落盘。
struct HatchRender {
    svg: String,
    image: RgbaImage,
    area: f64,
}

impl HatchRender {
    fn save(&self, svg_path: &Path) -> Result<(), FrontendError> {
        let path = sibling_path(svg_path, "_hatch.svg")?;
        write_atomically(&path, self.svg.as_bytes())?;
        debug!(path = %path.display(), "保留填充 SVG");

        let path = sibling_path(svg_path, "_hatch.png")?;
        self.image
            .save(&path)
            .map_err(|source| FrontendError::Image { path: path.clone(), source })?;
        debug!(path = %path.display(), "保留填充位图");
        Ok(())
    }
}

/// 选择集为空或没有投影时返回 `None`，面积记为 0。
fn render_hatch(
    converter: &Converter,
    extraction: &Extraction<'_>,
    rasterizer: &impl Rasterizer,
    deadline: &Deadline,
) -> Result<Option<HatchRender>, FrontendError> {
    if extraction.is_empty() {
        debug!("选择集为空，面积记为 0");
        return Ok(None);
    }

    let hatch = converter.render_extraction(extraction, StyleProfile::Hatch, deadline)?;
    let Some(context) = hatch.context else {
        return Ok(None);
    };
    let svg = SvgWriter::new().write(&hatch.document);

    deadline.check("rasterization")?;
    let image = rasterizer.rasterize(&svg, hatch.document.canvas_size)?;
    let area = estimate_area(&image, context.scale);
    debug!(area, scale = context.scale, "面积估算完成");
    Ok(Some(HatchRender { svg, image, area }))
}

fn output_path(input: &Path, explicit: Option<&Path>) -> Result<PathBuf, FrontendError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if input.file_stem().is_none() {
        return Err(FrontendError::OutputPath {
            path: input.to_path_buf(),
        });
    }
    Ok(input.with_extension("svg"))
}

/// `out/part.svg` + `_hatch.png` -> `out/part_hatch.png`
fn sibling_path(svg_path: &Path, suffix: &str) -> Result<PathBuf, FrontendError> {
    let stem = svg_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| FrontendError::OutputPath {
            path: svg_path.to_path_buf(),
        })?;
    Ok(svg_path.with_file_name(format!("{stem}{suffix}")))
}

/// 先写入目标目录下的临时文件再改名，调用方不会看到写了一半的文件。
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), IoError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_error = |source| IoError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn default_output_replaces_extension() {
        let path = output_path(Path::new("drawings/part.dxf"), None).expect("路径");
        assert_eq!(path, PathBuf::from("drawings/part.svg"));

        let explicit = output_path(Path::new("part.dxf"), Some(Path::new("out/x.svg"))).expect("路径");
        assert_eq!(explicit, PathBuf::from("out/x.svg"));
    }

    #[test]
    fn intermediate_names_follow_svg_stem() {
        let path = sibling_path(Path::new("out/part.svg"), "_hatch.png").expect("路径");
        assert_eq!(path, PathBuf::from("out/part_hatch.png"));
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let target = dir.path().join("out.svg");
        fs::write(&target, "old").expect("写入旧文件");

        write_atomically(&target, b"<svg/>").expect("写入失败");
        assert_eq!(fs::read_to_string(&target).expect("读取"), "<svg/>");
        let leftovers = fs::read_dir(dir.path()).expect("列目录").count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn atomic_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let target = dir.path().join("missing").join("out.svg");
        let err = write_atomically(&target, b"x").expect_err("目录不存在应失败");
        assert!(matches!(err, IoError::WriteError { .. }));
    }

    #[test]
    fn options_follow_config() {
        let mut config = AppConfig::default();
        config.conversion.frame_name = Some("A".to_string());
        config.conversion.timeout_ms = Some(1500);
        config.output.keep_intermediates = true;

        let options = WorkflowOptions::from_config(&config).expect("配置有效");
        assert_eq!(options.conversion.frame_name.as_deref(), Some("A"));
        assert_eq!(options.conversion.canvas_size, 512);
        assert_eq!(options.timeout, Some(Duration::from_millis(1500)));
        assert!(options.keep_intermediates);
        assert_eq!(options.units_label, "Inch");
    }

    #[test]
    fn invalid_config_is_rejected_as_config_error() {
        let mut config = AppConfig::default();
        config.conversion.canvas_size = 70_000;
        let err = WorkflowOptions::from_config(&config).expect_err("画布过大应失败");
        assert!(matches!(err, FrontendError::Config(_)), "{err}");
    }
}
