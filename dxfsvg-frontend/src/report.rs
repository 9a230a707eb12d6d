use std::path::PathBuf;

use serde::Serialize;

use dxfsvg_engine::{ConversionWarning, FrameStatus, Measurements};

use crate::errors::FrontendError;

/// 一次转换的汇总结果，字段名沿用下游表格使用的列名。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowReport {
    #[serde(rename = "Svg_Path")]
    pub svg_path: PathBuf,
    #[serde(rename = "Width")]
    pub width: f64,
    #[serde(rename = "Height")]
    pub height: f64,
    #[serde(rename = "Total_Length")]
    pub total_length: f64,
    #[serde(rename = "Hatch_area")]
    pub hatch_area: f64,
    #[serde(rename = "Units")]
    pub units: String,
    /// 占位文档没有比例，序列化为 `null`。
    #[serde(rename = "Scale")]
    pub scale: Option<f64>,
    #[serde(rename = "Frame")]
    pub frame: Option<String>,
    #[serde(rename = "Warnings")]
    pub warnings: Vec<String>,
}

impl WorkflowReport {
    pub(crate) fn new(
        svg_path: PathBuf,
        measurements: Measurements,
        hatch_area: f64,
        units: &str,
        scale: Option<f64>,
        frame: &FrameStatus,
        warnings: &[ConversionWarning],
    ) -> Self {
        let frame = match frame {
            FrameStatus::Resolved(frame) => Some(frame.name.clone()),
            FrameStatus::NotRequested | FrameStatus::Unresolved { .. } => None,
        };
        Self {
            svg_path,
            width: measurements.width,
            height: measurements.height,
            total_length: measurements.total_length,
            hatch_area,
            units: units.to_string(),
            scale,
            frame,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, FrontendError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
