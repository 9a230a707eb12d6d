use std::path::PathBuf;

use thiserror::Error;

use dxfsvg_config::ConfigError;
use dxfsvg_engine::EngineError;
use dxfsvg_io::IoError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("无法确定输出文件名：{path:?}")]
    OutputPath { path: PathBuf },
    #[error("写入位图 {path:?} 失败: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("序列化报告失败: {0}")]
    Json(#[from] serde_json::Error),
}
