use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use dxfsvg_core::document::Document;

mod dxf;
mod raster;
mod svg;

pub use raster::{Rasterizer, ResvgRasterizer};
pub use svg::{SvgWriter, VectorDocumentWriter};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
    #[error("rasterization failed: {0}")]
    Raster(String),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

/// ASCII DXF 读取入口。只解析 ENTITIES 段，其余段落整体跳过。
#[derive(Debug, Default, Clone, Copy)]
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    /// 解析内存中的 DXF 字节流，非 UTF-8 字节按替换字符处理。
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Document, IoError> {
        let source = String::from_utf8_lossy(bytes);
        self.parse_str(&source)
    }

    pub fn parse_str(&self, source: &str) -> Result<Document, IoError> {
        let document = dxf::DxfParser::new(source)
            .parse()
            .map_err(|err| IoError::InvalidDocument(err.message))?;
        debug!(entities = document.len(), "DXF 解析完成");
        Ok(document)
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let data = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = data.len(), "读取 DXF 文件");
        self.parse_bytes(&data)
    }
}
