use std::path::Path;

use tracing::{info, warn};

use dxfsvg_core::document::Document;
use dxfsvg_io::{DocumentLoader, DxfFacade};

use crate::errors::FrontendError;

/// 读取 DXF 文档并记录概要信息。
pub fn load_document(path: &Path) -> Result<Document, FrontendError> {
    load_with(&DxfFacade::new(), path)
}

pub fn load_with(loader: &impl DocumentLoader, path: &Path) -> Result<Document, FrontendError> {
    match loader.load(path) {
        Ok(document) => {
            info!(
                path = %path.display(),
                entity_count = document.len(),
                layer_count = document.layers().count(),
                "从 DXF 加载文档成功"
            );
            Ok(document)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "加载 DXF 失败");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfsvg_core::geometry::Point2;
    use dxfsvg_io::IoError;

    struct FixedLoader;

    impl DocumentLoader for FixedLoader {
        fn load(&self, _path: &Path) -> Result<Document, IoError> {
            let mut doc = Document::new();
            doc.add_line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), "0");
            Ok(doc)
        }
    }

    #[test]
    fn custom_loader_is_used() {
        let doc = load_with(&FixedLoader, Path::new("ignored.dxf")).expect("加载失败");
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn missing_file_maps_to_io_error() {
        let err = load_document(Path::new("/nonexistent/drawing.dxf")).expect_err("应失败");
        assert!(matches!(err, FrontendError::Io(IoError::ReadError { .. })));
    }
}
