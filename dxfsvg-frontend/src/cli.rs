use std::path::Path;

use tracing::info;

use dxfsvg_core::document::{Document, Entity};
use dxfsvg_core::geometry::Point2;

use crate::errors::FrontendError;
use crate::loader::load_document;

/// 加载 DXF 并打印图层与实体概览，便于确认图框标记是否被正确读取。
pub fn run_inspect(path: &Path) -> Result<(), FrontendError> {
    let document = load_document(path)?;
    info!(
        entity_count = document.len(),
        layer_count = document.layers().count(),
        "文档检查"
    );
    println!("已从 DXF 加载文档：{}", path.display());
    for line in describe_document(&document) {
        println!("{line}");
    }
    Ok(())
}

pub fn describe_document(document: &Document) -> Vec<String> {
    let mut lines = Vec::with_capacity(document.len() + 8);

    let mut layers: Vec<_> = document.layers().collect();
    layers.sort_by(|a, b| a.name.cmp(&b.name));
    lines.push("当前文档图层：".to_string());
    for layer in layers {
        lines.push(format!("  - {} ({} 个实体)", layer.name, layer.entity_count));
    }

    lines.push("当前文档实体：".to_string());
    for (id, entity) in document.entities() {
        lines.push(format!(
            "  - #{} {} Layer={}{}",
            id.get(),
            entity.kind_name(),
            entity.layer_name(),
            describe_entity(entity)
        ));
    }
    lines
}

fn describe_entity(entity: &Entity) -> String {
    match entity {
        Entity::Line(line) => {
            format!(", 起点={}, 终点={}", format_point(line.start), format_point(line.end))
        }
        Entity::Circle(circle) => format!(
            ", 圆心={}, 半径={:.2}",
            format_point(circle.center),
            circle.radius
        ),
        Entity::Arc(arc) => format!(
            ", 圆心={}, 半径={:.2}, 起始角={:.1}°, 结束角={:.1}°",
            format_point(arc.center),
            arc.radius,
            arc.start_angle,
            arc.end_angle
        ),
        Entity::Ellipse(ellipse) => format!(
            ", 圆心={}, 比例={:.3}, 参数范围=[{:.1}°, {:.1}°]",
            format_point(ellipse.center),
            ellipse.ratio,
            ellipse.start_parameter.to_degrees(),
            ellipse.end_parameter.to_degrees()
        ),
        Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => format!(
            ", 顶点数={}, 闭合={}",
            polyline.vertices.len(),
            if polyline.is_closed { "是" } else { "否" }
        ),
        Entity::Spline(spline) => format!(
            ", degree={}, control={}, fit={}",
            spline.degree,
            spline.control_points.len(),
            spline.fit_points.len()
        ),
        Entity::Text(text) => format!(
            ", 插入点={}, 高度={:.2}, 内容=\"{}\"",
            format_point(text.insert),
            text.height,
            text.content
        ),
        Entity::Unsupported(_) => "（不支持，转换时跳过）".to_string(),
    }
}

fn format_point(point: Point2) -> String {
    format!("({:.2}, {:.2})", point.x(), point.y())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfsvg_core::document::UnsupportedEntity;

    #[test]
    fn lists_layers_and_entities() {
        let mut doc = Document::new();
        doc.add_line(Point2::new(0.0, 0.0), Point2::new(1.0, 2.0), "GEOM");
        doc.add_text(Point2::new(5.0, 5.0), "A", 2.0, "svgframe");
        doc.add_entity(Entity::Unsupported(UnsupportedEntity {
            kind: "HATCH".to_string(),
            layer: "FILL".to_string(),
        }));

        let lines = describe_document(&doc);
        assert_eq!(lines[0], "当前文档图层：");
        assert!(lines.iter().any(|line| line == "  - svgframe (1 个实体)"));
        assert!(
            lines
                .iter()
                .any(|line| line.contains("LINE Layer=GEOM, 起点=(0.00, 0.00), 终点=(1.00, 2.00)"))
        );
        assert!(lines.iter().any(|line| line.contains("内容=\"A\"")));
        assert!(lines.iter().any(|line| line.contains("HATCH Layer=FILL（不支持")));
    }
}
