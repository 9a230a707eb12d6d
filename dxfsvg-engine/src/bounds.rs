use dxfsvg_core::document::{Arc, Entity, Spline};
use dxfsvg_core::geometry::{Bounds2D, Point2};

/// 计算单个实体对整体范围的贡献。无法提供坐标的实体（未支持类型、空顶点列表）返回 `None`。
pub fn entity_extents(entity: &Entity) -> Option<Bounds2D> {
    let mut bounds = Bounds2D::empty();
    match entity {
        Entity::Line(line) => {
            bounds.include_point(line.start);
            bounds.include_point(line.end);
        }
        Entity::Circle(circle) => {
            let radius = circle.radius.abs();
            let center = circle.center;
            bounds.include_point(Point2::new(center.x() - radius, center.y() - radius));
            bounds.include_point(Point2::new(center.x() + radius, center.y() + radius));
        }
        Entity::Arc(arc) => arc_extents(arc, &mut bounds),
        Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => {
            // bulge 段不展开
            for point in polyline.points() {
                bounds.include_point(point);
            }
        }
        Entity::Text(text) => bounds.include_point(text.insert),
        Entity::Spline(spline) => spline_extents(spline, &mut bounds),
        Entity::Ellipse(ellipse) => spline_extents(&ellipse.to_spline(), &mut bounds),
        Entity::Unsupported(_) => {}
    }
    if bounds.is_empty() { None } else { Some(bounds) }
}

/// 圆弧范围：路径两端点，加上角度区间跨过的象限极值点。
/// 比较直接使用读入的度数，不做归一。
fn arc_extents(arc: &Arc, bounds: &mut Bounds2D) {
    let (cx, cy, r) = (arc.center.x(), arc.center.y(), arc.radius);
    let (start, end) = (arc.start_angle, arc.end_angle);

    bounds.include_point(arc.path_start());
    bounds.include_point(arc.path_end());

    if start <= 360.0 && end >= 0.0 {
        bounds.include_point(Point2::new(cx + r, cy));
    }
    if start <= 180.0 && 180.0 <= end {
        bounds.include_point(Point2::new(cx - r, cy));
    }
    if start <= 90.0 && 90.0 <= end {
        bounds.include_point(Point2::new(cx, cy + r));
    }
    if start <= 270.0 && 270.0 <= end {
        bounds.include_point(Point2::new(cx, cy - r));
    }
}

/// 样条只看拟合点，控制点不参与。
fn spline_extents(spline: &Spline, bounds: &mut Bounds2D) {
    for point in &spline.fit_points {
        bounds.include_point(*point);
    }
}
