use dxfsvg_core::document::{Entity, EntityId, Spline};
use dxfsvg_core::geometry::Vector2;
use dxfsvg_core::vector::{
    Color, PaintStyle, PathCommand, PrimitiveTransform, Shape, VectorPrimitive,
};

use crate::projection::RenderContext;

/// 字高到字号的经验修正系数。
pub const TEXT_HEIGHT_CORRECTION: f64 = 1.4;

/// 图元样式方案：轮廓输出，或用于面积统计的填充输出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProfile {
    Outline,
    Hatch,
}

impl StyleProfile {
    /// 线宽取 `1/scale`，经全局缩放后恒为 1 像素。
    pub fn paint(self, context: &RenderContext) -> PaintStyle {
        let stroke_width = 1.0 / context.scale;
        match self {
            StyleProfile::Outline => PaintStyle {
                stroke: Color::Black,
                fill: None,
                stroke_width,
            },
            StyleProfile::Hatch => PaintStyle {
                stroke: Color::Green,
                fill: Some(Color::Blue),
                stroke_width,
            },
        }
    }

    /// 填充方案铺一层不透明黑底，使像素只有覆盖与背景两种状态。
    pub fn background(self) -> Option<Color> {
        match self {
            StyleProfile::Outline => None,
            StyleProfile::Hatch => Some(Color::Black),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StyleProfile::Outline => "outline",
            StyleProfile::Hatch => "hatch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisIssue {
    /// 控制点数不满足 `n > 0 且 (n - 1) % 3 == 0`。
    MalformedCurve { control_points: usize },
}

/// 为单个实体生成图元。未支持类型与无顶点的多段线返回 `Ok(None)`。
pub fn synthesize(
    id: EntityId,
    entity: &Entity,
    context: &RenderContext,
    profile: StyleProfile,
) -> Result<Option<VectorPrimitive>, SynthesisIssue> {
    let scale = context.scale;
    let geometric = PrimitiveTransform::Scale {
        x: scale,
        y: -scale,
    };

    let (shape, transform) = match entity {
        Entity::Line(line) => (
            Shape::Line {
                start: line.start,
                end: line.end,
            },
            geometric,
        ),
        Entity::Circle(circle) => (
            Shape::Circle {
                center: circle.center,
                radius: circle.radius,
            },
            geometric,
        ),
        Entity::Arc(arc) => {
            let start = arc.path_start();
            let delta = Vector2::from_points(start, arc.path_end());
            (
                Shape::Path {
                    commands: vec![
                        PathCommand::MoveTo(start),
                        PathCommand::ArcBy {
                            radius: arc.radius,
                            large_arc: false,
                            sweep: false,
                            delta,
                        },
                    ],
                },
                geometric,
            )
        }
        Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => {
            if polyline.vertices.is_empty() {
                return Ok(None);
            }
            (
                Shape::Polyline {
                    points: polyline.points().collect(),
                },
                geometric,
            )
        }
        Entity::Spline(spline) => (bezier_path(spline)?, geometric),
        Entity::Ellipse(ellipse) => (bezier_path(&ellipse.to_spline())?, geometric),
        Entity::Text(text) => (
            Shape::Text {
                content: text.content.clone(),
                font_size: text.height * TEXT_HEIGHT_CORRECTION * scale,
            },
            PrimitiveTransform::Translate {
                x: text.insert.x() * scale,
                y: -text.insert.y() * scale,
            },
        ),
        Entity::Unsupported(_) => return Ok(None),
    };

    Ok(Some(VectorPrimitive {
        source: id,
        shape,
        style: profile.paint(context),
        transform,
    }))
}

/// 控制多边形近似：首个控制点作为起点，其余每三个一组构成一段三次 Bezier。
fn bezier_path(spline: &Spline) -> Result<Shape, SynthesisIssue> {
    let points = &spline.control_points;
    let Some((first, rest)) = points.split_first() else {
        return Err(SynthesisIssue::MalformedCurve { control_points: 0 });
    };
    if rest.len() % 3 != 0 {
        return Err(SynthesisIssue::MalformedCurve {
            control_points: points.len(),
        });
    }

    let mut commands = Vec::with_capacity(1 + rest.len() / 3);
    commands.push(PathCommand::MoveTo(*first));
    commands.extend(rest.chunks_exact(3).map(|triple| PathCommand::CubicTo {
        ctrl1: triple[0],
        ctrl2: triple[1],
        to: triple[2],
    }));
    Ok(Shape::Path { commands })
}
