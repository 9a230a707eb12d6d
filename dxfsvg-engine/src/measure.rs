use std::f64::consts::TAU;

use dxfsvg_core::document::{Entity, Polyline};
use dxfsvg_core::geometry::{Bounds2D, Point2};

use crate::bounds::entity_extents;

/// 提取结果的尺寸统计，单位与图纸一致。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurements {
    pub width: f64,
    pub height: f64,
    pub total_length: f64,
}

/// 宽高取实体集合原始范围（不含边距），总长为各实体周长之和。
pub fn measure<'a, I>(entities: I) -> Measurements
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut bounds = Bounds2D::empty();
    let mut total_length = 0.0;
    for entity in entities {
        if let Some(extents) = entity_extents(entity) {
            bounds.include_bounds(&extents);
        }
        total_length += entity_length(entity);
    }
    Measurements {
        width: bounds.width(),
        height: bounds.height(),
        total_length,
    }
}

pub fn entity_length(entity: &Entity) -> f64 {
    match entity {
        Entity::Line(line) => line.start.distance(line.end),
        Entity::Circle(circle) => TAU * circle.radius,
        Entity::Arc(arc) => {
            let mut sweep = arc.end_angle - arc.start_angle;
            if arc.start_angle > arc.end_angle {
                sweep += 360.0;
            }
            arc.radius * sweep.to_radians()
        }
        Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => polyline_length(polyline),
        Entity::Spline(spline) => chain_length(&spline.fit_points),
        Entity::Ellipse(ellipse) => chain_length(&ellipse.to_spline().fit_points),
        Entity::Text(_) | Entity::Unsupported(_) => 0.0,
    }
}

fn polyline_length(polyline: &Polyline) -> f64 {
    let points: Vec<Point2> = polyline.points().collect();
    let mut length = chain_length(&points);
    if polyline.is_closed {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            length += last.distance(*first);
        }
    }
    length
}

fn chain_length(points: &[Point2]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}
