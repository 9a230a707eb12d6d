use tracing::{debug, info, warn};

use dxfsvg_core::document::{Document, Entity, EntityId, Polyline};
use dxfsvg_core::geometry::{Bounds2D, Point2};

use crate::bounds::entity_extents;

pub const DEFAULT_MARKER_LAYER: &str = "svgframe";
pub const DEFAULT_MARGIN_FRACTION: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub marker_layer: String,
    /// 给定时进入图框模式，否则为整图模式。
    pub frame_name: Option<String>,
    pub margin_fraction: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            marker_layer: DEFAULT_MARKER_LAYER.to_string(),
            frame_name: None,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
        }
    }
}

/// 已解析的图框：锚点文字加其附近的边框多段线。
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    pub anchor: Point2,
    pub anchor_height: f64,
    pub rect: Bounds2D,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    NotRequested,
    Resolved(Frame),
    Unresolved { name: String },
}

#[derive(Debug, Clone)]
pub struct Extraction<'a> {
    pub entities: Vec<(EntityId, &'a Entity)>,
    pub bounds: Bounds2D,
    pub frame: FrameStatus,
}

impl<'a> Extraction<'a> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &'a Entity> + '_ {
        self.entities.iter().map(|(_, entity)| *entity)
    }
}

pub fn extract<'a>(document: &'a Document, options: &ExtractOptions) -> Extraction<'a> {
    match options.frame_name.as_deref() {
        None => extract_whole(document, options),
        Some(name) => extract_frame(document, options, name),
    }
}

fn extract_whole<'a>(document: &'a Document, options: &ExtractOptions) -> Extraction<'a> {
    let mut bounds = Bounds2D::empty();
    let entities: Vec<(EntityId, &Entity)> = document
        .entities()
        .filter(|(_, entity)| !entity.is_on_layer(&options.marker_layer))
        .map(|(id, entity)| (*id, entity))
        .collect();
    for (_, entity) in &entities {
        if let Some(extents) = entity_extents(entity) {
            bounds.include_bounds(&extents);
        }
    }

    let bounds = bounds.expanded_by_fraction(options.margin_fraction);
    debug!(
        entities = entities.len(),
        extents = ?bounds.extents(),
        "整图模式提取完成"
    );
    Extraction {
        entities,
        bounds,
        frame: FrameStatus::NotRequested,
    }
}

fn extract_frame<'a>(
    document: &'a Document,
    options: &ExtractOptions,
    name: &str,
) -> Extraction<'a> {
    let Some(frame) = resolve_frame(document, &options.marker_layer, name) else {
        warn!(frame = name, "未找到图框，返回占位范围");
        return Extraction {
            entities: Vec::new(),
            bounds: Bounds2D::FRAME_NOT_FOUND,
            frame: FrameStatus::Unresolved {
                name: name.to_string(),
            },
        };
    };

    let entities: Vec<(EntityId, &Entity)> = document
        .entities()
        .filter(|(_, entity)| !entity.is_on_layer(&options.marker_layer))
        .filter(|(_, entity)| {
            characteristic_point(entity).is_some_and(|point| frame.rect.contains(point))
        })
        .map(|(id, entity)| (*id, entity))
        .collect();

    info!(
        frame = name,
        rect = ?frame.rect.extents(),
        entities = entities.len(),
        "图框模式提取完成"
    );
    Extraction {
        entities,
        bounds: frame.rect,
        frame: FrameStatus::Resolved(frame),
    }
}

/// 查找图框：标记层上内容完全匹配的文字作锚点，再找最近顶点距锚点小于文字高度的多段线。
/// 锚点与边框均取迭代顺序中最后一个匹配项。
pub fn resolve_frame(document: &Document, marker_layer: &str, name: &str) -> Option<Frame> {
    let marker = || {
        document
            .entities()
            .map(|(_, entity)| entity)
            .filter(move |entity| entity.is_on_layer(marker_layer))
    };

    let anchor = marker()
        .filter_map(|entity| match entity {
            Entity::Text(text) if text.content == name => Some(text),
            _ => None,
        })
        .last()?;

    let boundary = marker()
        .filter_map(|entity| match entity {
            Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => Some(polyline),
            _ => None,
        })
        .filter(|polyline| {
            nearest_vertex_distance(polyline, anchor.insert).is_some_and(|d| d < anchor.height)
        })
        .last()?;

    let mut rect = Bounds2D::empty();
    for point in boundary.points() {
        rect.include_point(point);
    }

    Some(Frame {
        name: name.to_string(),
        anchor: anchor.insert,
        anchor_height: anchor.height,
        rect,
    })
}

fn nearest_vertex_distance(polyline: &Polyline, target: Point2) -> Option<f64> {
    polyline
        .points()
        .map(|point| point.distance(target))
        .min_by(f64::total_cmp)
}

/// 图框包含判定所用的代表点。多段线、样条、椭圆及未支持类型没有代表点。
pub fn characteristic_point(entity: &Entity) -> Option<Point2> {
    match entity {
        Entity::Line(line) => Some(line.start),
        Entity::Circle(circle) => Some(circle.center),
        Entity::Arc(arc) => Some(arc.path_start()),
        Entity::Text(text) => Some(text.insert),
        Entity::Polyline(_)
        | Entity::LwPolyline(_)
        | Entity::Spline(_)
        | Entity::Ellipse(_)
        | Entity::Unsupported(_) => None,
    }
}
