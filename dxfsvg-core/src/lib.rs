pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，坐标单位与图纸一致。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub const fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub const fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，对外以 `[xmin, xmax, ymin, ymax]` 顺序交换数据。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        /// 找不到图框时返回的占位范围，合法但语义上为空。
        pub const FRAME_NOT_FOUND: Bounds2D = Bounds2D {
            min: Point2::new(300.0, 300.0),
            max: Point2::new(600.0, 600.0),
        };

        /// 由 `[xmin, xmax, ymin, ymax]` 构造。
        #[inline]
        pub fn from_extents(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
            Self {
                min: Point2::new(xmin, ymin),
                max: Point2::new(xmax, ymax),
            }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn extents(&self) -> [f64; 4] {
            [self.min.x(), self.max.x(), self.min.y(), self.max.y()]
        }

        #[inline]
        pub fn width(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.x() - self.min.x()
            }
        }

        #[inline]
        pub fn height(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.y() - self.min.y()
            }
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        /// 按比例在两个轴上分别外扩：x 方向扩 `fraction * |宽|`，y 方向扩 `fraction * |高|`。
        pub fn expanded_by_fraction(&self, fraction: f64) -> Self {
            if self.is_empty() {
                return *self;
            }
            let margin = DVec2::new(self.width().abs(), self.height().abs()) * fraction;
            Self {
                min: Point2::from_vec(self.min.as_vec2() - margin),
                max: Point2::from_vec(self.max.as_vec2() + margin),
            }
        }

        /// 闭区间包含判定，边界上的点视为在内。
        #[inline]
        pub fn contains(&self, point: Point2) -> bool {
            self.min.x() <= point.x()
                && point.x() <= self.max.x()
                && self.min.y() <= point.y()
                && point.y() <= self.max.y()
        }
    }

}

pub mod document {
    use std::collections::HashMap;
    use std::f64::consts::{FRAC_PI_2, TAU};

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Point2, Vector2};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 图层信息。DXF 的 LAYER 表不参与转换，这里只记录图层名及实体数量。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub entity_count: usize,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                entity_count: 0,
            }
        }
    }

    /// 图纸实体。已知类型之外的 DXF 实体统一落到 `Unsupported`，保留图层以便按图层过滤。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Circle(Circle),
        Arc(Arc),
        Ellipse(Ellipse),
        Polyline(Polyline),
        LwPolyline(Polyline),
        Spline(Spline),
        Text(Text),
        Unsupported(UnsupportedEntity),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Line(line) => &line.layer,
                Entity::Circle(circle) => &circle.layer,
                Entity::Arc(arc) => &arc.layer,
                Entity::Ellipse(ellipse) => &ellipse.layer,
                Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => &polyline.layer,
                Entity::Spline(spline) => &spline.layer,
                Entity::Text(text) => &text.layer,
                Entity::Unsupported(other) => &other.layer,
            }
        }

        /// DXF 实体类型名，日志与检查输出使用。
        pub fn kind_name(&self) -> &str {
            match self {
                Entity::Line(_) => "LINE",
                Entity::Circle(_) => "CIRCLE",
                Entity::Arc(_) => "ARC",
                Entity::Ellipse(_) => "ELLIPSE",
                Entity::Polyline(_) => "POLYLINE",
                Entity::LwPolyline(_) => "LWPOLYLINE",
                Entity::Spline(_) => "SPLINE",
                Entity::Text(_) => "TEXT",
                Entity::Unsupported(other) => &other.kind,
            }
        }

        #[inline]
        pub fn is_on_layer(&self, layer: &str) -> bool {
            self.layer_name() == layer
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
        pub layer: String,
    }

    /// 圆弧实体，角度单位为度，数学正方向，保留读入的原始数值（不做 0~360 归一）。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
        pub layer: String,
    }

    impl Arc {
        /// 给定角度（度）处的圆周点。
        #[inline]
        pub fn point_at_degrees(&self, degrees: f64) -> Point2 {
            let radians = degrees.to_radians();
            self.center.translate(Vector2::new(
                self.radius * radians.cos(),
                self.radius * radians.sin(),
            ))
        }

        /// 路径起点取 `end_angle` 处的点，与历史输出保持一致。
        #[inline]
        pub fn path_start(&self) -> Point2 {
            self.point_at_degrees(self.end_angle)
        }

        /// 路径终点取 `start_angle` 处的点。
        #[inline]
        pub fn path_end(&self) -> Point2 {
            self.point_at_degrees(self.start_angle)
        }
    }

    /// 椭圆实体，记录主轴向量与参数范围（单位为弧度）。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Ellipse {
        pub center: Point2,
        pub major_axis: Vector2,
        pub ratio: f64,
        pub start_parameter: f64,
        pub end_parameter: f64,
        pub layer: String,
    }

    impl Ellipse {
        fn minor_axis(&self) -> Vector2 {
            let major = self.major_axis.as_vec2();
            Vector2::new(-major.y * self.ratio.abs(), major.x * self.ratio.abs())
        }

        /// 参数 `t`（弧度）处的椭圆点。
        pub fn point_at(&self, t: f64) -> Point2 {
            let offset = self.major_axis.as_vec2() * t.cos() + self.minor_axis().as_vec2() * t.sin();
            self.center.translate(Vector2::from(offset))
        }

        fn tangent_at(&self, t: f64) -> Vector2 {
            let tangent =
                -self.major_axis.as_vec2() * t.sin() + self.minor_axis().as_vec2() * t.cos();
            Vector2::from(tangent)
        }

        /// 规范化参数区间：起止相同（模一整圈）视为整圈，其余按逆时针方向取 `(0, 2π)` 内的跨度。
        pub fn parameter_span(&self) -> (f64, f64) {
            let start = self.start_parameter;
            (start, start + self.sweep())
        }

        fn sweep(&self) -> f64 {
            let delta = (self.end_parameter - self.start_parameter).rem_euclid(TAU);
            if delta < 1e-9 || TAU - delta < 1e-9 {
                TAU
            } else {
                delta
            }
        }

        /// 转换为等价样条：控制点为分段三次 Bezier（每段不超过 90°，点数恒为 `1 + 3n`），
        /// 拟合点为沿参数均匀采样的椭圆点。
        pub fn to_spline(&self) -> Spline {
            let start = self.start_parameter;
            let span = self.sweep();

            let segment_count = ((span / FRAC_PI_2).ceil() as usize).clamp(1, 4);
            let step = span / segment_count as f64;
            let handle = 4.0 / 3.0 * (step / 4.0).tan();

            let mut control_points = Vec::with_capacity(segment_count * 3 + 1);
            control_points.push(self.point_at(start));
            for i in 0..segment_count {
                let t0 = start + step * i as f64;
                let t1 = t0 + step;
                let p0 = self.point_at(t0);
                let p1 = self.point_at(t1);
                let d0 = self.tangent_at(t0).as_vec2() * handle;
                let d1 = self.tangent_at(t1).as_vec2() * handle;
                control_points.push(Point2::from_vec(p0.as_vec2() + d0));
                control_points.push(Point2::from_vec(p1.as_vec2() - d1));
                control_points.push(p1);
            }

            let sample_count = ((span / (TAU / 64.0)).ceil() as usize).clamp(16, 64);
            let fit_points = (0..=sample_count)
                .map(|i| self.point_at(start + span * (i as f64 / sample_count as f64)))
                .collect();

            Spline {
                degree: 3,
                is_closed: (span - TAU).abs() < 1e-9,
                control_points,
                fit_points,
                knot_values: Vec::new(),
                weights: Vec::new(),
                layer: self.layer.clone(),
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<PolylineVertex>,
        pub is_closed: bool,
        pub layer: String,
    }

    impl Polyline {
        #[inline]
        pub fn points(&self) -> impl Iterator<Item = Point2> + '_ {
            self.vertices.iter().map(|vertex| vertex.position)
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PolylineVertex {
        pub position: Point2,
        pub bulge: f64,
    }

    impl PolylineVertex {
        #[inline]
        pub fn new(position: Point2) -> Self {
            Self {
                position,
                bulge: 0.0,
            }
        }

        #[inline]
        pub fn with_bulge(position: Point2, bulge: f64) -> Self {
            Self { position, bulge }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Spline {
        pub degree: i32,
        pub is_closed: bool,
        pub control_points: Vec<Point2>,
        pub fit_points: Vec<Point2>,
        pub knot_values: Vec<f64>,
        pub weights: Vec<f64>,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub content: String,
        pub height: f64,
        pub rotation: f64,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UnsupportedEntity {
        pub kind: String,
        pub layer: String,
    }

    /// 一次转换所用的只读图纸：实体按 DXF 中出现的顺序存放。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        layers: HashMap<String, Layer>,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
    }

    impl Document {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_entity(&mut self, entity: Entity) -> EntityId {
            let layer = entity.layer_name().to_string();
            self.layers
                .entry(layer.clone())
                .or_insert_with(|| Layer::new(layer))
                .entity_count += 1;
            let id = self.next_id();
            self.entities.push((id, entity));
            id
        }

        pub fn add_line(
            &mut self,
            start: Point2,
            end: Point2,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Line(Line {
                start,
                end,
                layer: layer.into(),
            }))
        }

        pub fn add_circle(
            &mut self,
            center: Point2,
            radius: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Circle(Circle {
                center,
                radius,
                layer: layer.into(),
            }))
        }

        /// 角度单位为度。
        pub fn add_arc(
            &mut self,
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Arc(Arc {
                center,
                radius,
                start_angle,
                end_angle,
                layer: layer.into(),
            }))
        }

        pub fn add_ellipse(
            &mut self,
            center: Point2,
            major_axis: Vector2,
            ratio: f64,
            start_parameter: f64,
            end_parameter: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Ellipse(Ellipse {
                center,
                major_axis,
                ratio,
                start_parameter,
                end_parameter,
                layer: layer.into(),
            }))
        }

        pub fn add_polyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            self.add_entity(Entity::Polyline(Self::collect_polyline(
                vertices, is_closed, layer,
            )))
        }

        pub fn add_lwpolyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            self.add_entity(Entity::LwPolyline(Self::collect_polyline(
                vertices, is_closed, layer,
            )))
        }

        pub fn add_spline(
            &mut self,
            control_points: Vec<Point2>,
            fit_points: Vec<Point2>,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Spline(Spline {
                degree: 3,
                is_closed: false,
                control_points,
                fit_points,
                knot_values: Vec::new(),
                weights: Vec::new(),
                layer: layer.into(),
            }))
        }

        pub fn add_text(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            height: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Text(Text {
                insert,
                content: content.into(),
                height,
                rotation: 0.0,
                layer: layer.into(),
            }))
        }

        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities
                .iter()
                .find(|(entity_id, _)| *entity_id == id)
                .map(|(_, entity)| entity)
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entities.is_empty()
        }

        fn collect_polyline<I>(vertices: I, is_closed: bool, layer: impl Into<String>) -> Polyline
        where
            I: IntoIterator<Item = Point2>,
        {
            Polyline {
                vertices: vertices.into_iter().map(PolylineVertex::new).collect(),
                is_closed,
                layer: layer.into(),
            }
        }

        #[inline]
        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

}

pub mod vector {
    use crate::document::EntityId;
    use crate::geometry::{Point2, Vector2};

    /// 样式中使用的颜色，序列化为 SVG 颜色关键字。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Color {
        Black,
        Green,
        Blue,
    }

    impl Color {
        pub fn as_svg(self) -> &'static str {
            match self {
                Color::Black => "black",
                Color::Green => "green",
                Color::Blue => "blue",
            }
        }

        pub fn as_rgb(self) -> &'static str {
            match self {
                Color::Black => "rgb(0, 0, 0)",
                Color::Green => "rgb(0, 128, 0)",
                Color::Blue => "rgb(0, 0, 255)",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PaintStyle {
        pub stroke: Color,
        /// `None` 表示不填充。
        pub fill: Option<Color>,
        pub stroke_width: f64,
    }

    /// 图元变换。几何图元统一使用 `Scale(s, -s)`，文字使用平移。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum PrimitiveTransform {
        Scale { x: f64, y: f64 },
        Translate { x: f64, y: f64 },
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum PathCommand {
        MoveTo(Point2),
        CubicTo {
            ctrl1: Point2,
            ctrl2: Point2,
            to: Point2,
        },
        /// 相对坐标圆弧（SVG 小写 `a`）。
        ArcBy {
            radius: f64,
            large_arc: bool,
            sweep: bool,
            delta: Vector2,
        },
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum Shape {
        Line { start: Point2, end: Point2 },
        Circle { center: Point2, radius: f64 },
        Polyline { points: Vec<Point2> },
        Path { commands: Vec<PathCommand> },
        Text { content: String, font_size: f64 },
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct VectorPrimitive {
        pub source: EntityId,
        pub shape: Shape,
        pub style: PaintStyle,
        pub transform: PrimitiveTransform,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ViewBox {
        pub min_x: f64,
        pub min_y: f64,
        pub width: f64,
        pub height: f64,
    }

    /// 画布上的提示文字，仅用于空结果占位文档。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Notice {
        pub text: String,
        pub position: Point2,
        pub font_size: f64,
    }

    pub const EMPTY_NOTICE: &str = "! nothing to display !";
    /// 画布边长上限（像素）。栅格化按 RGBA 分配 `边长² × 4` 字节，8192 对应 256 MiB。
    pub const MAX_CANVAS_SIZE: u32 = 8192;

    #[derive(Debug, Clone, PartialEq)]
    pub struct VectorDocument {
        pub canvas_size: u32,
        pub view_box: ViewBox,
        /// 铺满画布、位于所有图元之下的不透明底色。
        pub background: Option<Color>,
        pub primitives: Vec<VectorPrimitive>,
        pub notice: Option<Notice>,
    }

    impl VectorDocument {
        pub fn new(canvas_size: u32, view_box: ViewBox) -> Self {
            Self {
                canvas_size,
                view_box,
                background: None,
                primitives: Vec::new(),
                notice: None,
            }
        }

        /// 没有可绘制实体时的占位文档：`viewBox` 与画布一致，左上角附提示文字。
        pub fn placeholder(canvas_size: u32) -> Self {
            let size = f64::from(canvas_size);
            Self {
                canvas_size,
                view_box: ViewBox {
                    min_x: 0.0,
                    min_y: 0.0,
                    width: size,
                    height: size,
                },
                background: None,
                primitives: Vec::new(),
                notice: Some(Notice {
                    text: EMPTY_NOTICE.to_string(),
                    position: Point2::new(50.0, 50.0),
                    font_size: 20.0,
                }),
            }
        }

        #[inline]
        pub fn is_placeholder(&self) -> bool {
            self.notice.is_some() && self.primitives.is_empty()
        }
    }
}
