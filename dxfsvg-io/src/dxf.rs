use std::f64::consts::TAU;

use tracing::trace;

use dxfsvg_core::{
    document::{
        Arc, Circle, Document, Ellipse, Entity, Line, Polyline, PolylineVertex, Spline, Text,
        UnsupportedEntity,
    },
    geometry::{Point2, Vector2},
};

const DEFAULT_LAYER: &str = "0";
/// POLYLINE 标志位：多边形网格 / 多面网格。
const MESH_FLAGS: i32 = 0x10 | 0x40;

#[derive(Debug)]
pub(crate) struct DxfError {
    pub(crate) message: String,
}

impl DxfError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GroupPair<'s> {
    code: i32,
    value: &'s str,
}

/// 一个实体的全部组码（不含起始的 0 组），保持文件中的顺序。
struct Record<'s> {
    kind: &'s str,
    pairs: Vec<GroupPair<'s>>,
}

impl<'s> Record<'s> {
    fn layer(&self) -> String {
        self.pairs
            .iter()
            .rev()
            .find(|pair| pair.code == 8)
            .map(|pair| pair.value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_LAYER.to_string())
    }

    fn values(&self, code: i32) -> impl Iterator<Item = &'s str> + '_ {
        self.pairs
            .iter()
            .filter(move |pair| pair.code == code)
            .map(|pair| pair.value)
    }

    fn field(&self, code: i32, what: &str) -> String {
        format!("{} {what}（组码 {code}）", self.kind)
    }

    /// 单值组码：出现多次视为文件损坏。
    fn scalar(&self, code: i32, what: &str) -> Result<Option<f64>, DxfError> {
        let mut values = self.values(code);
        let Some(raw) = values.next() else {
            return Ok(None);
        };
        let field = self.field(code, what);
        if values.next().is_some() {
            return Err(DxfError::invalid(format!("{field} 出现重复值")));
        }
        parse_f64(raw, &field).map(Some)
    }

    fn required(&self, code: i32, what: &str) -> Result<f64, DxfError> {
        self.scalar(code, what)?.ok_or_else(|| {
            DxfError::invalid(format!("{} 缺少{what}（组码 {code}）", self.kind))
        })
    }

    /// 以 `x_code` / `x_code + 10` 组成的单个二维点。
    fn point(&self, x_code: i32, what: &str) -> Result<Point2, DxfError> {
        let x = self.required(x_code, &format!("{what} X"))?;
        let y = self.required(x_code + 10, &format!("{what} Y"))?;
        Ok(Point2::new(x, y))
    }

    /// 整数组码取最后一次出现的值。
    fn integer(&self, code: i32, what: &str) -> Result<Option<i32>, DxfError> {
        self.values(code)
            .last()
            .map(|raw| parse_i32(raw, &self.field(code, what)))
            .transpose()
    }

    fn list(&self, code: i32, what: &str) -> Result<Vec<f64>, DxfError> {
        let field = self.field(code, what);
        self.values(code).map(|raw| parse_f64(raw, &field)).collect()
    }

    /// 重复出现的坐标对，按顺序配对 X/Y。`bulge_code` 给定时其值归属最近的顶点。
    fn vertex_chain(
        &self,
        x_code: i32,
        what: &str,
        bulge_code: Option<i32>,
    ) -> Result<Vec<PolylineVertex>, DxfError> {
        let y_code = x_code + 10;
        let mut vertices: Vec<PolylineVertex> = Vec::new();
        let mut pending_x: Option<f64> = None;
        let mut pending_y: Option<f64> = None;
        for pair in &self.pairs {
            if pair.code == x_code {
                let x = parse_f64(pair.value, &self.field(x_code, &format!("{what} X")))?;
                match pending_y.take() {
                    Some(y) => vertices.push(PolylineVertex::new(Point2::new(x, y))),
                    None if pending_x.replace(x).is_some() => {
                        return Err(DxfError::invalid(format!(
                            "{} {what} X（组码 {x_code}）在未提供 Y 之前重复出现",
                            self.kind
                        )));
                    }
                    None => {}
                }
            } else if pair.code == y_code {
                let y = parse_f64(pair.value, &self.field(y_code, &format!("{what} Y")))?;
                match pending_x.take() {
                    Some(x) => vertices.push(PolylineVertex::new(Point2::new(x, y))),
                    None if pending_y.replace(y).is_some() => {
                        return Err(DxfError::invalid(format!(
                            "{} {what} Y（组码 {y_code}）在未提供 X 之前重复出现",
                            self.kind
                        )));
                    }
                    None => {}
                }
            } else if Some(pair.code) == bulge_code {
                let bulge = parse_f64(pair.value, &self.field(pair.code, "bulge"))?;
                let vertex = vertices.last_mut().ok_or_else(|| {
                    DxfError::invalid(format!(
                        "{} 在定义首个顶点前遇到 bulge（组码 {}）",
                        self.kind, pair.code
                    ))
                })?;
                vertex.bulge = bulge;
            }
        }
        if pending_x.is_some() || pending_y.is_some() {
            return Err(DxfError::invalid(format!(
                "{} {what}坐标（组码 {x_code}/{y_code}）应成对出现，检测到不完整的顶点",
                self.kind
            )));
        }
        Ok(vertices)
    }

    fn points(&self, x_code: i32, what: &str) -> Result<Vec<Point2>, DxfError> {
        Ok(self
            .vertex_chain(x_code, what, None)?
            .into_iter()
            .map(|vertex| vertex.position)
            .collect())
    }
}

pub(crate) struct DxfParser<'s> {
    reader: GroupReader<'s>,
}

impl<'s> DxfParser<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Self {
            reader: GroupReader::new(source),
        }
    }

    pub(crate) fn parse(mut self) -> Result<Document, DxfError> {
        let mut document = Document::new();
        while let Some(pair) = self.reader.next_pair()? {
            match (pair.code, pair.value.trim()) {
                (999, _) => continue,
                (0, "SECTION") => {
                    let name = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name.code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {}（期望 2）",
                            name.code
                        )));
                    }
                    if name.value.trim() == "ENTITIES" {
                        self.read_entities(&mut document)?;
                    } else {
                        self.skip_section()?;
                    }
                }
                (0, "EOF") => break,
                (0, unexpected) => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
                (code, _) => {
                    return Err(DxfError::invalid(format!(
                        "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        while let Some(pair) = self.reader.next_pair()? {
            if pair.code == 0 && pair.value.trim() == "ENDSEC" {
                return Ok(());
            }
        }
        Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"))
    }

    fn read_entities(&mut self, document: &mut Document) -> Result<(), DxfError> {
        loop {
            let head = self
                .reader
                .next_pair()?
                .ok_or_else(|| DxfError::invalid("ENTITIES 段提前结束"))?;
            if head.code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {}（期望 0 表示实体起始）",
                    head.code
                )));
            }
            let kind = head.value.trim();
            if kind == "ENDSEC" {
                return Ok(());
            }

            let record = self.read_record(kind)?;
            let entity = match kind {
                // 游离的 VERTEX/SEQEND 不属于任何多段线，直接丢弃
                "SEQEND" | "VERTEX" => continue,
                "POLYLINE" => self.polyline(&record)?,
                _ => build_entity(&record)?,
            };
            trace!(kind = entity.kind_name(), layer = entity.layer_name(), "解析实体");
            document.add_entity(entity);
        }
    }

    /// 收集实体头之后直到下一个 0 组的全部组码。
    fn read_record(&mut self, kind: &'s str) -> Result<Record<'s>, DxfError> {
        let mut pairs = Vec::new();
        loop {
            match self.reader.peek()? {
                Some(pair) if pair.code == 0 => break,
                Some(_) => {
                    if let Some(pair) = self.reader.next_pair()? {
                        pairs.push(pair);
                    }
                }
                None => return Err(DxfError::invalid(format!("{kind} 未正确结束"))),
            }
        }
        Ok(Record { kind, pairs })
    }

    /// POLYLINE 头之后跟随 VERTEX 记录，以 SEQEND 结束；缺少 SEQEND 时以下一个实体为界。
    /// 网格与多面网格没有二维顶点语义，记为不支持的实体。
    fn polyline(&mut self, header: &Record<'s>) -> Result<Entity, DxfError> {
        let flags = header.integer(70, "标志")?.unwrap_or(0);
        let is_mesh = flags & MESH_FLAGS != 0;
        let mut vertices = Vec::new();
        loop {
            let kind = match self.reader.peek()? {
                Some(pair) => pair.value.trim(),
                None => return Err(DxfError::invalid("POLYLINE 缺少 SEQEND 终止标记")),
            };
            if kind != "VERTEX" && kind != "SEQEND" {
                break;
            }
            self.reader.next_pair()?;
            let record = self.read_record(kind)?;
            if kind == "SEQEND" {
                break;
            }
            if is_mesh {
                continue;
            }
            vertices.push(PolylineVertex::with_bulge(
                record.point(10, "顶点")?,
                record.scalar(42, "bulge")?.unwrap_or(0.0),
            ));
        }

        if is_mesh {
            return Ok(Entity::Unsupported(UnsupportedEntity {
                kind: "POLYLINE".to_string(),
                layer: header.layer(),
            }));
        }
        Ok(Entity::Polyline(Polyline {
            vertices,
            is_closed: flags & 0x01 != 0,
            layer: header.layer(),
        }))
    }
}

fn build_entity(record: &Record<'_>) -> Result<Entity, DxfError> {
    let layer = record.layer();
    let entity = match record.kind {
        "LINE" => Entity::Line(Line {
            start: record.point(10, "起点")?,
            end: record.point(11, "终点")?,
            layer,
        }),
        "CIRCLE" => Entity::Circle(Circle {
            center: record.point(10, "圆心")?,
            radius: record.required(40, "半径")?,
            layer,
        }),
        // 圆弧角度保持 DXF 中的度数原值，不换算也不归一
        "ARC" => Entity::Arc(Arc {
            center: record.point(10, "圆心")?,
            radius: record.required(40, "半径")?,
            start_angle: record.required(50, "起始角")?,
            end_angle: record.required(51, "终止角")?,
            layer,
        }),
        "ELLIPSE" => ellipse(record, layer)?,
        "LWPOLYLINE" => Entity::LwPolyline(Polyline {
            vertices: record.vertex_chain(10, "顶点", Some(42))?,
            is_closed: record.integer(70, "标志")?.unwrap_or(0) & 0x01 != 0,
            layer,
        }),
        "SPLINE" => {
            let degree = record.integer(71, "阶数")?.ok_or_else(|| {
                DxfError::invalid("SPLINE 缺少阶数（组码 71）")
            })?;
            Entity::Spline(Spline {
                degree,
                is_closed: record.integer(70, "类型标志")?.unwrap_or(0) & 0x01 != 0,
                control_points: record.points(10, "控制点")?,
                fit_points: record.points(11, "拟合点")?,
                knot_values: record.list(40, "节点值")?,
                weights: record.list(41, "权重")?,
                layer,
            })
        }
        "TEXT" => {
            let content: Vec<&str> = record.values(1).collect();
            Entity::Text(Text {
                insert: record.point(10, "插入点")?,
                content: content.join("\n"),
                height: record.required(40, "文字高度")?,
                rotation: record.scalar(50, "旋转角")?.unwrap_or(0.0).to_radians(),
                layer,
            })
        }
        other => Entity::Unsupported(UnsupportedEntity {
            kind: other.to_string(),
            layer,
        }),
    };
    Ok(entity)
}

fn ellipse(record: &Record<'_>, layer: String) -> Result<Entity, DxfError> {
    let major_axis = record.point(11, "主轴向量")?;
    if major_axis.x().abs() < f64::EPSILON && major_axis.y().abs() < f64::EPSILON {
        return Err(DxfError::invalid("ELLIPSE 主轴向量长度为 0，无法创建实体"));
    }
    let ratio = record.scalar(40, "半径比")?.unwrap_or(1.0);
    if ratio <= 0.0 {
        return Err(DxfError::invalid(format!(
            "ELLIPSE 半径比必须为正数，实际为 {ratio}"
        )));
    }
    Ok(Entity::Ellipse(Ellipse {
        center: record.point(10, "圆心")?,
        major_axis: Vector2::new(major_axis.x(), major_axis.y()),
        ratio,
        start_parameter: record.scalar(41, "起始参数")?.unwrap_or(0.0),
        end_parameter: record.scalar(42, "终止参数")?.unwrap_or(TAU),
        layer,
    }))
}

/// 按行读取组码/值对，支持向前看一组。
struct GroupReader<'s> {
    lines: std::str::Lines<'s>,
    peeked: Option<GroupPair<'s>>,
    line_number: usize,
}

impl<'s> GroupReader<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            lines: source.lines(),
            peeked: None,
            line_number: 0,
        }
    }

    fn peek(&mut self) -> Result<Option<GroupPair<'s>>, DxfError> {
        if self.peeked.is_none() {
            self.peeked = self.read_pair()?;
        }
        Ok(self.peeked)
    }

    fn next_pair(&mut self) -> Result<Option<GroupPair<'s>>, DxfError> {
        match self.peeked.take() {
            Some(pair) => Ok(Some(pair)),
            None => self.read_pair(),
        }
    }

    fn read_pair(&mut self) -> Result<Option<GroupPair<'s>>, DxfError> {
        // 空行不构成组码（常见于文件末尾）
        let code_line = loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            self.line_number += 1;
            if !line.trim().is_empty() {
                break line.trim();
            }
        };
        let code_line_number = self.line_number;

        let Some(value) = self.lines.next() else {
            return Err(DxfError::invalid(format!(
                "文件在第 {code_line_number} 行结束，缺少与组码对应的值行"
            )));
        };
        self.line_number += 1;

        let code = code_line.parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {code_line_number} 行的组码 \"{code_line}\" 无法解析为整数"
            ))
        })?;
        Ok(Some(GroupPair {
            code,
            value: value.trim_end_matches('\r'),
        }))
    }
}

/// 只接受有限数值，`inf`/`NaN` 会让后续几何计算失去意义。
fn parse_f64(raw: &str, field: &str) -> Result<f64, DxfError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(DxfError::invalid(format!(
            "{field} 不是有限数值（值：\"{raw}\"）"
        ))),
        Err(_) => Err(DxfError::invalid(format!("{field} 解析失败（值：\"{raw}\"）"))),
    }
}

fn parse_i32(raw: &str, field: &str) -> Result<i32, DxfError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DxfError::invalid(format!("{field} 解析失败（值：\"{raw}\"）")))
}
