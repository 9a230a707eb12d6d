use std::fmt::Write as _;

use dxfsvg_core::vector::{
    Notice, PaintStyle, PathCommand, PrimitiveTransform, Shape, VectorDocument, VectorPrimitive,
};

/// 矢量文档序列化接口。
pub trait VectorDocumentWriter {
    fn write(&self, document: &VectorDocument) -> String;
}

/// 输出 SVG 1.1 文本，画布宽高取 `canvas_size` 像素。
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgWriter;

impl SvgWriter {
    pub fn new() -> Self {
        Self
    }
}

impl VectorDocumentWriter for SvgWriter {
    fn write(&self, document: &VectorDocument) -> String {
        let view_box = &document.view_box;
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n");
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{size}\" height=\"{size}\" viewBox=\"{} {} {} {}\">",
            num(view_box.min_x),
            num(view_box.min_y),
            num(view_box.width),
            num(view_box.height),
            size = document.canvas_size,
        );

        if let Some(color) = document.background {
            let _ = writeln!(
                out,
                "<rect x=\"{}\" y=\"{}\" width=\"100%\" height=\"100%\" fill=\"{}\" />",
                num(view_box.min_x),
                num(view_box.min_y),
                color.as_rgb(),
            );
        }

        for primitive in &document.primitives {
            out.push_str(&primitive_element(primitive));
            out.push('\n');
        }

        if let Some(notice) = &document.notice {
            out.push_str(&notice_element(notice));
            out.push('\n');
        }

        out.push_str("</svg>\n");
        out
    }
}

fn primitive_element(primitive: &VectorPrimitive) -> String {
    let transform = transform_attr(&primitive.transform);
    match &primitive.shape {
        Shape::Line { start, end } => format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" {} transform=\"{transform}\" />",
            num(start.x()),
            num(start.y()),
            num(end.x()),
            num(end.y()),
            paint_attrs(&primitive.style),
        ),
        Shape::Circle { center, radius } => format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {} transform=\"{transform}\" />",
            num(center.x()),
            num(center.y()),
            num(*radius),
            paint_attrs(&primitive.style),
        ),
        Shape::Polyline { points } => {
            let points = points
                .iter()
                .map(|p| format!("{},{}", num(p.x()), num(p.y())))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "<polyline points=\"{points}\" {} transform=\"{transform}\" />",
                paint_attrs(&primitive.style),
            )
        }
        Shape::Path { commands } => format!(
            "<path d=\"{}\" {} transform=\"{transform}\" />",
            path_data(commands),
            paint_attrs(&primitive.style),
        ),
        // 文字不带描边与填充属性，沿用渲染器默认值
        Shape::Text { content, font_size } => format!(
            "<text x=\"0\" y=\"0\" font-size=\"{}\" transform=\"{transform}\">{}</text>",
            num(*font_size),
            escape_xml(content),
        ),
    }
}

fn notice_element(notice: &Notice) -> String {
    format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"{}\">{}</text>",
        num(notice.position.x()),
        num(notice.position.y()),
        num(notice.font_size),
        escape_xml(&notice.text),
    )
}

fn paint_attrs(style: &PaintStyle) -> String {
    let fill = style.fill.map(|color| color.as_svg()).unwrap_or("none");
    format!(
        "stroke=\"{}\" fill=\"{fill}\" stroke-width=\"{}\"",
        style.stroke.as_svg(),
        num(style.stroke_width),
    )
}

fn transform_attr(transform: &PrimitiveTransform) -> String {
    match transform {
        PrimitiveTransform::Scale { x, y } => format!("scale({},{})", num(*x), num(*y)),
        PrimitiveTransform::Translate { x, y } => format!("translate({},{})", num(*x), num(*y)),
    }
}

fn path_data(commands: &[PathCommand]) -> String {
    commands
        .iter()
        .map(|command| match command {
            PathCommand::MoveTo(p) => format!("M {},{}", num(p.x()), num(p.y())),
            PathCommand::CubicTo { ctrl1, ctrl2, to } => format!(
                "C {},{} {},{} {},{}",
                num(ctrl1.x()),
                num(ctrl1.y()),
                num(ctrl2.x()),
                num(ctrl2.y()),
                num(to.x()),
                num(to.y()),
            ),
            PathCommand::ArcBy {
                radius,
                large_arc,
                sweep,
                delta,
            } => format!(
                "a {r},{r} 0 {},{} {},{}",
                u8::from(*large_arc),
                u8::from(*sweep),
                num(delta.x()),
                num(delta.y()),
                r = num(*radius),
            ),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 以最短可往返的十进制形式输出，`-0` 输出为 `0`。
/// 笔宽为 `1/scale`，小图纸上可能低至 1e-8 量级，不能按固定小数位截断。
fn num(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
