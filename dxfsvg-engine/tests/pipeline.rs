use std::path::PathBuf;
use std::thread;

use dxfsvg_core::document::{Document, Entity, UnsupportedEntity};
use dxfsvg_core::geometry::{Point2, Vector2};
use dxfsvg_core::vector::{Color, Shape};
use dxfsvg_engine::area::estimate_area;
use dxfsvg_engine::bounds::entity_extents;
use dxfsvg_engine::extract::characteristic_point;
use dxfsvg_engine::{
    ConversionOptions, ConversionWarning, Converter, Deadline, EngineError, FrameStatus,
    StyleProfile,
};
use dxfsvg_io::{DocumentLoader, DxfFacade, Rasterizer, ResvgRasterizer, SvgWriter, VectorDocumentWriter};

fn sample_document() -> Document {
    let mut doc = Document::new();
    doc.add_line(Point2::new(-3.0, 2.0), Point2::new(12.0, 7.5), "GEOM");
    doc.add_circle(Point2::new(4.0, -6.0), 2.5, "GEOM");
    doc.add_arc(Point2::new(0.0, 0.0), 5.0, 30.0, 200.0, "GEOM");
    doc.add_text(Point2::new(8.0, 1.0), "NOTE", 1.5, "ANNOT");
    doc.add_lwpolyline(
        [Point2::new(1.0, 1.0), Point2::new(6.0, 1.0), Point2::new(6.0, 3.0)],
        false,
        "GEOM",
    );
    doc.add_ellipse(
        Point2::new(-6.0, -4.0),
        Vector2::new(3.0, 1.0),
        0.4,
        0.0,
        std::f64::consts::PI,
        "GEOM",
    );
    doc.add_text(Point2::new(900.0, 900.0), "A", 2.0, "svgframe");
    doc
}

#[test]
fn single_circle_end_to_end() {
    let mut doc = Document::new();
    doc.add_circle(Point2::new(0.0, 0.0), 10.0, "GEOM");

    let rendering = Converter::default()
        .render(&doc, StyleProfile::Outline, &Deadline::none())
        .expect("转换失败");

    let [xmin, xmax, ymin, ymax] = rendering.bounds.extents();
    for (actual, want) in [(xmin, -10.5), (xmax, 10.5), (ymin, -10.5), (ymax, 10.5)] {
        assert!((actual - want).abs() < 1e-9);
    }

    let context = rendering.context.expect("应有渲染参数");
    assert!((context.scale - 512.0 / 21.0).abs() < 1e-9);
    assert!((context.scale - 24.38).abs() < 0.01);

    assert_eq!(rendering.document.primitives.len(), 1);
    let primitive = &rendering.document.primitives[0];
    assert!(matches!(primitive.shape, Shape::Circle { radius, .. } if radius == 10.0));
    assert!((primitive.style.stroke_width - 1.0 / context.scale).abs() < 1e-12);
    assert_eq!(primitive.style.stroke, Color::Black);
    assert!(rendering.warnings.is_empty());
}

#[test]
fn whole_drawing_box_contains_every_characteristic_point() {
    let doc = sample_document();
    let converter = Converter::default();
    let extraction = converter.extract(&doc, &Deadline::none()).expect("提取失败");

    assert_eq!(extraction.entities.len(), 6);
    for entity in extraction.entities() {
        if let Some(point) = characteristic_point(entity) {
            assert!(extraction.bounds.contains(point), "{entity:?} 不在范围内");
        }
        if let Some(extents) = entity_extents(entity) {
            assert!(extraction.bounds.contains(extents.min()));
            assert!(extraction.bounds.contains(extents.max()));
        }
    }
}

#[test]
fn scale_times_longest_side_equals_canvas() {
    let doc = sample_document();
    for canvas_size in [64u32, 512, 2048] {
        let converter = Converter::new(ConversionOptions {
            canvas_size,
            ..ConversionOptions::default()
        });
        let rendering = converter
            .render(&doc, StyleProfile::Outline, &Deadline::none())
            .expect("转换失败");
        let scale = rendering.context.expect("渲染参数").scale;
        let longest = rendering.bounds.width().max(rendering.bounds.height());
        assert!(scale > 0.0);
        assert!((scale * longest - f64::from(canvas_size)).abs() < 1e-6);
        assert_eq!(rendering.document.canvas_size, canvas_size);
    }
}

#[test]
fn unsupported_entities_are_skipped_silently() {
    let mut doc = Document::new();
    doc.add_line(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0), "GEOM");
    doc.add_entity(Entity::Unsupported(UnsupportedEntity {
        kind: "MTEXT".to_string(),
        layer: "GEOM".to_string(),
    }));

    let rendering = Converter::default()
        .render(&doc, StyleProfile::Outline, &Deadline::none())
        .expect("转换失败");
    assert_eq!(rendering.selected, 2);
    assert_eq!(rendering.document.primitives.len(), 1);
    assert!(rendering.warnings.is_empty());
}

#[test]
fn malformed_spline_is_reported_and_skipped() {
    let mut doc = Document::new();
    doc.add_line(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0), "GEOM");
    let spline = doc.add_spline(
        vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 0.0)],
        vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)],
        "GEOM",
    );

    let rendering = Converter::default()
        .render(&doc, StyleProfile::Outline, &Deadline::none())
        .expect("单个实体的问题不应中断转换");
    assert_eq!(rendering.document.primitives.len(), 1);
    assert_eq!(
        rendering.warnings,
        vec![ConversionWarning::MalformedCurve {
            entity: spline,
            kind: "SPLINE".to_string(),
            control_points: 3,
        }]
    );
}

#[test]
fn unresolved_frame_renders_placeholder() {
    let doc = sample_document();
    let converter = Converter::new(ConversionOptions {
        frame_name: Some("MISSING".to_string()),
        ..ConversionOptions::default()
    });
    let rendering = converter
        .render(&doc, StyleProfile::Outline, &Deadline::none())
        .expect("找不到图框不是错误");
    assert!(rendering.is_placeholder());
    assert!(rendering.document.is_placeholder());
    assert_eq!(rendering.bounds.extents(), [300.0, 600.0, 300.0, 600.0]);
    assert_eq!(
        rendering.warnings,
        vec![ConversionWarning::UnresolvedFrame {
            name: "MISSING".to_string()
        }]
    );
}

#[test]
fn frame_fixture_selects_entities_inside_rect() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../dxfsvg-io/tests/data/frame_drawing.dxf");
    let doc = DxfFacade::new().load(&path).expect("读取图框 DXF 失败");

    let converter = Converter::new(ConversionOptions {
        frame_name: Some("A".to_string()),
        ..ConversionOptions::default()
    });
    let rendering = converter
        .render(&doc, StyleProfile::Outline, &Deadline::none())
        .expect("转换失败");

    match &rendering.frame {
        FrameStatus::Resolved(frame) => {
            assert_eq!(frame.rect.extents(), [11.5, 31.5, 10.0, 30.0]);
        }
        other => panic!("图框应被解析，实际为 {other:?}"),
    }
    // 边上的直线与框内的圆入选，框外一单位的圆被排除
    assert_eq!(rendering.selected, 2);
    let scale = rendering.context.expect("渲染参数").scale;
    assert!((scale - 512.0 / 20.0).abs() < 1e-9);
}

#[test]
fn hatch_raster_area_matches_filled_square() {
    let mut doc = Document::new();
    doc.add_lwpolyline(
        [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ],
        true,
        "GEOM",
    );

    let rendering = Converter::default()
        .render(&doc, StyleProfile::Hatch, &Deadline::none())
        .expect("转换失败");
    let svg = SvgWriter::new().write(&rendering.document);
    let image = ResvgRasterizer::new()
        .rasterize(&svg, rendering.document.canvas_size)
        .expect("栅格化失败");
    let scale = rendering.context.expect("渲染参数").scale;

    let area = estimate_area(&image, scale);
    assert!((area - 200.0).abs() / 200.0 < 0.03, "area = {area}");
}

#[test]
fn concurrent_conversions_do_not_interfere() {
    let doc = sample_document();
    let sizes = [128u32, 256, 512, 1024];

    let results: Vec<(u32, f64, f64)> = thread::scope(|scope| {
        let handles: Vec<_> = sizes
            .iter()
            .map(|&canvas_size| {
                let doc = &doc;
                scope.spawn(move || {
                    let converter = Converter::new(ConversionOptions {
                        canvas_size,
                        ..ConversionOptions::default()
                    });
                    let mut last = (canvas_size, 0.0, 0.0);
                    for _ in 0..20 {
                        let rendering = converter
                            .render(doc, StyleProfile::Outline, &Deadline::none())
                            .expect("转换失败");
                        let context = rendering.context.expect("渲染参数");
                        let longest = rendering.bounds.width().max(rendering.bounds.height());
                        last = (canvas_size, context.scale, longest);
                    }
                    last
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("线程异常退出"))
            .collect()
    });

    for (canvas_size, scale, longest) in results {
        assert!((scale * longest - f64::from(canvas_size)).abs() < 1e-6);
    }
}

#[test]
fn expired_deadline_aborts_without_document() {
    let doc = sample_document();
    let deadline = Deadline::after(std::time::Duration::ZERO);
    let err = Converter::default()
        .render(&doc, StyleProfile::Hatch, &deadline)
        .expect_err("超时应返回错误");
    assert!(matches!(err, EngineError::DeadlineExceeded { .. }));
}
